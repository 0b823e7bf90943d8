pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::config::StorageBackend;
use crate::state::AppState;
use crate::urls::UPLOADS_MOUNT;
use crate::{admin, auth, content, cv, feedback, messages, projects};

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/hero", get(content::handlers::handle_get_hero))
        .route("/api/about", get(content::handlers::handle_get_about))
        .route("/api/services", get(content::handlers::handle_get_services))
        .route("/api/education", get(content::handlers::handle_get_education))
        .route("/api/projects", get(projects::handlers::handle_list_projects))
        .route("/api/projects/:id", get(projects::handlers::handle_get_project))
        .route("/api/messages", post(messages::handlers::handle_submit_message))
        .route(
            "/api/feedback",
            get(feedback::handlers::handle_list_public_feedback)
                .post(feedback::handlers::handle_submit_feedback),
        )
        .route("/api/cv", get(cv::handlers::handle_get_cv))
        .route("/api/cv/download", get(cv::handlers::handle_download_cv));

    let protected = Router::new()
        // Session
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route("/api/auth/password", put(auth::handlers::handle_change_password))
        // Singleton content
        .route("/api/hero", put(content::handlers::handle_update_hero))
        .route("/api/about", put(content::handlers::handle_update_about))
        .route("/api/services", put(content::handlers::handle_update_services))
        .route("/api/education", put(content::handlers::handle_update_education))
        // Projects
        .route("/api/projects", post(projects::handlers::handle_create_project))
        .route(
            "/api/projects/:id",
            put(projects::handlers::handle_update_project)
                .delete(projects::handlers::handle_delete_project),
        )
        // Inbox
        .route("/api/messages", get(messages::handlers::handle_list_messages))
        .route(
            "/api/messages/:id",
            axum::routing::delete(messages::handlers::handle_delete_message),
        )
        .route("/api/messages/:id/read", patch(messages::handlers::handle_mark_read))
        .route(
            "/api/feedback/:id",
            axum::routing::delete(feedback::handlers::handle_delete_feedback),
        )
        .route(
            "/api/feedback/:id/approve",
            patch(feedback::handlers::handle_set_approval),
        )
        // CV
        .route("/api/cv", post(cv::handlers::handle_upload_cv))
        // Dashboard
        .route("/api/admin/stats", get(admin::handlers::handle_stats))
        .route("/api/admin/feedback", get(feedback::handlers::handle_list_all_feedback))
        .route(
            "/api/admin/users",
            get(admin::handlers::handle_list_admins).post(admin::handlers::handle_create_admin),
        )
        .route(
            "/api/admin/users/:id",
            axum::routing::delete(admin::handlers::handle_delete_admin),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let mut router = public
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    if state.config.storage == StorageBackend::Disk {
        router = router.nest_service(UPLOADS_MOUNT, ServeDir::new(&state.config.upload_dir));
    }

    router.with_state(state)
}
