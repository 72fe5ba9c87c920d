pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::StorageBackend;
use crate::state::AppState;
use crate::storage::MAX_FILES_PER_APPLICATION;
use crate::{applications, auth, careers, certificates, clients, companies, contacts, projects, storage};

/// Multipart bodies are fully buffered; the apply form may carry up to ten
/// 10 MB files, so the default 2 MB axum limit is raised for those routes.
const UPLOAD_BODY_LIMIT: usize = (MAX_FILES_PER_APPLICATION + 1) * 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route("/api/auth/users", post(auth::handlers::handle_create_user))
        // Companies
        .route(
            "/api/companies",
            get(companies::handlers::handle_list).post(companies::handlers::handle_create),
        )
        .route(
            "/api/companies/:id",
            get(companies::handlers::handle_get)
                .put(companies::handlers::handle_update)
                .delete(companies::handlers::handle_delete),
        )
        // Projects
        .route(
            "/api/projects",
            get(projects::handlers::handle_list).post(projects::handlers::handle_create),
        )
        .route(
            "/api/projects/:id",
            get(projects::handlers::handle_get)
                .put(projects::handlers::handle_update)
                .delete(projects::handlers::handle_delete),
        )
        // Clients
        .route(
            "/api/clients",
            get(clients::handlers::handle_list).post(clients::handlers::handle_create),
        )
        .route(
            "/api/clients/:id",
            get(clients::handlers::handle_get)
                .put(clients::handlers::handle_update)
                .delete(clients::handlers::handle_delete),
        )
        .route(
            "/api/clients/:id/recalculate",
            post(clients::handlers::handle_recalculate),
        )
        // Certificates
        .route(
            "/api/certificates",
            get(certificates::handlers::handle_list).post(certificates::handlers::handle_create),
        )
        .route(
            "/api/certificates/:id",
            get(certificates::handlers::handle_get)
                .put(certificates::handlers::handle_update)
                .delete(certificates::handlers::handle_delete),
        )
        // Contacts
        .route(
            "/api/contacts",
            get(contacts::handlers::handle_list).post(contacts::handlers::handle_create),
        )
        .route(
            "/api/contacts/:id",
            get(contacts::handlers::handle_get)
                .put(contacts::handlers::handle_update)
                .delete(contacts::handlers::handle_delete),
        )
        // Careers — public listing shows active postings only
        .route(
            "/api/careers",
            get(careers::handlers::handle_public_list).post(careers::handlers::handle_create),
        )
        .route("/api/careers/all", get(careers::handlers::handle_admin_list))
        .route(
            "/api/careers/:id",
            get(careers::handlers::handle_public_get)
                .put(careers::handlers::handle_update)
                .delete(careers::handlers::handle_delete),
        )
        .route("/api/careers/:id/status", patch(careers::handlers::handle_status))
        .route(
            "/api/careers/:id/apply",
            post(careers::handlers::handle_apply).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/careers/:id/applications",
            get(applications::handlers::handle_list_for_career),
        )
        // Applications
        .route(
            "/api/applications/:id",
            get(applications::handlers::handle_get).delete(applications::handlers::handle_delete),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::handlers::handle_update_status),
        )
        .route(
            "/api/applications/:id/interview",
            post(applications::handlers::handle_schedule_interview),
        )
        // Admin entity-image uploads
        .route(
            "/api/uploads/:slot",
            post(storage::handlers::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    // Stored files are only addressable as paths on the disk backend
    if state.config.storage_backend == StorageBackend::Disk {
        router = router.nest_service("/uploads", ServeDir::new(&state.config.upload_dir));
    }

    router.with_state(state)
}
