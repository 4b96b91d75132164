use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod companies;
pub mod health;
pub mod jobs;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = match state.config.cors_allowed_origin.as_ref() {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        tracing::warn!(origin = value, "ignoring invalid CORS allowed origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(headers))
                .allow_methods(tower_http::cors::AllowMethods::mirror_request())
                .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
        None => CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true),
    };

    let category_routes = Router::new()
        .route("/categories/", get(categories::categories_index))
        .route("/categories/:id/", get(categories::categories_show));

    let company_routes = Router::new()
        .route("/companies/", get(companies::companies_index))
        .route(
            "/companies/new",
            get(companies::companies_new).post(companies::companies_create),
        )
        .route("/companies/:id/", get(companies::companies_show))
        .route(
            "/companies/:id/edit",
            get(companies::companies_edit).post(companies::companies_update),
        );

    let job_routes = Router::new()
        .route("/", get(jobs::jobs_index))
        .route("/jobs/", get(jobs::jobs_index))
        .route("/jobs/new/", get(jobs::jobs_new).post(jobs::jobs_create))
        .route("/jobs/mine/", get(jobs::jobs_mine))
        .route("/jobs/:id/", get(jobs::jobs_show))
        .route("/jobs/:id/activate", get(jobs::jobs_activate))
        .route("/jobs/:id/expire", get(jobs::jobs_expire))
        .route(
            "/jobs/:id/edit",
            get(jobs::jobs_edit).post(jobs::jobs_update),
        );

    let account_routes = Router::new()
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout))
        .route("/register", get(auth::register_form).post(auth::register));

    Router::new()
        .merge(category_routes)
        .merge(company_routes)
        .merge(job_routes)
        .merge(account_routes)
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
