pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod response;

use axum::{
    extract::FromRef,
    http::Uri,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{LoginRequest, SharedIdentityProvider, TokenResponse, UserResponse};
use response::ApiResponse;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::login_handler,
        auth::handlers::logout_handler,
        auth::handlers::refresh_handler,
        auth::handlers::me_handler,
    ),
    components(
        schemas(LoginRequest, TokenResponse, UserResponse)
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, logout, token refresh and current user")
    ),
    info(
        title = "Auth API",
        version = "1.0.0",
        description = "JWT authentication endpoints"
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by protected routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: SharedIdentityProvider,
}

impl FromRef<AppState> for SharedIdentityProvider {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

async fn fallback_handler(uri: Uri) -> ApiResponse {
    tracing::debug!("No route for {}", uri.path());
    response::not_found(Some("Route not found"))
}

/// Creates and configures the application router
/// Maps the auth endpoints to their handlers and adds tracing and CORS middleware
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/me", get(auth::me_handler))
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
