use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, AppConfig};
use crate::database::store::Store;
use crate::database::models::ServiceSettings;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};
use crate::services::AdminService;

/// Shared state handed to handlers and middleware
pub struct AppState {
    pub service: Arc<AdminService>,
}

impl AppState {
    pub fn new(service: Arc<AdminService>) -> Arc<Self> {
        Arc::new(Self { service })
    }

    /// State over `store`, seeding the feature gate from configuration
    pub fn from_store(store: Arc<dyn Store>) -> Arc<Self> {
        let defaults = ServiceSettings::from(&config::config().service);
        Self::new(Arc::new(AdminService::new(store, defaults)))
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    app_with(state, config::config())
}

/// Router built from explicit settings; request tracing follows `api.enable_request_logging`
pub fn app_with(state: Arc<AppState>, settings: &AppConfig) -> Router {
    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer())
                .layer(DefaultBodyLimit::max(settings.api.max_request_size_bytes)),
        );

    let router = if settings.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use protected::{config, tokens, users};

    Router::new()
        .route("/api/users/lookup/:identifier", get(users::lookup))
        .route("/api/users/:user_id/tokens", post(tokens::create).get(tokens::list))
        .route("/api/users/tokens/revoke", post(tokens::revoke))
        .route("/api/tokens/:token_id", get(tokens::get))
        .route("/api/config/client", get(config::client))
        .route("/api/config/service", put(config::update_service))
        // Layers run bottom-up: authenticate first, then resolve the session user
        .route_layer(from_fn_with_state(state, validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Serve the API on an already bound listener until the task is dropped
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    async fn health_status(settings: &AppConfig) -> reqwest::StatusCode {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app_with(AppState::from_store(Arc::new(MemoryStore::new())), settings);
        tokio::spawn(async move { axum::serve(listener, router).await });

        reqwest::get(format!("http://{}/health", addr)).await.unwrap().status()
    }

    #[tokio::test]
    async fn serves_with_request_logging_on_or_off() {
        let mut settings = AppConfig::from_env();
        for logging in [true, false] {
            settings.api.enable_request_logging = logging;
            assert_eq!(health_status(&settings).await, reqwest::StatusCode::OK, "logging={}", logging);
        }
    }
}
