//! Router assembly and serving.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::JwtVerifier;
use super::{chat, conversations, health, tasks};
use crate::adapters::sqlite::{SqliteConversationRepository, SqliteTaskRepository};
use crate::domain::models::Config;
use crate::domain::ports::CompletionClient;
use crate::services::{ChatOrchestrator, ConversationService, TaskService, ToolCatalog};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService<SqliteTaskRepository>,
    pub conversations: Arc<ConversationService<SqliteConversationRepository>>,
    pub chat: Arc<ChatOrchestrator<SqliteTaskRepository, SqliteConversationRepository>>,
    pub verifier: Arc<JwtVerifier>,
}

impl AppState {
    /// Wire the services on top of a migrated pool.
    pub fn new(pool: SqlitePool, completion: Arc<dyn CompletionClient>, config: &Config) -> Self {
        let tasks = TaskService::new(Arc::new(SqliteTaskRepository::new(pool.clone())));
        let conversation_repo = Arc::new(SqliteConversationRepository::new(pool));

        let chat = ChatOrchestrator::new(
            Arc::clone(&conversation_repo),
            ToolCatalog::new(tasks.clone()),
            completion,
            config.chat.clone(),
        );

        Self {
            tasks,
            conversations: Arc::new(ConversationService::new(conversation_repo)),
            chat: Arc::new(chat),
            verifier: Arc::new(JwtVerifier::new(&config.auth)),
        }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.verifier)
    }
}

/// Build the router.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/{owner}/chat", post(chat::send_message))
        .route("/{owner}/conversations", get(conversations::list_conversations))
        .route(
            "/{owner}/conversations/{id}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route("/{owner}/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/{owner}/tasks/{id}",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/{owner}/tasks/{id}/complete", patch(tasks::set_completed));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    router: Router,
    host: &str,
    port: u16,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "taskchat HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
