//! Application services.

pub mod chat_orchestrator;
pub mod conversation_service;
pub mod task_service;
pub mod tool_catalog;

pub use chat_orchestrator::{ChatOrchestrator, ChatTurnError};
pub use conversation_service::ConversationService;
pub use task_service::TaskService;
pub use tool_catalog::{ToolCatalog, ToolName};
