pub mod chat;
pub mod config;
pub mod conversation;
pub mod task;

pub use chat::{
    ChatReply, Completion, CompletionRequest, PromptMessage, ToolCallRecord, ToolDefinition,
    ToolInvocation, ToolResult,
};
pub use config::{
    AuthConfig, ChatConfig, CompletionConfig, Config, DatabaseConfig, RetryConfig, ServerConfig,
};
pub use conversation::{Conversation, ConversationSummary, Message, MessageRole};
pub use task::{NewTask, Task, TaskSort, TaskStatusFilter, TaskUpdate};
