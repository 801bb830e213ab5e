//! Taskchat - todo service with a tool-calling chat assistant
//!
//! Users manage their tasks over a REST API or by talking to an assistant
//! that reads and changes the same tasks through a fixed set of tools.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the repository/client ports
//! - **Service Layer** (`services`): Task rules, the tool catalog and the chat turn loop
//! - **Adapters** (`adapters`): SQLite storage, the Anthropic client and the axum API
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{ChatReply, Config, Conversation, Message, MessageRole, Task};
pub use domain::ports::{CompletionClient, ConversationRepository, TaskRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ChatOrchestrator, ConversationService, TaskService, ToolCatalog};
