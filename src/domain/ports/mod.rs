//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - TaskRepository: owner-scoped task persistence
//! - ConversationRepository: conversations and their messages
//! - CompletionClient: the language model used by the chat orchestrator

pub mod completion_client;
pub mod conversation_repository;
pub mod task_repository;

pub use completion_client::CompletionClient;
pub use conversation_repository::ConversationRepository;
pub use task_repository::{TaskFilter, TaskRepository};
