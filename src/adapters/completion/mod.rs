//! Completion client adapters.

pub mod anthropic_api;
pub mod errors;
pub mod mock;

pub use anthropic_api::AnthropicCompletionClient;
pub use errors::CompletionApiError;
pub use mock::{ScriptedCompletionClient, ScriptedResponse};
