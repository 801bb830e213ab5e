//! Adapters: storage, the language model client and the HTTP surface.

pub mod completion;
pub mod http;
pub mod sqlite;
