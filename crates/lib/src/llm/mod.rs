//! Remote completion backend.
//!
//! A single HTTP endpoint answers chat context windows; there is no
//! streaming. Incremental output comes from the typing reveal.

mod completion;

pub use completion::{ChatMessage, CompletionClient, CompletionError};
