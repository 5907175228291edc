//! Conversation and estimate storage shared by the server and commands

pub mod store;

pub use store::{ConversationHandle, ConversationStore, EstimateStore, DEFAULT_MAX_ENTRIES};
