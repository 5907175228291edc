//! Server application state shared across handlers

use crate::config::EstimatorConfig;
use crate::conversation::{ConversationStore, EstimateStore};
use crate::shutdown::ShutdownState;
use std::sync::Arc;

/// Shared state for the server. Cloned into every handler.
#[derive(Clone)]
pub struct ServerAppState {
    /// Effective configuration, fixed at startup
    pub config: Arc<EstimatorConfig>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,

    /// Requirements conversations by ID
    pub conversations: Arc<ConversationStore>,

    /// Latest estimate per project
    pub estimates: Arc<EstimateStore>,
}

impl ServerAppState {
    pub fn new(config: EstimatorConfig, shutdown_state: ShutdownState) -> Self {
        let capacity = config.server.max_conversations;
        Self {
            config: Arc::new(config),
            shutdown_state,
            conversations: Arc::new(ConversationStore::with_capacity(capacity)),
            estimates: Arc::new(EstimateStore::with_capacity(capacity)),
        }
    }
}
