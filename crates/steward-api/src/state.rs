use std::sync::Arc;

use steward_graph::{ConversationRunner, ThreadStore};
use steward_persist::NodeStore;

use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<ConversationRunner>,
    pub nodes: Arc<NodeStore>,
}

impl AppState {
    pub fn new(config: Config, runner: ConversationRunner, nodes: Arc<NodeStore>) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            nodes,
        }
    }

    pub fn threads(&self) -> &Arc<ThreadStore> {
        self.runner.threads()
    }
}
