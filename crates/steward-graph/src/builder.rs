use std::sync::Arc;

use anyhow::{anyhow, Result};
use steward_llm::RunProvider;
use steward_tools::{ToolDispatcher, ToolRegistry};

use crate::config::RunnerConfig;
use crate::runner::ConversationRunner;
use crate::threads::ThreadStore;

/// Builder for a [`ConversationRunner`]
pub struct RunnerBuilder {
    threads: Option<Arc<ThreadStore>>,
    provider: Option<Arc<dyn RunProvider>>,
    registry: Option<Arc<ToolRegistry>>,
    config: RunnerConfig,
}

impl RunnerBuilder {
    pub fn new() -> Self {
        Self {
            threads: None,
            provider: None,
            registry: None,
            config: RunnerConfig::default(),
        }
    }

    pub fn threads(mut self, threads: Arc<ThreadStore>) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Provider that executes runs
    pub fn provider(mut self, provider: Arc<dyn RunProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Tools offered to the model. Defaults to none.
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ConversationRunner> {
        let threads = self.threads.ok_or_else(|| anyhow!("Thread store is required"))?;
        let provider = self.provider.ok_or_else(|| anyhow!("Run provider is required"))?;
        let registry = self.registry.unwrap_or_default();

        let dispatcher = ToolDispatcher::new(registry).with_batch_timeout(self.config.tool_batch_timeout);

        Ok(ConversationRunner::new(threads, provider, dispatcher, self.config))
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
