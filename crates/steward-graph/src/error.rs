use steward_llm::RunStatus;
use steward_persist::PersistError;
use thiserror::Error;

/// Why an exchange ended without completing
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Storage error: {0}")]
    Persist(#[from] PersistError),

    /// The model provider could not be reached or rejected a call
    #[error("Upstream error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Run ended with status {status}{}", with_reason(.reason))]
    RunFailed {
        status: RunStatus,
        reason: Option<String>,
    },

    #[error("No run event within {0}s")]
    Timeout(u64),

    #[error("Tool round limit ({0}) reached")]
    RoundLimit(usize),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),
}

fn with_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

impl ExchangeError {
    pub fn upstream(e: anyhow::Error) -> Self {
        Self::Upstream(e)
    }
}
