use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Runner knobs. Instructions fall back to the default template when unset.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub model: String,
    pub instructions: Option<String>,
    /// Longest wait for the next event of a run
    pub event_timeout: Duration,
    /// Longest wait for one tool batch
    pub tool_batch_timeout: Duration,
    /// Tool round trips allowed in one exchange
    pub max_tool_rounds: usize,
    /// Buffered fragments between the run task and the consumer
    pub channel_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            instructions: None,
            event_timeout: Duration::from_secs(120),
            tool_batch_timeout: Duration::from_secs(300),
            max_tool_rounds: 50,
            channel_capacity: 1000,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn with_tool_batch_timeout(mut self, timeout: Duration) -> Self {
        self.tool_batch_timeout = timeout;
        self
    }

    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
