pub mod builder;
pub mod config;
pub mod error;
pub mod runner;
pub mod state;
pub mod templates;
pub mod threads;

pub use builder::RunnerBuilder;
pub use config::RunnerConfig;
pub use error::ExchangeError;
pub use runner::{ConversationRunner, Exchange, ExchangeRequest};
pub use state::RunState;
pub use templates::{render_instructions, DEFAULT_INSTRUCTIONS_TEMPLATE, THREAD_TITLE_PROMPT};
pub use threads::ThreadStore;
