use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::{Stream, StreamExt};
use steward_llm::{RunEvent, RunEventStream, RunProvider, RunRequest, Role};
use steward_persist::ThreadRecord;
use steward_tools::{ToolContext, ToolDispatcher};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::RunnerConfig;
use crate::error::ExchangeError;
use crate::state::RunState;
use crate::templates::{render_instructions, DEFAULT_INSTRUCTIONS_TEMPLATE};
use crate::threads::ThreadStore;

/// One user turn: the text to send and where to send it
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub tenant: String,
    pub user_text: String,
    /// Existing conversation, or `None` to open a new one
    pub handle: Option<String>,
    /// Overrides the configured instructions for this exchange only
    pub instructions: Option<String>,
}

impl ExchangeRequest {
    pub fn new(tenant: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            user_text: user_text.into(),
            handle: None,
            instructions: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Live output of an exchange.
///
/// Yields text fragments in arrival order. A run that ends badly yields one
/// final `Err` and then ends. Dropping the exchange stops the run task at
/// its next fragment or tool round.
pub struct Exchange {
    thread: ThreadRecord,
    fragments: ReceiverStream<Result<String, ExchangeError>>,
}

impl Exchange {
    pub fn handle(&self) -> &str {
        &self.thread.handle
    }

    pub fn thread(&self) -> &ThreadRecord {
        &self.thread
    }

    /// Drain the exchange. Partial text is discarded when the run fails.
    pub async fn collect_text(mut self) -> Result<Vec<String>, ExchangeError> {
        let mut fragments = Vec::new();
        while let Some(item) = self.fragments.next().await {
            fragments.push(item?);
        }
        Ok(fragments)
    }
}

impl Stream for Exchange {
    type Item = Result<String, ExchangeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.fragments).poll_next(cx)
    }
}

/// Drives model runs for user turns, dispatching tool calls in between
pub struct ConversationRunner {
    threads: Arc<ThreadStore>,
    provider: Arc<dyn RunProvider>,
    dispatcher: ToolDispatcher,
    config: RunnerConfig,
}

impl ConversationRunner {
    pub fn new(
        threads: Arc<ThreadStore>,
        provider: Arc<dyn RunProvider>,
        dispatcher: ToolDispatcher,
        config: RunnerConfig,
    ) -> Self {
        Self {
            threads,
            provider,
            dispatcher,
            config,
        }
    }

    pub fn builder() -> crate::builder::RunnerBuilder {
        crate::builder::RunnerBuilder::new()
    }

    pub fn threads(&self) -> &Arc<ThreadStore> {
        &self.threads
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Names of the tools offered to the model
    pub fn tool_names(&self) -> Vec<String> {
        self.dispatcher
            .registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Start an exchange.
    ///
    /// Thread resolution and the user message append happen before this
    /// returns, so their failures surface here and no run is started. The
    /// run itself proceeds in the background and reports through the
    /// returned [`Exchange`].
    pub async fn run_exchange(&self, request: ExchangeRequest) -> Result<Exchange, ExchangeError> {
        let ExchangeRequest {
            tenant,
            user_text,
            handle,
            instructions,
        } = request;

        let (handle, thread) = self
            .threads
            .resolve_or_create(&tenant, handle.as_deref())
            .await?;

        self.provider
            .append_message(&thread.provider_thread_id, Role::User, &user_text)
            .await
            .map_err(ExchangeError::upstream)?;

        let instructions = instructions
            .or_else(|| self.config.instructions.clone())
            .unwrap_or_else(|| render_instructions(DEFAULT_INSTRUCTIONS_TEMPLATE, chrono::Utc::now()));

        let run_request = RunRequest::new(thread.provider_thread_id.clone(), self.config.model.clone())
            .with_instructions(instructions)
            .with_tools(self.dispatcher.registry().schemas());

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));

        let task = RunTask {
            provider: Arc::clone(&self.provider),
            dispatcher: self.dispatcher.clone(),
            config: self.config.clone(),
            ctx: ToolContext::new(tenant.clone()),
            thread_id: thread.provider_thread_id.clone(),
            state: RunState::Idle,
            rounds: 0,
        };

        tracing::info!(%tenant, %handle, thread_id = %thread.provider_thread_id, "exchange started");

        tokio::spawn(task.run(run_request, tx, handle));

        Ok(Exchange {
            thread,
            fragments: ReceiverStream::new(rx),
        })
    }
}

struct RunTask {
    provider: Arc<dyn RunProvider>,
    dispatcher: ToolDispatcher,
    config: RunnerConfig,
    ctx: ToolContext,
    thread_id: String,
    state: RunState,
    rounds: usize,
}

impl RunTask {
    async fn run(
        mut self,
        request: RunRequest,
        tx: mpsc::Sender<Result<String, ExchangeError>>,
        handle: String,
    ) {
        let start = Instant::now();
        let result = self.drive(request, &tx).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                tracing::info!(
                    tenant = %self.ctx.tenant,
                    %handle,
                    state = ?self.state,
                    rounds = self.rounds,
                    duration_ms,
                    "exchange finished"
                );
            }
            Err(e) => {
                if !self.state.is_terminal() {
                    self.state = self.state.advance(RunState::Failed);
                }
                tracing::error!(
                    tenant = %self.ctx.tenant,
                    %handle,
                    rounds = self.rounds,
                    duration_ms,
                    error = %e,
                    "exchange failed"
                );
                let _ = tx.send(Err(e)).await;
            }
        }
    }

    /// Consume run streams until a terminal event. A tool round replaces
    /// the current stream with the continuation returned by resubmission.
    async fn drive(
        &mut self,
        request: RunRequest,
        tx: &mpsc::Sender<Result<String, ExchangeError>>,
    ) -> Result<(), ExchangeError> {
        let mut stream: RunEventStream = self
            .provider
            .create_run(request)
            .await
            .map_err(ExchangeError::upstream)?;
        self.state = self.state.advance(RunState::Running);

        loop {
            let event = match tokio::time::timeout(self.config.event_timeout, stream.next()).await {
                Err(_) => return Err(ExchangeError::Timeout(self.config.event_timeout.as_secs())),
                Ok(None) => {
                    tracing::warn!(thread_id = %self.thread_id, "run stream ended without a terminal event");
                    self.state = self.state.advance(RunState::Completed);
                    return Ok(());
                }
                Ok(Some(event)) => event.map_err(ExchangeError::upstream)?,
            };

            match event {
                RunEvent::TextDelta { text } => {
                    if tx.send(Ok(text)).await.is_err() {
                        tracing::debug!(thread_id = %self.thread_id, "exchange dropped by consumer");
                        return Ok(());
                    }
                }
                RunEvent::RequiresAction {
                    run_id,
                    thread_id,
                    tool_calls,
                } => {
                    if self.rounds >= self.config.max_tool_rounds {
                        return Err(ExchangeError::RoundLimit(self.config.max_tool_rounds));
                    }
                    self.rounds += 1;
                    self.state = self.state.advance(RunState::AwaitingToolOutputs);

                    tracing::debug!(
                        %run_id,
                        round = self.rounds,
                        calls = tool_calls.len(),
                        "run requires tool outputs"
                    );

                    let outputs = self.dispatcher.execute_for_submission(&self.ctx, &tool_calls).await;

                    if tx.is_closed() {
                        tracing::debug!(%run_id, "exchange dropped before tool outputs were submitted");
                        return Ok(());
                    }

                    let thread_id = if thread_id.is_empty() { self.thread_id.as_str() } else { thread_id.as_str() };
                    stream = self
                        .provider
                        .submit_tool_outputs(thread_id, &run_id, outputs)
                        .await
                        .map_err(ExchangeError::upstream)?;
                    self.state = self.state.advance(RunState::Running);
                }
                other => match other.terminal_status() {
                    Some(status) if status.is_success() => {
                        self.state = self.state.advance(RunState::Completed);
                        return Ok(());
                    }
                    Some(status) => {
                        self.state = self.state.advance(RunState::Failed);
                        let reason = match other {
                            RunEvent::Failed { reason } => reason,
                            _ => None,
                        };
                        return Err(ExchangeError::RunFailed { status, reason });
                    }
                    None => tracing::trace!(event = ?other, "ignored run event"),
                },
            }
        }
    }
}
