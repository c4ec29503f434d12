use std::collections::BTreeMap;
use std::sync::Arc;

use steward_llm::{CompletionClient, CompletionRequest, Message, RunProvider, ThreadMessage};
use steward_persist::{ThreadRecord, ThreadRepository};

use crate::config::DEFAULT_MODEL;
use crate::error::ExchangeError;
use crate::templates::THREAD_TITLE_PROMPT;

const TITLE_MAX_CHARS: usize = 25;

/// Maps caller handles to provider threads.
///
/// Storage is delegated to a [`ThreadRepository`]; provider threads are
/// opened through the [`RunProvider`].
pub struct ThreadStore {
    repository: Arc<dyn ThreadRepository>,
    provider: Arc<dyn RunProvider>,
    titler: Option<Arc<dyn CompletionClient>>,
    title_model: String,
}

impl ThreadStore {
    pub fn new(repository: Arc<dyn ThreadRepository>, provider: Arc<dyn RunProvider>) -> Self {
        Self {
            repository,
            provider,
            titler: None,
            title_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Completion model used by [`auto_name`](Self::auto_name)
    pub fn with_titler(mut self, client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        self.titler = Some(client);
        self.title_model = model.into();
        self
    }

    /// Return the record for `handle`, or open a new thread when the handle
    /// is absent or unknown.
    ///
    /// The provider thread is created before anything is persisted, so a
    /// provider failure leaves no record behind.
    pub async fn resolve_or_create(
        &self,
        tenant: &str,
        handle: Option<&str>,
    ) -> Result<(String, ThreadRecord), ExchangeError> {
        if let Some(handle) = handle {
            if let Some(record) = self.repository.get_thread(tenant, handle).await? {
                tracing::debug!(%tenant, %handle, "resolved thread");
                return Ok((record.handle.clone(), record));
            }
            tracing::info!(%tenant, %handle, "unknown handle, opening new thread");
        }

        let provider_thread_id = self
            .provider
            .create_thread()
            .await
            .map_err(ExchangeError::upstream)?;

        let record = self
            .repository
            .create_thread(tenant, &provider_thread_id)
            .await?;

        tracing::info!(
            %tenant,
            handle = %record.handle,
            provider_thread_id = %record.provider_thread_id,
            "created thread"
        );

        Ok((record.handle.clone(), record))
    }

    /// Overwrite the display name. Unknown handles are logged and ignored.
    pub async fn rename(&self, tenant: &str, handle: &str, name: &str) -> Result<(), ExchangeError> {
        if !self.repository.rename_thread(tenant, handle, name).await? {
            tracing::warn!(%tenant, %handle, "rename of unknown thread ignored");
        }
        Ok(())
    }

    pub async fn list_all(&self, tenant: &str) -> Result<BTreeMap<String, ThreadRecord>, ExchangeError> {
        Ok(self.repository.list_threads(tenant).await?)
    }

    pub async fn get(&self, tenant: &str, handle: &str) -> Result<ThreadRecord, ExchangeError> {
        self.repository
            .get_thread(tenant, handle)
            .await?
            .ok_or_else(|| ExchangeError::ThreadNotFound(handle.to_string()))
    }

    /// Provider-side messages of a thread, oldest first
    pub async fn list_messages(&self, tenant: &str, handle: &str) -> Result<Vec<ThreadMessage>, ExchangeError> {
        let record = self.get(tenant, handle).await?;
        self.provider
            .list_messages(&record.provider_thread_id)
            .await
            .map_err(ExchangeError::upstream)
    }

    /// Title a thread after its first message and return the updated record.
    ///
    /// Without a titling model the first message is truncated instead. A
    /// thread with no messages keeps its current name.
    pub async fn auto_name(&self, tenant: &str, handle: &str) -> Result<ThreadRecord, ExchangeError> {
        let mut record = self.get(tenant, handle).await?;
        let messages = self
            .provider
            .list_messages(&record.provider_thread_id)
            .await
            .map_err(ExchangeError::upstream)?;

        let Some(first) = messages.into_iter().find(|m| !m.text.trim().is_empty()) else {
            tracing::debug!(%tenant, %handle, "no messages to title thread from");
            return Ok(record);
        };

        let title = match &self.titler {
            Some(client) => {
                let request = CompletionRequest::new(
                    self.title_model.clone(),
                    vec![Message::human(format!("{}{}", THREAD_TITLE_PROMPT, first.text))],
                );
                let response = client.complete(request).await.map_err(ExchangeError::upstream)?;
                clean_title(response.content.as_deref().unwrap_or_default())
            }
            None => clean_title(&first.text),
        };

        if title.is_empty() {
            return Ok(record);
        }

        self.rename(tenant, handle, &title).await?;
        record.display_name = title;
        tracing::info!(%tenant, %handle, name = %record.display_name, "thread titled");
        Ok(record)
    }
}

fn clean_title(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    trimmed.chars().take(TITLE_MAX_CHARS).collect()
}
