use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};

/// Caller-facing conversation handle bound to a provider thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub handle: String,
    /// Assigned once at creation, never changes
    pub provider_thread_id: String,
    pub display_name: String,
}

impl ThreadRecord {
    pub fn new(handle: impl Into<String>, provider_thread_id: impl Into<String>) -> Self {
        let handle = handle.into();
        let display_name = format!("Thread {}", handle);
        Self {
            handle,
            provider_thread_id: provider_thread_id.into(),
            display_name,
        }
    }
}

/// Next free handle: one past the largest numeric handle. Non-numeric
/// handles are ignored. Fails once the numeric space is exhausted.
pub fn next_handle<'a, I>(existing: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|h| h.trim().parse::<u64>().ok())
        .max();

    match max {
        Some(n) => n
            .checked_add(1)
            .map(|next| next.to_string())
            .ok_or_else(|| PersistError::Storage(format!("no thread handle after {}", n))),
        None => Ok("1".to_string()),
    }
}
