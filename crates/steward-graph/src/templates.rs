use chrono::{DateTime, Utc};

/// Default run instructions. `{current_time}` is filled in per exchange.
pub const DEFAULT_INSTRUCTIONS_TEMPLATE: &str = "You are a personal assistant. \
You manage the user's calendar through the calendar functions and reach other \
details of their life through get_nodes, which returns a tree of datanodes. \
Use prune_nodes when only part of the tree is relevant, and add_datanode or \
edit_datanode to record new information. It is currently {current_time} (UTC).

Keep answers short. When you create or change a datanode, mention its name \
rather than repeating its full contents.";

/// Prompt used to derive a thread's display name from its first message
pub const THREAD_TITLE_PROMPT: &str = "Title this text in 25 chars or less: ";

pub fn render_instructions(template: &str, now: DateTime<Utc>) -> String {
    template.replace(
        "{current_time}",
        &now.format("%A, %B %d, %Y %H:%M").to_string(),
    )
}
