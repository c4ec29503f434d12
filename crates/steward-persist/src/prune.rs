use std::sync::Arc;

use async_trait::async_trait;
use steward_llm::{CompletionClient, CompletionOptions, CompletionRequest, Message};

use crate::error::{PersistError, Result};
use crate::models::{Datanode, SkeletonNode};

pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4o";

/// Decides which parts of a names-only tree are relevant to a prompt
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    /// Return the subset of `skeleton` to keep, in the same shape
    async fn select(&self, prompt: &str, skeleton: &SkeletonNode) -> Result<SkeletonNode>;
}

/// Asks a completion model for the kept skeleton as a JSON object
pub struct ModelRelevanceJudge {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl ModelRelevanceJudge {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            model: DEFAULT_JUDGE_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_prompt(prompt: &str, skeleton: &SkeletonNode) -> Result<String> {
        let tree = serde_json::to_string(skeleton)?;
        Ok(format!(
            "Based on the following prompt, prune the node tree below to only the relevant nodes.\n\n\
             {prompt}\n\n\
             {tree}\n\n\
             Respond with a single JSON object of the form \
             {{\"name\": string, \"children\": [same shape, optional]}}. \
             Keep node names exactly as given. Only provide the JSON object itself."
        ))
    }
}

#[async_trait]
impl RelevanceJudge for ModelRelevanceJudge {
    async fn select(&self, prompt: &str, skeleton: &SkeletonNode) -> Result<SkeletonNode> {
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![Message::human(Self::build_prompt(prompt, skeleton)?)],
        )
        .with_options(CompletionOptions::new().json_mode());

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| PersistError::Relevance(e.to_string()))?;

        let content = response
            .content
            .ok_or_else(|| PersistError::Relevance("empty judge response".to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| PersistError::Relevance(format!("unparseable judge response: {}", e)))
    }
}

/// Two-phase prune: names-only skeleton to the judge, then full-fidelity
/// reconstruction of whatever it kept.
pub async fn prune_tree(
    tree: &Datanode,
    prompt: &str,
    judge: &dyn RelevanceJudge,
) -> Result<Datanode> {
    let skeleton = tree.names_skeleton();
    let kept = judge.select(prompt, &skeleton).await?;
    let pruned = tree.retain_kept(&kept);

    tracing::debug!(
        original_nodes = tree.node_ids().len(),
        kept_nodes = pruned.node_ids().len(),
        "pruned node tree"
    );

    Ok(pruned)
}
