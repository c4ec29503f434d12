use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use steward_persist::{NodePayload, NodeStore, DEFAULT_NODE_TYPE, ROOT_NODE_ID};

use crate::tool::{optional_str, required_str, Tool, ToolContext};

/// Contents shared by the add and edit tools. The `datanode` object is
/// stored whole; top-level `name`, `description` and `value` only fill keys
/// it leaves out.
fn payload_from_args(args: &Value) -> Result<NodePayload> {
    let mut datanode = match args.get("datanode") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => bail!("`datanode` must be an object"),
    };
    for key in ["name", "description", "value"] {
        if let Some(fallback) = args.get(key).filter(|v| !v.is_null()) {
            datanode
                .entry(key.to_string())
                .or_insert_with(|| fallback.clone());
        }
    }
    if !datanode.contains_key("name") {
        bail!("missing required string argument `datanode.name`");
    }
    Ok(NodePayload::from_value(Value::Object(datanode))?)
}

fn node_contents_schema(extra: Value) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "datanode": {
                "type": "object",
                "description": "The node payload, stored whole as the node's details",
                "properties": {
                    "name": {"type": "string", "description": "Display name of the datanode"},
                    "description": {"type": "string", "description": "Short description", "default": ""},
                    "value": {"type": "number", "description": "Relative size of the node", "default": 1}
                },
                "required": ["name"]
            }
        },
        "required": ["datanode"]
    });
    if let (Some(props), Value::Object(extra_props)) = (schema["properties"].as_object_mut(), extra) {
        props.extend(extra_props);
    }
    schema
}

pub struct GetNodesTool {
    nodes: Arc<NodeStore>,
}

impl GetNodesTool {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl Tool for GetNodesTool {
    fn name(&self) -> &str {
        "get_nodes"
    }

    fn description(&self) -> &str {
        "Return the user's whole datanode tree"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, ctx: &ToolContext, _args: Value) -> Result<String> {
        let tree = self.nodes.load_tree(&ctx.tenant).await?;
        Ok(serde_json::to_string(&tree)?)
    }
}

pub struct GetNodeByIdTool {
    nodes: Arc<NodeStore>,
}

impl GetNodeByIdTool {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl Tool for GetNodeByIdTool {
    fn name(&self) -> &str {
        "get_node_by_id"
    }

    fn description(&self) -> &str {
        "Return one datanode, including its children, by node_id"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"node_id": {"type": "string", "description": "The node_id to look up"}},
            "required": ["node_id"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<String> {
        let node = self
            .nodes
            .find_node(&ctx.tenant, required_str(&args, "node_id")?)
            .await?;
        Ok(serde_json::to_string(&node)?)
    }
}

pub struct PruneNodesTool {
    nodes: Arc<NodeStore>,
}

impl PruneNodesTool {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl Tool for PruneNodesTool {
    fn name(&self) -> &str {
        "prune_nodes"
    }

    fn description(&self) -> &str {
        "Return only the parts of the datanode tree relevant to a prompt"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"prompt": {"type": "string", "description": "What the pruned tree should be relevant to"}},
            "required": ["prompt"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<String> {
        let pruned = self
            .nodes
            .prune(&ctx.tenant, required_str(&args, "prompt")?)
            .await?;
        Ok(serde_json::to_string(&pruned)?)
    }
}

pub struct AddDatanodeTool {
    nodes: Arc<NodeStore>,
}

impl AddDatanodeTool {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl Tool for AddDatanodeTool {
    fn name(&self) -> &str {
        "add_datanode"
    }

    fn description(&self) -> &str {
        "Create a datanode under a parent node. Use get_nodes first to find the parent_node_id."
    }

    fn parameters(&self) -> Value {
        node_contents_schema(json!({
            "parent_node_id": {"type": "string", "description": "The node whose children array receives the new datanode", "default": ROOT_NODE_ID},
            "node_type": {"type": "string", "description": "Component that renders the node", "default": DEFAULT_NODE_TYPE}
        }))
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<String> {
        let parent_id = optional_str(&args, "parent_node_id").unwrap_or(ROOT_NODE_ID);
        let node_type = optional_str(&args, "node_type").map(str::to_string);
        let payload = payload_from_args(&args)?;

        let node_id = self
            .nodes
            .insert_child(&ctx.tenant, parent_id, payload, node_type)
            .await?;
        Ok(json!({"status": "created", "node_id": node_id, "parent_node_id": parent_id}).to_string())
    }
}

pub struct EditDatanodeTool {
    nodes: Arc<NodeStore>,
}

impl EditDatanodeTool {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl Tool for EditDatanodeTool {
    fn name(&self) -> &str {
        "edit_datanode"
    }

    fn description(&self) -> &str {
        "Replace the name, description, value and payload of an existing datanode"
    }

    fn parameters(&self) -> Value {
        let mut schema = node_contents_schema(json!({
            "node_id": {"type": "string", "description": "The datanode to edit"}
        }));
        if let Some(required) = schema["required"].as_array_mut() {
            required.push(json!("node_id"));
        }
        schema
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<String> {
        let node_id = required_str(&args, "node_id")?;
        let payload = payload_from_args(&args)?;

        self.nodes
            .replace_contents(&ctx.tenant, node_id, payload)
            .await?;
        Ok(json!({"status": "updated", "node_id": node_id}).to_string())
    }
}
