use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{PersistError, Result};

/// Well-known id of every tenant's root node
pub const ROOT_NODE_ID: &str = "root";

/// `modalContentComponent` given to inserted nodes with no explicit type
pub const DEFAULT_NODE_TYPE: &str = "DatanodeModalContent";

fn default_value() -> f64 {
    1.0
}

/// A node of a tenant's personal-data tree.
///
/// Structural nodes carry `children`; payload nodes carry `details` and are
/// treated as atomic content by prune. Unknown fields survive a round trip
/// through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datanode {
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Relative weight for display, opaque to storage
    #[serde(default = "default_value")]
    pub value: f64,
    /// Which tool or schema produced the node
    #[serde(
        rename = "modalContentComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Datanode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents written by insert and replace operations.
///
/// `details` is the whole payload object, `name`, `description` and
/// `value` included. The three scalar fields are copies lifted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePayload {
    pub name: String,
    pub description: String,
    pub value: f64,
    pub details: Map<String, Value>,
}

/// Names-only view of the tree handed to the relevance judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SkeletonNode>>,
}

/// URL-safe random token (16 random bytes, unpadded base64)
pub fn generate_node_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

impl NodePayload {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut details = Map::new();
        details.insert("name".to_string(), Value::String(name.clone()));
        Self {
            name,
            description: String::new(),
            value: default_value(),
            details,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self.details
            .insert("description".to_string(), Value::String(self.description.clone()));
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self.details.insert("value".to_string(), Value::from(value));
        self
    }

    /// Add a payload field. `name`, `description` and `value` go through
    /// their own setters.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Build from loosely-typed JSON. Only a string `name` is required;
    /// the object itself is kept verbatim as `details`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(PersistError::InvalidNode(
                "payload must be a JSON object".to_string(),
            ));
        };

        let name = match map.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(PersistError::InvalidNode("`name` must be a string".to_string()))
            }
            None => return Err(PersistError::InvalidNode("`name` is required".to_string())),
        };

        let description = match map.get("description") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let value = map
            .get("value")
            .and_then(Value::as_f64)
            .unwrap_or_else(default_value);

        Ok(Self {
            name,
            description,
            value,
            details: map,
        })
    }
}

impl Datanode {
    /// Empty root for a tenant that has no tree yet
    pub fn new_root() -> Self {
        Self {
            node_id: ROOT_NODE_ID.to_string(),
            name: "Root".to_string(),
            description: String::new(),
            value: default_value(),
            node_type: None,
            details: None,
            children: Some(Vec::new()),
            extra: Map::new(),
        }
    }

    fn from_payload(node_id: String, payload: NodePayload, node_type: String) -> Self {
        Self {
            node_id,
            name: payload.name,
            description: payload.description,
            value: payload.value,
            node_type: Some(node_type),
            details: Some(Value::Object(payload.details)),
            children: None,
            extra: Map::new(),
        }
    }

    /// A node carrying a payload is atomic content for pruning
    pub fn is_atomic(&self) -> bool {
        self.details.is_some()
    }

    pub fn children(&self) -> &[Datanode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Depth-first, pre-order search
    pub fn find(&self, node_id: &str) -> Option<&Datanode> {
        if self.node_id == node_id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(node_id))
    }

    pub fn find_mut(&mut self, node_id: &str) -> Option<&mut Datanode> {
        if self.node_id == node_id {
            return Some(self);
        }
        self.children
            .as_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(node_id))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.find(node_id).is_some()
    }

    /// Every node id in the tree, pre-order
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    /// First id that appears more than once, pre-order
    pub fn duplicate_node_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.node_ids().into_iter().find(|id| !seen.insert(*id))
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        ids.push(&self.node_id);
        for child in self.children() {
            child.collect_ids(ids);
        }
    }

    fn fresh_node_id(&self) -> String {
        let taken: HashSet<&str> = self.node_ids().into_iter().collect();
        loop {
            let candidate = generate_node_id();
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }

    /// Append a new node under `parent_id` and return its generated id.
    /// The node type falls back to [`DEFAULT_NODE_TYPE`].
    pub fn insert_child(
        &mut self,
        parent_id: &str,
        payload: NodePayload,
        node_type: Option<String>,
    ) -> Result<String> {
        let node_id = self.fresh_node_id();
        let parent = self
            .find_mut(parent_id)
            .ok_or_else(|| PersistError::NodeNotFound(parent_id.to_string()))?;

        let node_type = node_type.unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string());
        let node = Datanode::from_payload(node_id.clone(), payload, node_type);
        parent.children.get_or_insert_with(Vec::new).push(node);
        Ok(node_id)
    }

    /// Overwrite name, description, value and details in place.
    /// Id, position, type, extra fields and children are untouched.
    pub fn replace_contents(&mut self, node_id: &str, payload: NodePayload) -> Result<()> {
        let node = self
            .find_mut(node_id)
            .ok_or_else(|| PersistError::NodeNotFound(node_id.to_string()))?;

        node.name = payload.name;
        node.description = payload.description;
        node.value = payload.value;
        node.details = Some(Value::Object(payload.details));
        Ok(())
    }

    /// Merge arbitrary top-level fields into a node. `node_id` and
    /// `children` are never overwritten.
    pub fn update_node(&mut self, node_id: &str, fields: Map<String, Value>) -> Result<()> {
        let node = self
            .find_mut(node_id)
            .ok_or_else(|| PersistError::NodeNotFound(node_id.to_string()))?;

        let mut current = match serde_json::to_value(node.without_children())? {
            Value::Object(map) => map,
            _ => return Err(PersistError::Internal("node did not serialize to an object".into())),
        };

        for (key, value) in fields {
            if key == "node_id" || key == "children" {
                continue;
            }
            current.insert(key, value);
        }

        let mut updated: Datanode = serde_json::from_value(Value::Object(current))
            .map_err(|e| PersistError::InvalidNode(e.to_string()))?;
        updated.children = node.children.take();
        *node = updated;
        Ok(())
    }

    /// Detach a node and its subtree. The root itself cannot be removed.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Datanode> {
        if self.node_id == node_id {
            return Err(PersistError::RootRemoval);
        }
        self.detach(node_id)
            .ok_or_else(|| PersistError::NodeNotFound(node_id.to_string()))
    }

    fn detach(&mut self, node_id: &str) -> Option<Datanode> {
        let children = self.children.as_mut()?;
        if let Some(pos) = children.iter().position(|c| c.node_id == node_id) {
            return Some(children.remove(pos));
        }
        children.iter_mut().find_map(|child| child.detach(node_id))
    }

    /// Names-only copy of the tree. Recursion stops at atomic nodes.
    pub fn names_skeleton(&self) -> SkeletonNode {
        let children = match (&self.children, self.is_atomic()) {
            (Some(children), false) => {
                Some(children.iter().map(Datanode::names_skeleton).collect())
            }
            _ => None,
        };
        SkeletonNode {
            name: self.name.clone(),
            children,
        }
    }

    fn without_children(&self) -> Datanode {
        Datanode {
            node_id: self.node_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            value: self.value,
            node_type: self.node_type.clone(),
            details: self.details.clone(),
            children: None,
            extra: self.extra.clone(),
        }
    }

    /// Rebuild a full-fidelity subtree from the names the judge kept.
    ///
    /// Children are matched by name at each level and the first kept entry
    /// with a given name wins. Atomic nodes are copied whole.
    pub fn retain_kept(&self, kept: &SkeletonNode) -> Datanode {
        if self.is_atomic() {
            return self.clone();
        }

        let mut node = self.without_children();
        let (Some(kept_children), Some(children)) = (&kept.children, &self.children) else {
            return node;
        };

        let mut seen = HashSet::new();
        let mut retained = Vec::new();
        for child in children {
            let Some(matched) = kept_children.iter().find(|k| k.name == child.name) else {
                continue;
            };
            if !seen.insert(child.name.as_str()) {
                tracing::warn!(
                    parent = %self.node_id,
                    name = %child.name,
                    "sibling name collision while pruning, reusing first match"
                );
            }
            retained.push(child.retain_kept(matched));
        }

        node.children = Some(retained);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> Datanode {
        serde_json::from_value(json!({
            "node_id": "root",
            "name": "Family",
            "children": [
                {
                    "node_id": "members",
                    "name": "Members",
                    "children": [
                        {"node_id": "alex", "name": "Alex", "value": 2},
                        {"node_id": "sam", "name": "Sam"}
                    ]
                },
                {
                    "node_id": "chores",
                    "name": "Chores",
                    "modalContentComponent": "HouseholdMaintenance",
                    "details": {"tasks": ["dishes"]},
                    "children": [{"node_id": "hidden", "name": "Hidden"}]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserialize_applies_defaults() {
        let tree = sample_tree();
        let sam = tree.find("sam").unwrap();
        assert_eq!(sam.description, "");
        assert_eq!(sam.value, 1.0);
        assert!(sam.children.is_none());
        assert_eq!(tree.find("alex").unwrap().value, 2.0);
    }

    #[test]
    fn unknown_fields_round_trip() {
        let node: Datanode = serde_json::from_value(json!({
            "node_id": "n", "name": "N", "color": "blue"
        }))
        .unwrap();
        assert_eq!(node.extra.get("color"), Some(&json!("blue")));
        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["color"], "blue");
    }

    #[test]
    fn find_is_depth_first() {
        let tree = sample_tree();
        assert_eq!(tree.find("hidden").unwrap().name, "Hidden");
        assert!(tree.find("missing").is_none());
        assert_eq!(
            tree.node_ids(),
            vec!["root", "members", "alex", "sam", "chores", "hidden"]
        );
    }

    #[test]
    fn duplicate_ids_are_reported() {
        assert!(sample_tree().duplicate_node_id().is_none());
        let tree: Datanode = serde_json::from_value(json!({
            "node_id": "root", "name": "Root",
            "children": [
                {"node_id": "a", "name": "A", "children": [{"node_id": "b", "name": "B"}]},
                {"node_id": "b", "name": "B2"}
            ]
        }))
        .unwrap();
        assert_eq!(tree.duplicate_node_id(), Some("b"));
    }

    #[test]
    fn generated_ids_are_url_safe() {
        let id = generate_node_id();
        assert_eq!(id.len(), 22);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn insert_child_creates_children_list() {
        let mut tree = sample_tree();
        let payload = NodePayload::new("Weekly plan")
            .with_description("meals")
            .with_field("monday", json!("pasta"));

        let new_id = tree
            .insert_child("sam", payload, Some("MealPlan".to_string()))
            .unwrap();

        let fresh = sample_tree();
        let before: Vec<&str> = fresh.node_ids();
        assert!(!before.contains(&new_id.as_str()));

        let node = tree.find(&new_id).unwrap();
        assert_eq!(node.name, "Weekly plan");
        assert_eq!(node.description, "meals");
        assert_eq!(node.value, 1.0);
        assert_eq!(
            node.details,
            Some(json!({"name": "Weekly plan", "description": "meals", "monday": "pasta"}))
        );
        assert_eq!(node.node_type.as_deref(), Some("MealPlan"));
        assert!(node.is_atomic());
        assert_eq!(tree.find("sam").unwrap().children().len(), 1);
    }

    #[test]
    fn insert_child_keeps_whole_payload_as_details() {
        let mut tree = sample_tree();
        let raw = json!({"name": "Trip", "description": "d", "value": 2, "days": 4});
        let payload = NodePayload::from_value(raw.clone()).unwrap();

        let new_id = tree.insert_child("root", payload, None).unwrap();

        let node = tree.find(&new_id).unwrap();
        assert_eq!(node.details.as_ref(), Some(&raw));
        assert_eq!(node.name, "Trip");
        assert_eq!(node.description, "d");
        assert_eq!(node.value, 2.0);
        assert_eq!(node.node_type.as_deref(), Some(DEFAULT_NODE_TYPE));
        assert!(node.extra.is_empty());
        assert!(node.is_atomic());
    }

    #[test]
    fn insert_child_unknown_parent() {
        let mut tree = sample_tree();
        let err = tree
            .insert_child("nope", NodePayload::new("x"), None)
            .unwrap_err();
        assert!(matches!(err, PersistError::NodeNotFound(id) if id == "nope"));
    }

    #[test]
    fn payload_requires_string_name() {
        assert!(matches!(
            NodePayload::from_value(json!({"description": "x"})),
            Err(PersistError::InvalidNode(_))
        ));
        assert!(matches!(
            NodePayload::from_value(json!({"name": 3})),
            Err(PersistError::InvalidNode(_))
        ));
        assert!(NodePayload::from_value(json!(["name"])).is_err());

        let payload = NodePayload::from_value(json!({
            "name": "Trip", "value": 3, "description": null, "city": "Lisbon"
        }))
        .unwrap();
        assert_eq!(payload.value, 3.0);
        assert_eq!(payload.description, "");
        assert_eq!(payload.details.get("city"), Some(&json!("Lisbon")));
        assert_eq!(payload.details.get("name"), Some(&json!("Trip")));
    }

    #[test]
    fn replace_contents_preserves_identity_and_order() {
        let mut tree = sample_tree();
        let raw = json!({"name": "Alexandra", "age": 9});
        let payload = NodePayload::from_value(raw.clone()).unwrap();

        tree.replace_contents("alex", payload.clone()).unwrap();
        let once = tree.clone();
        tree.replace_contents("alex", payload).unwrap();
        assert_eq!(tree, once);

        let members = tree.find("members").unwrap();
        assert_eq!(members.children()[0].node_id, "alex");
        assert_eq!(members.children()[0].name, "Alexandra");
        assert_eq!(members.children()[0].value, 1.0);
        assert_eq!(members.children()[0].details.as_ref(), Some(&raw));
        assert_eq!(members.children()[1].node_id, "sam");
    }

    #[test]
    fn replace_contents_keeps_children() {
        let mut tree = sample_tree();
        tree.replace_contents("chores", NodePayload::new("Jobs")).unwrap();
        let chores = tree.find("chores").unwrap();
        assert_eq!(chores.children().len(), 1);
        assert_eq!(chores.node_type.as_deref(), Some("HouseholdMaintenance"));
        assert_eq!(chores.details, Some(json!({"name": "Jobs"})));
    }

    #[test]
    fn update_node_merges_fields() {
        let mut tree = sample_tree();
        let fields = json!({"description": "kids", "node_id": "forged", "children": [], "pinned": true});
        let Value::Object(fields) = fields else { unreachable!() };

        tree.update_node("members", fields).unwrap();

        let members = tree.find("members").unwrap();
        assert_eq!(members.description, "kids");
        assert_eq!(members.children().len(), 2);
        assert_eq!(members.extra.get("pinned"), Some(&json!(true)));
        assert!(tree.find("forged").is_none());
    }

    #[test]
    fn update_node_rejects_bad_name() {
        let mut tree = sample_tree();
        let Value::Object(fields) = json!({"name": 5}) else { unreachable!() };
        assert!(matches!(
            tree.update_node("members", fields),
            Err(PersistError::InvalidNode(_))
        ));
        assert_eq!(tree.find("members").unwrap().children().len(), 2);
    }

    #[test]
    fn remove_node_detaches_subtree() {
        let mut tree = sample_tree();
        let removed = tree.remove_node("members").unwrap();
        assert_eq!(removed.children().len(), 2);
        assert!(tree.find("alex").is_none());
        assert!(matches!(tree.remove_node("root"), Err(PersistError::RootRemoval)));
        assert!(matches!(tree.remove_node("alex"), Err(PersistError::NodeNotFound(_))));
    }

    #[test]
    fn skeleton_stops_at_details() {
        let skeleton = sample_tree().names_skeleton();
        assert_eq!(
            serde_json::to_value(&skeleton).unwrap(),
            json!({
                "name": "Family",
                "children": [
                    {"name": "Members", "children": [{"name": "Alex"}, {"name": "Sam"}]},
                    {"name": "Chores"}
                ]
            })
        );
    }

    #[test]
    fn retain_kept_copies_original_fields() {
        let tree = sample_tree();
        let kept: SkeletonNode = serde_json::from_value(json!({
            "name": "Family",
            "children": [
                {"name": "Members", "children": [{"name": "Sam"}, {"name": "Invented"}]},
                {"name": "Chores"}
            ]
        }))
        .unwrap();

        let pruned = tree.retain_kept(&kept);

        assert_eq!(pruned.node_ids(), vec!["root", "members", "sam", "chores", "hidden"]);
        for id in pruned.node_ids() {
            let original = tree.find(id).unwrap();
            let copy = pruned.find(id).unwrap();
            assert_eq!(copy.without_children(), original.without_children());
        }
    }

    #[test]
    fn retain_kept_without_children_drops_subtree() {
        let tree = sample_tree();
        let kept = SkeletonNode {
            name: "Family".into(),
            children: Some(vec![SkeletonNode { name: "Members".into(), children: None }]),
        };
        let pruned = tree.retain_kept(&kept);
        assert_eq!(pruned.node_ids(), vec!["root", "members"]);
        assert!(pruned.find("members").unwrap().children.is_none());
    }

    #[test]
    fn retain_kept_name_collision_keeps_both() {
        let tree: Datanode = serde_json::from_value(json!({
            "node_id": "root", "name": "Root",
            "children": [
                {"node_id": "a1", "name": "A"},
                {"node_id": "a2", "name": "A"},
                {"node_id": "b", "name": "B"}
            ]
        }))
        .unwrap();
        let kept = SkeletonNode {
            name: "Root".into(),
            children: Some(vec![SkeletonNode { name: "A".into(), children: None }]),
        };
        assert_eq!(tree.retain_kept(&kept).node_ids(), vec!["root", "a1", "a2"]);
    }
}
