use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use steward_persist::{
    Datanode, InMemoryNodeRepository, NodePayload, NodeStore, PersistError, RelevanceJudge,
    Result, SkeletonNode, DEFAULT_NODE_TYPE,
};

const TENANT: &str = "family-1";

fn seeded_store() -> NodeStore {
    let tree: Datanode = serde_json::from_value(json!({
        "node_id": "root",
        "name": "Family",
        "children": [
            {"node_id": "trips", "name": "Trips", "children": []},
            {"node_id": "meals", "name": "Meals", "details": {"week": 1}}
        ]
    }))
    .unwrap();
    NodeStore::new(Arc::new(InMemoryNodeRepository::with_tree(TENANT, tree)))
}

/// Keeps only the named top-level branches
struct KeepTopLevel(Vec<&'static str>);

#[async_trait]
impl RelevanceJudge for KeepTopLevel {
    async fn select(&self, _prompt: &str, skeleton: &SkeletonNode) -> Result<SkeletonNode> {
        let children = skeleton
            .children
            .iter()
            .flatten()
            .filter(|c| self.0.contains(&c.name.as_str()))
            .cloned()
            .collect();
        Ok(SkeletonNode {
            name: skeleton.name.clone(),
            children: Some(children),
        })
    }
}

#[tokio::test]
async fn test_insert_then_find() {
    let store = seeded_store();
    let payload = NodePayload::new("Lisbon")
        .with_description("Spring trip")
        .with_value(3.0)
        .with_field("days", json!(4));

    let node_id = store
        .insert_child(TENANT, "trips", payload, Some("Itinerary".into()))
        .await
        .unwrap();

    let node = store.find_node(TENANT, &node_id).await.unwrap();
    assert_eq!(node.name, "Lisbon");
    assert_eq!(node.description, "Spring trip");
    assert_eq!(node.value, 3.0);
    assert_eq!(
        node.details,
        Some(json!({"name": "Lisbon", "description": "Spring trip", "value": 3.0, "days": 4}))
    );
    assert_eq!(node.node_type.as_deref(), Some("Itinerary"));
    assert_ne!(node_id, "trips");
}

#[tokio::test]
async fn test_inserted_payload_becomes_details() {
    let store = seeded_store();
    let raw = json!({"name": "Trip", "description": "d", "value": 2, "days": 4});

    let node_id = store
        .insert_child(TENANT, "trips", NodePayload::from_value(raw.clone()).unwrap(), None)
        .await
        .unwrap();

    let node = store.find_node(TENANT, &node_id).await.unwrap();
    assert_eq!(node.details.as_ref(), Some(&raw));
    assert_eq!(node.value, 2.0);
    assert_eq!(node.node_type.as_deref(), Some(DEFAULT_NODE_TYPE));
    assert!(node.is_atomic());
}

#[tokio::test]
async fn test_insert_under_missing_parent_saves_nothing() {
    let store = seeded_store();
    let before = store.load_tree(TENANT).await.unwrap();

    let err = store
        .insert_child(TENANT, "ghost", NodePayload::new("x"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PersistError::NodeNotFound(_)));
    assert_eq!(store.load_tree(TENANT).await.unwrap(), before);
}

#[tokio::test]
async fn test_concurrent_inserts_are_not_lost() {
    let store = Arc::new(seeded_store());
    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .insert_child(TENANT, "trips", NodePayload::new(format!("trip {}", i)), None)
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let tree = store.load_tree(TENANT).await.unwrap();
    assert_eq!(tree.find("trips").unwrap().children().len(), 16);
}

#[tokio::test]
async fn test_replace_contents_round() {
    let store = seeded_store();
    let raw = json!({"name": "Meals", "week": 2});
    store
        .replace_contents(TENANT, "meals", NodePayload::from_value(raw.clone()).unwrap())
        .await
        .unwrap();

    let tree = store.load_tree(TENANT).await.unwrap();
    assert_eq!(tree.children()[1].node_id, "meals");
    assert_eq!(tree.children()[1].name, "Meals");
    assert_eq!(tree.children()[1].details.as_ref(), Some(&raw));
}

#[tokio::test]
async fn test_save_tree_rejects_duplicate_ids() {
    let store = seeded_store();
    let before = store.load_tree(TENANT).await.unwrap();
    let tree: Datanode = serde_json::from_value(json!({
        "node_id": "root",
        "name": "Family",
        "children": [
            {"node_id": "trips", "name": "Trips"},
            {"node_id": "trips", "name": "Trips again"}
        ]
    }))
    .unwrap();

    let err = store.save_tree(TENANT, &tree).await.unwrap_err();

    assert!(matches!(err, PersistError::InvalidNode(msg) if msg.contains("trips")));
    assert_eq!(store.load_tree(TENANT).await.unwrap(), before);
}

#[tokio::test]
async fn test_missing_tree() {
    let store = NodeStore::new(Arc::new(InMemoryNodeRepository::new()));
    assert!(matches!(
        store.find_node("nobody", "root").await,
        Err(PersistError::TreeNotFound(_))
    ));

    let root = store.load_or_init("nobody").await.unwrap();
    assert_eq!(root.node_id, "root");
    assert!(store.find_node("nobody", "root").await.is_ok());
}

#[tokio::test]
async fn test_prune_keeps_original_fields() {
    let store = seeded_store().with_judge(Arc::new(KeepTopLevel(vec!["Meals"])));

    let pruned = store.prune(TENANT, "what are we eating").await.unwrap();
    let original = store.load_tree(TENANT).await.unwrap();

    assert_eq!(pruned.node_ids(), vec!["root", "meals"]);
    assert_eq!(pruned.find("meals"), original.find("meals"));
}

#[tokio::test]
async fn test_prune_without_judge() {
    let store = seeded_store();
    assert!(matches!(
        store.prune(TENANT, "anything").await,
        Err(PersistError::Internal(_))
    ));
}

#[tokio::test]
async fn test_remove_and_update() {
    let store = seeded_store();
    let serde_json::Value::Object(fields) = json!({"description": "Holidays"}) else {
        unreachable!()
    };

    let updated = store.update_node(TENANT, "trips", fields).await.unwrap();
    assert_eq!(updated.description, "Holidays");

    store.remove_node(TENANT, "trips").await.unwrap();
    assert!(matches!(
        store.find_node(TENANT, "trips").await,
        Err(PersistError::NodeNotFound(_))
    ));
    assert!(matches!(
        store.remove_node(TENANT, "root").await,
        Err(PersistError::RootRemoval)
    ));
}
