#![allow(clippy::float_cmp)]

use std::time::Duration;

use uuid::Uuid;

use super::test_helpers::MockRemote;
use super::*;

fn obj(id: &str) -> LayerObject {
    LayerObject::new(id, LayerKind::Plant, 1.0, 2.0)
}

fn request(seq: u64, id: &str, op: SyncOp) -> SyncRequest {
    SyncRequest { seq, action_id: Uuid::new_v4(), layer: LayerKind::Plant, object_id: id.into(), op }
}

/// Canned remote that echoes a fixed canonical object for every move.
struct EchoRemote {
    canonical: LayerObject,
}

#[async_trait::async_trait]
impl RemoteStore for EchoRemote {
    async fn update_position(
        &self,
        _: ActionId,
        _: LayerKind,
        _: &str,
        _: f64,
        _: f64,
    ) -> Result<Option<LayerObject>, RemoteError> {
        Ok(Some(self.canonical.clone()))
    }
    async fn update_transform(
        &self,
        _: ActionId,
        _: LayerKind,
        _: &str,
        _: &ObjectPatch,
    ) -> Result<Option<LayerObject>, RemoteError> {
        Ok(None)
    }
    async fn create_object(&self, _: ActionId, _: &LayerObject) -> Result<Option<LayerObject>, RemoteError> {
        Ok(None)
    }
    async fn delete_object(&self, _: ActionId, _: LayerKind, _: &str) -> Result<(), RemoteError> {
        Ok(())
    }
    async fn list_objects_for_layer(&self, _: LayerKind, _: Option<PageCursor>) -> Result<ObjectPage, RemoteError> {
        Ok(ObjectPage::default())
    }
    async fn layer_settings(&self, _: LayerKind) -> Result<Option<serde_json::Value>, RemoteError> {
        Ok(None)
    }
}

// =============================================================
// execute
// =============================================================

#[tokio::test]
async fn execute_routes_each_op() {
    let remote = MockRemote::default();
    execute(&remote, &request(1, "a", SyncOp::Move { x: 1.0, y: 2.0 })).await;
    execute(&remote, &request(2, "a", SyncOp::Transform(ObjectPatch { rotation: Some(9.0), ..ObjectPatch::default() }))).await;
    execute(&remote, &request(3, "b", SyncOp::Create(obj("b")))).await;
    execute(&remote, &request(4, "b", SyncOp::Delete)).await;
    assert_eq!(remote.calls().await, ["move plant a", "transform plant a", "create plant b", "delete plant b"]);
}

#[tokio::test]
async fn execute_carries_seq_and_result() {
    let remote = MockRemote::default();
    let response = execute(&remote, &request(42, "b", SyncOp::Create(obj("b")))).await;
    assert_eq!(response.seq, 42);
    assert_eq!(response.object_id, "b");
    assert_eq!(response.result, Ok(Some(obj("b"))));
}

#[tokio::test]
async fn execute_reports_rejection() {
    let remote = MockRemote { rejected: vec!["a".into()], ..MockRemote::default() };
    let response = execute(&remote, &request(1, "a", SyncOp::Delete)).await;
    assert!(matches!(response.result, Err(RemoteError::Rejected { status: 422, .. })));
}

#[tokio::test]
async fn canonical_for_another_object_confirms_without_merge() {
    let remote = EchoRemote { canonical: obj("someone-else") };
    let response = execute(&remote, &request(1, "a", SyncOp::Move { x: 0.0, y: 0.0 })).await;
    assert_eq!(response.result, Ok(None));

    let remote = EchoRemote { canonical: LayerObject::new("a", LayerKind::Base, 0.0, 0.0) };
    let response = execute(&remote, &request(2, "a", SyncOp::Move { x: 0.0, y: 0.0 })).await;
    assert_eq!(response.result, Ok(None));
}

#[tokio::test]
async fn matching_canonical_passes_through() {
    let remote = EchoRemote { canonical: obj("a") };
    let response = execute(&remote, &request(1, "a", SyncOp::Move { x: 0.0, y: 0.0 })).await;
    assert_eq!(response.result, Ok(Some(obj("a"))));
}

// =============================================================
// SyncDriver
// =============================================================

#[tokio::test]
async fn driver_returns_one_response_per_request() {
    let remote = Arc::new(MockRemote::default());
    let mut driver = SyncDriver::new(remote.clone());
    driver.submit(vec![
        request(1, "a", SyncOp::Move { x: 1.0, y: 1.0 }),
        request(2, "b", SyncOp::Create(obj("b"))),
        request(3, "c", SyncOp::Delete),
    ]);
    let mut seqs = Vec::new();
    for _ in 0..3 {
        let response = tokio::time::timeout(Duration::from_secs(5), driver.recv()).await.unwrap().unwrap();
        seqs.push(response.seq);
    }
    seqs.sort_unstable();
    assert_eq!(seqs, [1, 2, 3]);
    assert_eq!(remote.calls().await.len(), 3);
}

#[tokio::test]
async fn try_next_is_empty_without_work() {
    let mut driver = SyncDriver::new(Arc::new(MockRemote::default()));
    assert!(driver.try_next().is_none());
}

// =============================================================
// MockRemote paging
// =============================================================

#[tokio::test]
async fn listing_follows_cursors() {
    let mut remote = MockRemote::default();
    remote.pages.insert(
        LayerKind::Plant,
        vec![vec![serde_json::json!({ "id": "a" })], vec![serde_json::json!({ "id": "b" })]],
    );
    let first = remote.list_objects_for_layer(LayerKind::Plant, None).await.unwrap();
    assert_eq!(first.items.len(), 1);
    let second = remote.list_objects_for_layer(LayerKind::Plant, first.next).await.unwrap();
    assert_eq!(second.items[0]["id"], "b");
    assert!(second.next.is_none());
}
