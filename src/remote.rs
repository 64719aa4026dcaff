//! Remote store seam and the tokio driver that executes sync requests.
//!
//! DESIGN
//! ======
//! The editing core never awaits. [`crate::sync::SyncBridge`] produces
//! requests; [`SyncDriver`] spawns one task per request against an
//! `Arc<dyn RemoteStore>` and hands responses back over an unbounded channel.
//! Completion order is whatever the network gives us; sequencing is the
//! bridge's job, not the driver's.

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::layers::{LayerKind, LayerObject, ObjectPatch};
use crate::sync::{ActionId, SyncOp, SyncRequest, SyncResponse};

/// Opaque continuation token for paged listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(pub String);

/// One page of raw layer records. `next` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPage {
    pub items: Vec<serde_json::Value>,
    pub next: Option<PageCursor>,
}

/// Persistence backend for a plan. Enables mocking in tests.
///
/// Every write carries the client-minted [`ActionId`] so the server can stamp
/// it on the change it broadcasts to collaborators. Write methods may return
/// the canonical object as stored; `None` means the server accepted the write
/// without echoing it.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Persist a position-only change.
    async fn update_position(
        &self,
        action_id: ActionId,
        layer: LayerKind,
        id: &str,
        x: f64,
        y: f64,
    ) -> Result<Option<LayerObject>, RemoteError>;

    /// Persist the changed fields of an object.
    async fn update_transform(
        &self,
        action_id: ActionId,
        layer: LayerKind,
        id: &str,
        patch: &ObjectPatch,
    ) -> Result<Option<LayerObject>, RemoteError>;

    async fn create_object(&self, action_id: ActionId, object: &LayerObject) -> Result<Option<LayerObject>, RemoteError>;

    async fn delete_object(&self, action_id: ActionId, layer: LayerKind, id: &str) -> Result<(), RemoteError>;

    /// Raw object records of a layer, one page at a time.
    async fn list_objects_for_layer(
        &self,
        layer: LayerKind,
        cursor: Option<PageCursor>,
    ) -> Result<ObjectPage, RemoteError>;

    /// Raw settings record of a layer, if it has one.
    async fn layer_settings(&self, layer: LayerKind) -> Result<Option<serde_json::Value>, RemoteError>;
}

/// Run one request against `remote`.
///
/// A canonical object that does not describe the requested object is
/// discarded: the write itself was accepted, so it still confirms.
pub async fn execute(remote: &dyn RemoteStore, request: &SyncRequest) -> SyncResponse {
    let SyncRequest { seq, action_id, layer, object_id, op } = request;
    let result = match op {
        SyncOp::Create(object) => remote.create_object(*action_id, object).await,
        SyncOp::Move { x, y } => remote.update_position(*action_id, *layer, object_id, *x, *y).await,
        SyncOp::Transform(patch) => remote.update_transform(*action_id, *layer, object_id, patch).await,
        SyncOp::Delete => remote.delete_object(*action_id, *layer, object_id).await.map(|()| None),
    };
    let result = match result {
        Ok(Some(canonical)) if canonical.id != *object_id || canonical.layer_kind != *layer => {
            warn!(
                seq,
                expected = %format!("{layer}/{object_id}"),
                returned = %format!("{}/{}", canonical.layer_kind, canonical.id),
                "server echoed a different object; confirming without merge"
            );
            Ok(None)
        }
        other => other,
    };
    SyncResponse { seq: *seq, object_id: object_id.clone(), result }
}

/// Executes sync requests concurrently on the tokio runtime.
pub struct SyncDriver {
    remote: Arc<dyn RemoteStore>,
    tx: mpsc::UnboundedSender<SyncResponse>,
    rx: mpsc::UnboundedReceiver<SyncResponse>,
}

impl SyncDriver {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { remote, tx, rx }
    }

    /// Spawn one task per request. Must be called from within a tokio runtime.
    pub fn submit(&self, requests: Vec<SyncRequest>) {
        for request in requests {
            let remote = Arc::clone(&self.remote);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let response = execute(remote.as_ref(), &request).await;
                if tx.send(response).is_err() {
                    debug!(seq = request.seq, "sync driver gone; response discarded");
                }
            });
        }
    }

    /// A finished response, if one is ready.
    pub fn try_next(&mut self) -> Option<SyncResponse> {
        match self.rx.try_recv() {
            Ok(response) => Some(response),
            Err(_) => None,
        }
    }

    /// Wait for the next finished response.
    pub async fn recv(&mut self) -> Option<SyncResponse> {
        self.rx.recv().await
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
