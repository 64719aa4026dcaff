#![allow(clippy::float_cmp)]

use super::*;
use crate::layers::IndexedObject;

fn obj(id: &str, x: f64, y: f64) -> LayerObject {
    LayerObject::new(id, LayerKind::Plant, x, y)
}

fn update(objects: Vec<LayerObject>) -> Action {
    Action::ObjectUpdate { layer: LayerKind::Plant, objects }
}

/// Track a single move of `id` from `from` to `to`.
fn track_move(bridge: &mut SyncBridge, entry: EntryId, id: &str, from: (f64, f64), to: (f64, f64)) -> SyncSeq {
    bridge.track(Some(entry), &update(vec![obj(id, to.0, to.1)]), &update(vec![obj(id, from.0, from.1)]));
    bridge.take_outbox().last().map(|r| r.seq).unwrap()
}

fn ok(seq: SyncSeq, id: &str) -> SyncResponse {
    SyncResponse { seq, object_id: id.into(), result: Ok(None) }
}

fn rejected(seq: SyncSeq, id: &str) -> SyncResponse {
    SyncResponse {
        seq,
        object_id: id.into(),
        result: Err(RemoteError::Rejected { status: 409, message: "conflict".into() }),
    }
}

// =============================================================
// Op selection
// =============================================================

#[test]
fn position_change_becomes_move() {
    let mut bridge = SyncBridge::new();
    bridge.track(Some(1), &update(vec![obj("a", 5.0, 6.0)]), &update(vec![obj("a", 0.0, 0.0)]));
    let requests = bridge.take_outbox();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].op, SyncOp::Move { x: 5.0, y: 6.0 });
    assert_eq!(requests[0].layer, LayerKind::Plant);
}

#[test]
fn rotation_change_becomes_transform_patch() {
    let mut bridge = SyncBridge::new();
    let mut rotated = obj("a", 0.0, 0.0);
    rotated.rotation = 45.0;
    bridge.track(Some(1), &update(vec![rotated]), &update(vec![obj("a", 0.0, 0.0)]));
    let requests = bridge.take_outbox();
    let SyncOp::Transform(patch) = &requests[0].op else {
        panic!("expected transform, got {:?}", requests[0].op);
    };
    assert_eq!(patch.rotation, Some(45.0));
    assert_eq!(patch.x, None);
}

#[test]
fn add_and_restore_become_create() {
    let mut bridge = SyncBridge::new();
    let add = Action::ObjectAdd { layer: LayerKind::Plant, objects: vec![obj("a", 1.0, 1.0)] };
    let remove = Action::ObjectRemove { layer: LayerKind::Plant, ids: vec!["a".into()] };
    bridge.track(Some(1), &add, &remove);
    let restore =
        Action::ObjectRestore { layer: LayerKind::Plant, entries: vec![IndexedObject { index: 0, object: obj("b", 0.0, 0.0) }] };
    let remove_b = Action::ObjectRemove { layer: LayerKind::Plant, ids: vec!["b".into()] };
    bridge.track(None, &restore, &remove_b);
    let ops: Vec<&str> = bridge.take_outbox().iter().map(|r| r.op.name()).collect();
    assert_eq!(ops, ["create", "create"]);
}

#[test]
fn remove_becomes_delete() {
    let mut bridge = SyncBridge::new();
    let remove = Action::ObjectRemove { layer: LayerKind::Plant, ids: vec!["a".into(), "b".into()] };
    let restore = Action::ObjectRestore {
        layer: LayerKind::Plant,
        entries: vec![
            IndexedObject { index: 0, object: obj("a", 0.0, 0.0) },
            IndexedObject { index: 1, object: obj("b", 0.0, 0.0) },
        ],
    };
    assert_eq!(bridge.track(Some(1), &remove, &restore), 2);
    assert!(bridge.take_outbox().iter().all(|r| r.op == SyncOp::Delete));
}

#[test]
fn grid_layer_and_settings_are_never_synced() {
    let mut bridge = SyncBridge::new();
    let grid_obj = LayerObject::new("g", LayerKind::Grid, 0.0, 0.0);
    let add = Action::ObjectAdd { layer: LayerKind::Grid, objects: vec![grid_obj] };
    let remove = Action::ObjectRemove { layer: LayerKind::Grid, ids: vec!["g".into()] };
    assert_eq!(bridge.track(Some(1), &add, &remove), 0);

    let settings = Action::LayerSettingsUpdate {
        layer: LayerKind::Base,
        settings: crate::layers::LayerSettings::for_kind(LayerKind::Base),
    };
    assert_eq!(bridge.track(Some(2), &settings, &settings), 0);
    assert!(bridge.take_outbox().is_empty());
}

// =============================================================
// Phases
// =============================================================

#[test]
fn requests_move_from_applied_to_pending() {
    let mut bridge = SyncBridge::new();
    bridge.track(Some(1), &update(vec![obj("a", 1.0, 0.0)]), &update(vec![obj("a", 0.0, 0.0)]));
    assert_eq!(bridge.phase(1), Some(SyncPhase::Applied));
    bridge.take_outbox();
    assert_eq!(bridge.phase(1), Some(SyncPhase::Pending));
    assert!(bridge.take_outbox().is_empty());
}

#[test]
fn newer_request_supersedes_older() {
    let mut bridge = SyncBridge::new();
    let first = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    let second = track_move(&mut bridge, 2, "a", (1.0, 1.0), (2.0, 2.0));
    assert!(second > first);
    assert_eq!(bridge.phase(first), Some(SyncPhase::Superseded));
    assert_eq!(bridge.phase(second), Some(SyncPhase::Pending));
    assert_eq!(bridge.pending_count(), 1);
}

#[test]
fn sequences_are_per_object() {
    let mut bridge = SyncBridge::new();
    let a = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    let b = track_move(&mut bridge, 2, "b", (0.0, 0.0), (1.0, 1.0));
    assert_eq!(bridge.phase(a), Some(SyncPhase::Pending));
    assert_eq!(bridge.phase(b), Some(SyncPhase::Pending));
    assert!(bridge.is_pending(LayerKind::Plant, "a"));
    assert!(!bridge.is_pending(LayerKind::Base, "a"));
}

// =============================================================
// Resolution
// =============================================================

#[test]
fn success_confirms() {
    let mut bridge = SyncBridge::new();
    let seq = track_move(&mut bridge, 1, "a", (0.0, 0.0), (5.0, 5.0));
    let resolution = bridge.resolve(ok(seq, "a"));
    assert_eq!(resolution, Resolution::Confirmed { layer: LayerKind::Plant, object_id: "a".into(), canonical: None });
    assert_eq!(resolution.phase(), Some(SyncPhase::Confirmed));
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn failure_yields_restore_for_that_object() {
    let mut bridge = SyncBridge::new();
    let seq = track_move(&mut bridge, 7, "a", (0.0, 0.0), (5.0, 5.0));
    let Resolution::Revert { entry_id, restore, error } = bridge.resolve(rejected(seq, "a")) else {
        panic!("expected revert");
    };
    assert_eq!(entry_id, Some(7));
    assert_eq!(restore, update(vec![obj("a", 0.0, 0.0)]));
    assert_eq!(error, RemoteError::Rejected { status: 409, message: "conflict".into() });
}

#[test]
fn restore_is_restricted_to_the_failed_object() {
    let mut bridge = SyncBridge::new();
    bridge.track(
        Some(1),
        &update(vec![obj("a", 1.0, 1.0), obj("b", 2.0, 2.0)]),
        &update(vec![obj("a", 0.0, 0.0), obj("b", 0.0, 0.0)]),
    );
    let requests = bridge.take_outbox();
    let b = requests.iter().find(|r| r.object_id == "b").unwrap();
    let Resolution::Revert { restore, .. } = bridge.resolve(rejected(b.seq, "b")) else {
        panic!("expected revert");
    };
    assert_eq!(restore, update(vec![obj("b", 0.0, 0.0)]));
}

#[test]
fn stale_success_is_dropped() {
    let mut bridge = SyncBridge::new();
    let first = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    let second = track_move(&mut bridge, 2, "a", (1.0, 1.0), (2.0, 2.0));
    assert_eq!(bridge.resolve(ok(first, "a")), Resolution::Superseded { seq: first });
    assert!(bridge.is_pending(LayerKind::Plant, "a"));
    assert_eq!(bridge.resolve(ok(second, "a")).phase(), Some(SyncPhase::Confirmed));
}

#[test]
fn stale_failure_after_newer_success_is_dropped() {
    let mut bridge = SyncBridge::new();
    let first = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    let second = track_move(&mut bridge, 2, "a", (1.0, 1.0), (2.0, 2.0));
    assert_eq!(bridge.resolve(ok(second, "a")).phase(), Some(SyncPhase::Confirmed));
    assert_eq!(bridge.resolve(rejected(first, "a")), Resolution::Superseded { seq: first });
}

#[test]
fn unknown_and_duplicate_responses_are_ignored() {
    let mut bridge = SyncBridge::new();
    assert_eq!(bridge.resolve(ok(99, "a")), Resolution::Unknown { seq: 99 });
    let seq = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    bridge.resolve(ok(seq, "a"));
    assert_eq!(bridge.resolve(ok(seq, "a")), Resolution::Unknown { seq });
}

#[test]
fn reset_forgets_everything() {
    let mut bridge = SyncBridge::new();
    let seq = track_move(&mut bridge, 1, "a", (0.0, 0.0), (1.0, 1.0));
    bridge.track(Some(2), &update(vec![obj("b", 1.0, 0.0)]), &update(vec![obj("b", 0.0, 0.0)]));
    bridge.reset();
    assert_eq!(bridge.pending_count(), 0);
    assert!(bridge.take_outbox().is_empty());
    assert_eq!(bridge.resolve(ok(seq, "a")), Resolution::Unknown { seq });
}

// =============================================================
// Action ids
// =============================================================

#[test]
fn every_request_gets_a_distinct_action_id() {
    let mut bridge = SyncBridge::new();
    bridge.track(
        Some(1),
        &update(vec![obj("a", 1.0, 0.0), obj("b", 1.0, 0.0)]),
        &update(vec![obj("a", 0.0, 0.0), obj("b", 0.0, 0.0)]),
    );
    let requests = bridge.take_outbox();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].action_id, requests[1].action_id);
}

#[test]
fn own_echo_is_recognized_once() {
    let mut bridge = SyncBridge::new();
    bridge.track(Some(1), &update(vec![obj("a", 1.0, 0.0)]), &update(vec![obj("a", 0.0, 0.0)]));
    let action_id = bridge.take_outbox()[0].action_id;
    assert!(!bridge.take_echo(Uuid::new_v4()));
    assert!(bridge.take_echo(action_id));
    assert!(!bridge.take_echo(action_id));
}

#[test]
fn echoes_survive_reset() {
    let mut bridge = SyncBridge::new();
    bridge.track(Some(1), &update(vec![obj("a", 1.0, 0.0)]), &update(vec![obj("a", 0.0, 0.0)]));
    let action_id = bridge.take_outbox()[0].action_id;
    bridge.reset();
    assert!(bridge.take_echo(action_id));
}

#[test]
fn only_the_newest_action_ids_are_remembered() {
    let mut bridge = SyncBridge::new();
    let mut first = None;
    for i in 0..=OWN_ACTION_MEMORY {
        let to = f64::from(u32::try_from(i).unwrap()) + 1.0;
        bridge.track(None, &update(vec![obj("a", to, 0.0)]), &update(vec![obj("a", to - 1.0, 0.0)]));
        let id = bridge.take_outbox()[0].action_id;
        first.get_or_insert(id);
    }
    assert!(!bridge.take_echo(first.unwrap()));
}
