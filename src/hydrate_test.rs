#![allow(clippy::float_cmp)]

use serde_json::json;
use time::macros::date;

use super::*;
use crate::remote::test_helpers::MockRemote;

fn config() -> EditorConfig {
    EditorConfig::default()
}

// =============================================================
// parse_object
// =============================================================

#[test]
fn parses_minimal_record_with_defaults() {
    let o = parse_object(LayerKind::Plant, 0, &json!({ "id": "a", "x": 1.5, "y": -2 })).unwrap();
    assert_eq!(o.id, "a");
    assert_eq!((o.x, o.y), (1.5, -2.0));
    assert_eq!((o.width, o.height, o.rotation), (0.0, 0.0, 0.0));
    assert_eq!((o.scale_x, o.scale_y), (1.0, 1.0));
    assert_eq!(o.layer_kind, LayerKind::Plant);
    assert!(o.planting.is_none());
}

#[test]
fn numeric_ids_become_strings() {
    let o = parse_object(LayerKind::Plant, 0, &json!({ "id": 17, "x": 0, "y": 0 })).unwrap();
    assert_eq!(o.id, "17");
}

#[test]
fn parses_planting_fields() {
    let raw = json!({
        "id": "p", "x": 0, "y": 0, "width": 40, "height": 30, "rotation": 15,
        "scaleX": 2, "scaleY": 0.5, "plantId": 9, "addDate": "2024-03-01", "removeDate": null
    });
    let o = parse_object(LayerKind::Plant, 0, &raw).unwrap();
    assert_eq!((o.width, o.height, o.rotation, o.scale_x, o.scale_y), (40.0, 30.0, 15.0, 2.0, 0.5));
    let planting = o.planting.unwrap();
    assert_eq!(planting.plant_id, 9);
    assert_eq!(planting.add_date, Some(date!(2024 - 03 - 01)));
    assert_eq!(planting.remove_date, None);
}

#[test]
fn missing_position_is_reported() {
    let err = parse_object(LayerKind::Plant, 3, &json!({ "id": "a", "x": 1 })).unwrap_err();
    assert_eq!(err, HydrateError::MissingField { layer: LayerKind::Plant, index: 3, field: "y" });
    assert_eq!(err.error_code(), "E_LAYER_MALFORMED");
}

#[test]
fn missing_id_is_reported() {
    let err = parse_object(LayerKind::Plant, 0, &json!({ "x": 1, "y": 1 })).unwrap_err();
    assert_eq!(err, HydrateError::MissingField { layer: LayerKind::Plant, index: 0, field: "id" });
}

#[test]
fn wrong_types_are_invalid() {
    let bad_x = parse_object(LayerKind::Plant, 0, &json!({ "id": "a", "x": "1", "y": 1 })).unwrap_err();
    assert_eq!(bad_x, HydrateError::InvalidField { layer: LayerKind::Plant, index: 0, field: "x" });
    let bad_id = parse_object(LayerKind::Plant, 0, &json!({ "id": true, "x": 1, "y": 1 })).unwrap_err();
    assert_eq!(bad_id, HydrateError::InvalidField { layer: LayerKind::Plant, index: 0, field: "id" });
    let bad_date =
        parse_object(LayerKind::Plant, 0, &json!({ "id": "a", "x": 1, "y": 1, "plantId": 1, "addDate": "soon" }))
            .unwrap_err();
    assert_eq!(bad_date, HydrateError::InvalidField { layer: LayerKind::Plant, index: 0, field: "addDate" });
}

#[test]
fn non_object_record_is_invalid() {
    let err = parse_object(LayerKind::Plant, 1, &json!([1, 2])).unwrap_err();
    assert_eq!(err, HydrateError::InvalidField { layer: LayerKind::Plant, index: 1, field: "record" });
}

// =============================================================
// parse_settings
// =============================================================

#[test]
fn parses_base_settings() {
    let raw = json!({ "nextcloudImagePath": "/maps/site.jpg", "scale": 250, "rotation": 3 });
    let settings = parse_settings(LayerKind::Base, &raw).unwrap();
    let base = settings.as_base().unwrap();
    assert_eq!(base.image_path(), Some("maps/site.jpg"));
    assert_eq!(base.pixels_per_meter, 250.0);
    assert_eq!(base.rotation, 3.0);
}

#[test]
fn base_settings_require_scale() {
    let err = parse_settings(LayerKind::Base, &json!({ "nextcloudImagePath": "a.png" })).unwrap_err();
    assert_eq!(err, HydrateError::MissingField { layer: LayerKind::Base, index: 0, field: "scale" });
}

#[test]
fn other_layers_ignore_settings() {
    assert_eq!(parse_settings(LayerKind::Plant, &json!({ "anything": 1 })).unwrap(), LayerSettings::None);
}

// =============================================================
// hydrate
// =============================================================

#[tokio::test]
async fn hydrates_every_page() {
    let mut remote = MockRemote::default();
    remote.pages.insert(
        LayerKind::Plant,
        vec![
            vec![json!({ "id": "a", "x": 0, "y": 0 }), json!({ "id": "b", "x": 1, "y": 1 })],
            vec![json!({ "id": "c", "x": 2, "y": 2 })],
        ],
    );
    remote.settings.insert(LayerKind::Base, json!({ "nextcloudImagePath": "/site.png", "scale": 100 }));

    let hydration = hydrate(&remote, &config()).await;
    assert!(hydration.is_complete());
    let plant = hydration.tracked.layer(LayerKind::Plant).unwrap();
    assert_eq!(plant.len(), 3);
    assert_eq!(hydration.status[&LayerKind::Plant], LayerStatus::Loaded { objects: 3 });
    assert_eq!(hydration.status[&LayerKind::Grid], LayerStatus::Loaded { objects: 0 });
    let base = hydration.tracked.layer(LayerKind::Base).unwrap();
    assert_eq!(base.settings.as_base().and_then(BaseLayerSettings::image_path), Some("site.png"));
}

#[tokio::test]
async fn grid_layer_is_never_fetched() {
    let remote = MockRemote::default();
    hydrate(&remote, &config()).await;
    let calls = remote.calls().await;
    assert!(calls.iter().all(|c| !c.contains("grid")), "{calls:?}");
    assert!(calls.contains(&"list plant".to_string()));
}

#[tokio::test]
async fn malformed_layer_fails_alone() {
    let mut remote = MockRemote::default();
    remote.pages.insert(LayerKind::Plant, vec![vec![json!({ "id": "a", "x": 0, "y": 0 }), json!({ "id": "b" })]]);
    remote.settings.insert(LayerKind::Base, json!({ "nextcloudImagePath": "/site.png", "scale": 100 }));

    let hydration = hydrate(&remote, &config()).await;
    assert!(!hydration.is_complete());
    assert!(hydration.tracked.layer(LayerKind::Plant).is_some_and(Layer::is_empty));
    let LayerStatus::Failed { code, message } = &hydration.status[&LayerKind::Plant] else {
        panic!("plant layer should have failed");
    };
    assert_eq!(*code, "E_LAYER_MALFORMED");
    assert!(message.contains("record 1"), "{message}");
    assert!(matches!(hydration.status[&LayerKind::Base], LayerStatus::Loaded { .. }));
}

#[tokio::test]
async fn unreachable_layer_fails_alone() {
    let mut remote = MockRemote::default();
    remote.unreachable.push(LayerKind::Base);
    remote.pages.insert(LayerKind::Plant, vec![vec![json!({ "id": "a", "x": 0, "y": 0 })]]);

    let hydration = hydrate(&remote, &config()).await;
    assert!(matches!(
        hydration.status[&LayerKind::Base],
        LayerStatus::Failed { code: "E_SYNC_UNREACHABLE", .. }
    ));
    assert_eq!(hydration.tracked.layer(LayerKind::Plant).map(Layer::len), Some(1));
}

#[tokio::test]
async fn runaway_paging_is_cut_off() {
    let mut remote = MockRemote::default();
    remote.pages.insert(LayerKind::Plant, (0..5).map(|i| vec![json!({ "id": i, "x": 0, "y": 0 })]).collect());
    let config = EditorConfig { hydrate_max_pages: 3, ..EditorConfig::default() };

    let err = hydrate_layer(&remote, LayerKind::Plant, config.hydrate_max_pages).await.unwrap_err();
    assert_eq!(err, HydrateError::TooManyPages { layer: LayerKind::Plant, max: 3 });
    assert_eq!(err.error_code(), "E_LAYER_TOO_LARGE");

    let hydration = hydrate(&remote, &config).await;
    assert!(matches!(hydration.status[&LayerKind::Plant], LayerStatus::Failed { code: "E_LAYER_TOO_LARGE", .. }));
}

#[tokio::test]
async fn duplicate_ids_across_pages_keep_the_last_version() {
    let mut remote = MockRemote::default();
    remote.pages.insert(
        LayerKind::Plant,
        vec![vec![json!({ "id": "a", "x": 0, "y": 0 })], vec![json!({ "id": "a", "x": 5, "y": 5 })]],
    );
    let layer = hydrate_layer(&remote, LayerKind::Plant, 8).await.unwrap();
    assert_eq!(layer.len(), 1);
    assert_eq!(layer.get("a").map(|o| o.x), Some(5.0));
}
