//! Load-time hydration of the tracked state from the remote store.
//!
//! Each persisted layer is fetched page by page and parsed record by record.
//! A layer that fails (unreachable, malformed record, runaway paging) is left
//! empty and marked [`LayerStatus::Failed`]; the other layers still load.

#[cfg(test)]
#[path = "hydrate_test.rs"]
mod hydrate_test;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use time::Date;
use time::macros::format_description;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::error::{ErrorCode, HydrateError};
use crate::layers::{BaseLayerSettings, Layer, LayerKind, LayerObject, LayerSettings, PlantingDetails};
use crate::remote::RemoteStore;
use crate::state::{LayerStatus, TrackedState};

/// Result of loading a plan: the state plus the outcome per layer.
#[derive(Debug, Clone)]
pub struct Hydration {
    pub tracked: TrackedState,
    pub status: BTreeMap<LayerKind, LayerStatus>,
}

impl Hydration {
    /// Whether every layer loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.values().all(|s| matches!(s, LayerStatus::Loaded { .. }))
    }
}

/// Load every layer. Never fails as a whole.
pub async fn hydrate(remote: &dyn RemoteStore, config: &EditorConfig) -> Hydration {
    let mut layers = Vec::new();
    let mut status = BTreeMap::new();
    for kind in LayerKind::ALL {
        if kind.is_frontend_only() {
            status.insert(kind, LayerStatus::Loaded { objects: 0 });
            continue;
        }
        match hydrate_layer(remote, kind, config.hydrate_max_pages).await {
            Ok(layer) => {
                info!(layer = %kind, objects = layer.len(), "layer hydrated");
                status.insert(kind, LayerStatus::Loaded { objects: layer.len() });
                layers.push(layer);
            }
            Err(e) => {
                warn!(layer = %kind, error = %e, code = e.error_code(), "layer failed to hydrate");
                status.insert(kind, LayerStatus::Failed { code: e.error_code(), message: e.to_string() });
            }
        }
    }
    Hydration { tracked: TrackedState::from_layers(layers), status }
}

/// Load one layer: its settings, then every page of objects.
///
/// # Errors
///
/// Returns a [`HydrateError`] if the remote fails, a record is malformed, or
/// the listing does not end within `max_pages`.
pub async fn hydrate_layer(remote: &dyn RemoteStore, kind: LayerKind, max_pages: usize) -> Result<Layer, HydrateError> {
    let mut layer = Layer::new(kind);
    if let Some(raw) = remote.layer_settings(kind).await? {
        layer.settings = parse_settings(kind, &raw)?;
    }

    let mut cursor = None;
    let mut index = 0;
    for page_no in 0..max_pages {
        let page = remote.list_objects_for_layer(kind, cursor.take()).await?;
        debug!(layer = %kind, page = page_no, items = page.items.len(), "page fetched");
        let mut objects = Vec::with_capacity(page.items.len());
        for raw in &page.items {
            objects.push(parse_object(kind, index, raw)?);
            index += 1;
        }
        layer.upsert(objects);
        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok(layer),
        }
    }
    Err(HydrateError::TooManyPages { layer: kind, max: max_pages })
}

/// Parse one raw layer record.
///
/// `id` may be a string or an integer. `x` and `y` are required; size,
/// rotation and scale default. A `plantId` turns the record into a planting
/// with optional `addDate`/`removeDate` (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`HydrateError::MissingField`] or [`HydrateError::InvalidField`].
pub fn parse_object(kind: LayerKind, index: usize, raw: &Value) -> Result<LayerObject, HydrateError> {
    let record = Record::new(kind, index, raw)?;
    let mut obj = LayerObject::new(record.id()?, kind, record.required_f64("x")?, record.required_f64("y")?);
    obj.width = record.optional_f64("width")?.unwrap_or(0.0);
    obj.height = record.optional_f64("height")?.unwrap_or(0.0);
    obj.rotation = record.optional_f64("rotation")?.unwrap_or(0.0);
    obj.scale_x = record.optional_f64("scaleX")?.unwrap_or(1.0);
    obj.scale_y = record.optional_f64("scaleY")?.unwrap_or(1.0);
    if let Some(plant_id) = record.optional_i64("plantId")? {
        obj.planting = Some(PlantingDetails {
            plant_id,
            add_date: record.optional_date("addDate")?,
            remove_date: record.optional_date("removeDate")?,
        });
    }
    Ok(obj)
}

/// Parse a raw layer settings record. Only the base layer carries settings.
///
/// # Errors
///
/// Returns a [`HydrateError`] when the base settings are malformed.
pub fn parse_settings(kind: LayerKind, raw: &Value) -> Result<LayerSettings, HydrateError> {
    if kind != LayerKind::Base {
        debug!(layer = %kind, "settings record ignored");
        return Ok(LayerSettings::for_kind(kind));
    }
    let record = Record::new(kind, 0, raw)?;
    Ok(LayerSettings::Base(BaseLayerSettings {
        nextcloud_image_path: record.optional_str("nextcloudImagePath")?.unwrap_or_default().to_string(),
        pixels_per_meter: record.required_f64("scale")?,
        rotation: record.optional_f64("rotation")?.unwrap_or(0.0),
    }))
}

// =============================================================================
// RECORD ACCESSORS
// =============================================================================

/// Typed field access over a raw JSON record, reporting errors with position.
struct Record<'a> {
    kind: LayerKind,
    index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(kind: LayerKind, index: usize, raw: &'a Value) -> Result<Self, HydrateError> {
        match raw.as_object() {
            Some(fields) => Ok(Self { kind, index, fields }),
            None => Err(HydrateError::InvalidField { layer: kind, index, field: "record" }),
        }
    }

    fn missing(&self, field: &'static str) -> HydrateError {
        HydrateError::MissingField { layer: self.kind, index: self.index, field }
    }

    fn invalid(&self, field: &'static str) -> HydrateError {
        HydrateError::InvalidField { layer: self.kind, index: self.index, field }
    }

    /// Present and non-null.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn id(&self) -> Result<String, HydrateError> {
        match self.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            Some(_) => Err(self.invalid("id")),
            None => Err(self.missing("id")),
        }
    }

    fn required_f64(&self, field: &'static str) -> Result<f64, HydrateError> {
        self.optional_f64(field)?.ok_or_else(|| self.missing(field))
    }

    fn optional_f64(&self, field: &'static str) -> Result<Option<f64>, HydrateError> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => v.as_f64().filter(|n| n.is_finite()).map(Some).ok_or_else(|| self.invalid(field)),
        }
    }

    fn optional_i64(&self, field: &'static str) -> Result<Option<i64>, HydrateError> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| self.invalid(field)),
        }
    }

    fn optional_str(&self, field: &'static str) -> Result<Option<&'a str>, HydrateError> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| self.invalid(field)),
        }
    }

    fn optional_date(&self, field: &'static str) -> Result<Option<Date>, HydrateError> {
        let Some(raw) = self.optional_str(field)? else {
            return Ok(None);
        };
        match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
            Ok(date) => Ok(Some(date)),
            Err(_) => Err(self.invalid(field)),
        }
    }
}
