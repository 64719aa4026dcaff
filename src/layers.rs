//! Layer model: layer kinds, the objects placed on them, and per-layer containers.
//!
//! Every addressable thing on the canvas is a [`LayerObject`] living in exactly
//! one [`Layer`]. Identifiers are unique within a layer; layers are separate
//! namespaces, so the same id may appear on two layers. Layer-wide data that
//! is not an object (the base image reference) lives in [`LayerSettings`] and
//! is replaced as a whole.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::units;

/// Stable identifier for a layer object, assigned by the client or the server.
pub type ObjectId = String;

/// Mint a fresh client-side object id.
#[must_use]
pub fn new_object_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

/// The kind of a layer. Declaration order is the stacking order, bottom first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Aerial or site image the plan is drawn over.
    Base,
    /// Measurement grid; computed locally and never persisted.
    Grid,
    /// Planted items.
    Plant,
}

impl LayerKind {
    /// All layer kinds in stacking order.
    pub const ALL: [LayerKind; 3] = [LayerKind::Base, LayerKind::Grid, LayerKind::Plant];

    /// Whether this layer exists only in the editor and never touches the remote store.
    #[must_use]
    pub fn is_frontend_only(self) -> bool {
        matches!(self, Self::Grid)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Grid => "grid",
            Self::Plant => "plant",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was planted and when it is in the ground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingDetails {
    /// The seed/variety record this planting refers to.
    pub plant_id: i64,
    /// First day the planting exists. Open-ended when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_date: Option<Date>,
    /// First day the planting no longer exists. Open-ended when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_date: Option<Date>,
}

impl PlantingDetails {
    #[must_use]
    pub fn new(plant_id: i64) -> Self {
        Self { plant_id, add_date: None, remove_date: None }
    }

    /// Whether the planting is in the ground on `date`.
    #[must_use]
    pub fn is_active_on(&self, date: Date) -> bool {
        self.add_date.is_none_or(|d| d <= date) && self.remove_date.is_none_or(|d| date < d)
    }
}

fn unit_scale() -> f64 {
    1.0
}

/// Anything placed on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerObject {
    pub id: ObjectId,
    pub layer_kind: LayerKind,
    /// Position in world pixels.
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    /// Present on planted items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planting: Option<PlantingDetails>,
}

impl LayerObject {
    /// An unrotated, unscaled, zero-sized object at `(x, y)`.
    #[must_use]
    pub fn new(id: impl Into<ObjectId>, layer_kind: LayerKind, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            layer_kind,
            x,
            y,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            planting: None,
        }
    }

    /// A planted item with a fresh client-side id.
    #[must_use]
    pub fn planting(plant_id: i64, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            planting: Some(PlantingDetails::new(plant_id)),
            ..Self::new(new_object_id(), LayerKind::Plant, x, y)
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Whether the object should be shown on `date`. Objects without planting
    /// dates are always shown.
    #[must_use]
    pub fn is_visible_on(&self, date: Date) -> bool {
        self.planting.as_ref().is_none_or(|p| p.is_active_on(date))
    }

    /// Merge canonical fields reported by the server into this object.
    ///
    /// Geometry is taken from `canonical`; planting details are only replaced
    /// when the server reports them.
    pub fn absorb(&mut self, canonical: &LayerObject) {
        self.x = canonical.x;
        self.y = canonical.y;
        self.width = canonical.width;
        self.height = canonical.height;
        self.rotation = canonical.rotation;
        self.scale_x = canonical.scale_x;
        self.scale_y = canonical.scale_y;
        if canonical.planting.is_some() {
            self.planting.clone_from(&canonical.planting);
        }
    }
}

/// Sparse update for a layer object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// Replacement planting details. Details cannot be cleared through a patch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting: Option<PlantingDetails>,
}

impl ObjectPatch {
    /// A patch moving an object to `(x, y)`.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    /// The fields that differ between `before` and `after`.
    #[must_use]
    pub fn between(before: &LayerObject, after: &LayerObject) -> Self {
        fn changed(a: f64, b: f64) -> Option<f64> {
            (a.to_bits() != b.to_bits()).then_some(b)
        }
        Self {
            x: changed(before.x, after.x),
            y: changed(before.y, after.y),
            width: changed(before.width, after.width),
            height: changed(before.height, after.height),
            rotation: changed(before.rotation, after.rotation),
            scale_x: changed(before.scale_x, after.scale_x),
            scale_y: changed(before.scale_y, after.scale_y),
            planting: if before.planting == after.planting { None } else { after.planting.clone() },
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether only `x` and/or `y` are present.
    #[must_use]
    pub fn is_position_only(&self) -> bool {
        !self.is_empty()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
            && self.planting.is_none()
    }

    pub fn apply_to(&self, obj: &mut LayerObject) {
        if let Some(x) = self.x {
            obj.x = x;
        }
        if let Some(y) = self.y {
            obj.y = y;
        }
        if let Some(w) = self.width {
            obj.width = w;
        }
        if let Some(h) = self.height {
            obj.height = h;
        }
        if let Some(r) = self.rotation {
            obj.rotation = r;
        }
        if let Some(sx) = self.scale_x {
            obj.scale_x = sx;
        }
        if let Some(sy) = self.scale_y {
            obj.scale_y = sy;
        }
        if let Some(planting) = &self.planting {
            obj.planting = Some(planting.clone());
        }
    }
}

/// Settings of the base layer: which image to show and how to align it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayerSettings {
    /// Path of the background image in the file store.
    pub nextcloud_image_path: String,
    /// Density of the background image, used to match it to real-world size.
    #[serde(rename = "scale")]
    pub pixels_per_meter: f64,
    /// Rotation in degrees that aligns the image with geographic north.
    #[serde(default)]
    pub rotation: f64,
}

impl BaseLayerSettings {
    /// Image path without a leading slash, or `None` when no image is set.
    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        let path = self.nextcloud_image_path.strip_prefix('/').unwrap_or(&self.nextcloud_image_path);
        (!path.is_empty()).then_some(path)
    }

    /// Scale that maps the image onto canvas meters.
    #[must_use]
    pub fn image_scale(&self) -> f64 {
        units::base_layer_scale(self.pixels_per_meter)
    }
}

/// Layer-wide settings, replaced as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerSettings {
    #[default]
    None,
    Base(BaseLayerSettings),
}

impl LayerSettings {
    /// Default settings for a fresh layer of `kind`.
    #[must_use]
    pub fn for_kind(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Base => Self::Base(BaseLayerSettings::default()),
            LayerKind::Grid | LayerKind::Plant => Self::None,
        }
    }

    #[must_use]
    pub fn as_base(&self) -> Option<&BaseLayerSettings> {
        match self {
            Self::Base(settings) => Some(settings),
            Self::None => None,
        }
    }
}

/// An object together with its index in the layer's ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedObject {
    pub index: usize,
    pub object: LayerObject,
}

/// An ordered collection of objects keyed by id, plus layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub kind: LayerKind,
    objects: Vec<LayerObject>,
    pub settings: LayerSettings,
}

impl Layer {
    /// An empty layer with default settings for `kind`.
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        Self { kind, objects: Vec::new(), settings: LayerSettings::for_kind(kind) }
    }

    /// Objects in layer order.
    #[must_use]
    pub fn objects(&self) -> &[LayerObject] {
        &self.objects
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LayerObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Replace each object with a matching id in place, or append it.
    pub fn upsert(&mut self, objects: impl IntoIterator<Item = LayerObject>) {
        for obj in objects {
            match self.index_of(&obj.id) {
                Some(i) => self.objects[i] = obj,
                None => self.objects.push(obj),
            }
        }
    }

    /// Replace objects that already exist, in place. Returns the ids that
    /// were not found.
    pub fn update_existing(&mut self, objects: impl IntoIterator<Item = LayerObject>) -> Vec<ObjectId> {
        let mut missing = Vec::new();
        for obj in objects {
            match self.index_of(&obj.id) {
                Some(i) => self.objects[i] = obj,
                None => missing.push(obj.id),
            }
        }
        missing
    }

    /// Append `obj` unless its id is already taken. Returns whether it was added.
    pub fn insert(&mut self, obj: LayerObject) -> bool {
        if self.contains(&obj.id) {
            return false;
        }
        self.objects.push(obj);
        true
    }

    /// Remove every object whose id is in `ids`.
    ///
    /// Absent ids are ignored. Returns the removed objects with the indices
    /// they had before removal, in ascending order.
    pub fn remove(&mut self, ids: &[ObjectId]) -> Vec<IndexedObject> {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.objects.len());
        for (index, object) in self.objects.drain(..).enumerate() {
            if doomed.contains(object.id.as_str()) {
                removed.push(IndexedObject { index, object });
            } else {
                kept.push(object);
            }
        }
        self.objects = kept;
        removed
    }

    /// Re-insert previously removed objects at their original indices.
    ///
    /// Entries must be in ascending index order, as returned by [`Layer::remove`].
    /// Indices past the end append; ids already present are skipped.
    pub fn restore(&mut self, entries: impl IntoIterator<Item = IndexedObject>) {
        for IndexedObject { index, object } in entries {
            if self.contains(&object.id) {
                continue;
            }
            let at = index.min(self.objects.len());
            self.objects.insert(at, object);
        }
    }
}
