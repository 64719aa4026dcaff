//! Editing state core for layered garden and field plans.
//!
//! A plan is a stack of layers (base aerial image, measurement grid, planted
//! objects) on an infinite canvas. This crate owns everything between the
//! renderer and the remote store: the undo-tracked document, the ephemeral UI
//! state, the dispatch protocol that turns gestures into reversible actions,
//! optimistic reconciliation with the server, and the meter/pixel transforms.
//! The host is responsible only for drawing [`render::Scene`] snapshots,
//! forwarding gestures, and pumping [`sync::SyncRequest`]s through a
//! [`remote::RemoteStore`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Session context tying store, sync bridge and selection together |
//! | [`store`] | Single mutation gateway with undo/redo |
//! | [`action`] | Reversible actions and inverse planning |
//! | [`history`] | Bounded past/future stacks |
//! | [`state`] | Tracked (undoable) and untracked (ephemeral) state |
//! | [`layers`] | Layer containers and layer objects |
//! | [`sync`] | Optimistic sync state machine with per-object sequencing |
//! | [`remote`] | Remote store seam and the tokio request driver |
//! | [`hydrate`] | Load-time hydration with per-layer failure isolation |
//! | [`selection`] | Transformer attachment and gesture ownership |
//! | [`input`] | Tools, modifiers and gesture events |
//! | [`broadcast`] | Collaborator broadcasts |
//! | [`camera`] | Points, bounds and the stage transform |
//! | [`units`] | Meter/pixel conversions |
//! | [`grid`] | Adaptive grid and yardstick geometry |
//! | [`render`] | Scene snapshot consumed by the renderer |
//! | [`config`] | Environment-driven configuration |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | Tracing subscriber bootstrap |
//! | [`consts`] | Shared numeric constants |

pub mod action;
pub mod broadcast;
pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod hydrate;
pub mod input;
pub mod layers;
pub mod logging;
pub mod remote;
pub mod render;
pub mod selection;
pub mod state;
pub mod store;
pub mod sync;
pub mod units;
