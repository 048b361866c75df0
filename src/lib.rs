//! # resizeq
//!
//! Core of a batch image resizer: a bounded pool of external convert
//! processes fed from an ordered work queue by a single dispatch loop.
//!
//! The dispatcher owns everything: the item store, the worker slots,
//! and the slot-to-item assignment map. It emits structured events so a
//! presentation layer can observe without touching state.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod model;
pub mod slot;
pub mod store;
pub mod telemetry;
pub mod template;
