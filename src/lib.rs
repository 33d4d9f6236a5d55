//! ZIP referral routing
//!
//! Resolves a 5-digit ZIP to the location that serves it and applies ZIP
//! assignment edits from the map editor back to the location store.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reconciler;
pub mod resolver;
pub mod store;
pub mod zip_tokens;

pub use error::{StoreError, ZipRouteError};
pub use models::{LocationRecord, Resolution, ZipAssignmentProposal};
pub use reconciler::{reconcile, ReconcileReport};
pub use resolver::ZipIndex;
pub use store::{LocationStore, MemoryStore};
