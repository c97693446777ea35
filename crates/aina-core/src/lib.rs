//! AINA Core - Types shared by the model viewer crates
//!
//! This crate provides the small vocabulary used across loading, rendering
//! and the viewer state machine:
//! - Part identifiers and display info
//! - The per-part visibility map and its reconciliation policy
//! - Render modes and colors

pub mod types;
pub mod visibility;

pub use types::{Color, PartId, PartInfo, RenderMode};
pub use visibility::VisibilityMap;
