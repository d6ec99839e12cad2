//! Domain model of the data lineage dashboard editor.
//!
//! Holds the layout document types and their normalization rules, the
//! in-memory canvas with its editing operations, the node catalog types,
//! and the [`store::DashboardStore`] seam with an in-memory implementation.
//! This crate has no HTTP dependencies so both the client and the reference
//! server build on it.

pub mod canvas;
pub mod catalog;
pub mod dashboard;
pub mod edge;
pub mod error;
pub mod layout;
pub mod lenient;
pub mod node;
pub mod store;
pub mod types;
