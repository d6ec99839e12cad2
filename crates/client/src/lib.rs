//! Client side of the lineage canvas editor.
//!
//! [`api::DlvApi`] talks to the dashboard service over HTTP,
//! [`sync::CanvasSynchronizer`] keeps a [`dlv_core::canvas::Canvas`] in step
//! with a stored dashboard, and [`resources::ResourcePanel`] loads the
//! tables or DAGs behind the selected node.

pub mod api;
pub mod config;
pub mod resources;
pub mod sync;
