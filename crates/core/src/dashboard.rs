//! Dashboard documents and their request payloads.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::layout::Layout;
use crate::types::{DbId, Timestamp};

/// Maximum dashboard name length.
pub const MAX_NAME_LEN: usize = 255;

/// Version assigned to a freshly created dashboard.
pub const INITIAL_VERSION: i64 = 1;

fn initial_version() -> i64 {
    INITIAL_VERSION
}

/// A dashboard as stored by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub owner_id: DbId,
    /// `None` for dashboards that were never given a layout, or whose
    /// stored layout is not an object.
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub layout: Option<Layout>,
    /// Bumped by every successful update; used for optimistic concurrency.
    #[serde(default = "initial_version")]
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDashboard {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Defaults to [`Layout::empty`] when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub is_public: bool,
}

impl CreateDashboard {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name(&self.name)
    }
}

/// DTO for partially updating a dashboard. Every present field replaces the
/// stored value wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// When set, the update is rejected unless the stored version matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
}

impl UpdateDashboard {
    /// A layout-only replace guarded by `expected_version`.
    pub fn layout(layout: Layout, expected_version: Option<i64>) -> Self {
        Self {
            layout: Some(layout),
            expected_version,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }
}

/// Check that a dashboard name is between 1 and [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Dashboard name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Reject an update whose base version is stale.
pub fn check_version(id: &str, stored: i64, expected: Option<i64>) -> Result<(), CoreError> {
    match expected {
        Some(expected) if expected != stored => Err(CoreError::VersionConflict {
            entity: "Dashboard",
            id: id.to_string(),
            current: stored,
            expected,
        }),
        _ => Ok(()),
    }
}
