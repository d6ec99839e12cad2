//! Keeps an editable [`Canvas`] in step with one stored dashboard.
//!
//! Loading replaces the canvas with the dashboard's normalized layout.
//! Saving sends the whole layout back as a single replace, guarded by the
//! version observed at load time, and then reloads.

use std::sync::Arc;

use dlv_core::canvas::Canvas;
use dlv_core::dashboard::{Dashboard, UpdateDashboard};
use dlv_core::error::CoreError;
use dlv_core::layout::Layout;
use dlv_core::store::{DashboardStore, StoreError};

/// Message shown when a dashboard cannot be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load dashboard";

/// Message shown when a save fails without a server-provided reason.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save dashboard";

/// Errors from loading or saving a dashboard.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No dashboard is bound")]
    Unbound,

    /// The bound dashboard has not been loaded, so there is no version to
    /// guard a write with.
    #[error("Dashboard {0} has not been loaded")]
    NotLoaded(String),

    #[error("Failed to load dashboard: {0}")]
    Load(#[source] StoreError),

    #[error("Failed to save dashboard: {0}")]
    Save(#[source] StoreError),

    /// The write went through but the follow-up fetch failed.
    #[error("Dashboard saved but could not be reloaded: {0}")]
    Reload(#[source] StoreError),
}

impl SyncError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Unbound => "No dashboard selected".to_string(),
            SyncError::NotLoaded(_) => "Dashboard must be loaded before saving".to_string(),
            SyncError::Load(_) | SyncError::Reload(_) => LOAD_FAILED_MESSAGE.to_string(),
            SyncError::Save(StoreError::Core(conflict @ CoreError::VersionConflict { .. })) => {
                conflict.to_string()
            }
            SyncError::Save(StoreError::Core(
                CoreError::Validation(msg) | CoreError::Conflict(msg) | CoreError::Forbidden(msg),
            )) => msg.clone(),
            SyncError::Save(_) => SAVE_FAILED_MESSAGE.to_string(),
        }
    }

    /// The save was rejected because the dashboard changed since it was loaded.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Save(e) if e.is_conflict())
    }
}

/// Editing session over a single dashboard.
pub struct CanvasSynchronizer<S: ?Sized> {
    store: Arc<S>,
    dashboard_id: Option<String>,
    canvas: Canvas,
    dashboard: Option<Dashboard>,
    /// Layout as last loaded or saved; the baseline for [`Self::is_dirty`].
    saved: Layout,
    last_error: Option<String>,
}

impl<S: DashboardStore + ?Sized> CanvasSynchronizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            dashboard_id: None,
            canvas: Canvas::empty(),
            dashboard: None,
            saved: Layout::empty(),
            last_error: None,
        }
    }

    /// Point the session at a dashboard, or at none.
    ///
    /// Binding `None` clears the canvas. Binding an id does not fetch;
    /// call [`Self::load`] afterwards.
    pub fn bind(&mut self, dashboard_id: Option<&str>) {
        match dashboard_id {
            None => {
                self.dashboard_id = None;
                self.reset();
            }
            Some(id) => {
                if self.dashboard_id.as_deref() != Some(id) {
                    self.dashboard = None;
                }
                self.dashboard_id = Some(id.to_string());
            }
        }
        self.last_error = None;
    }

    /// Fetch the bound dashboard and replace the canvas with its layout.
    ///
    /// On failure the canvas is left as it was.
    pub async fn load(&mut self) -> Result<(), SyncError> {
        let id = self.dashboard_id.clone().ok_or(SyncError::Unbound)?;

        match self.store.get_dashboard(&id).await {
            Ok(dashboard) => {
                self.apply(dashboard);
                tracing::debug!(
                    dashboard_id = %id,
                    nodes = self.canvas.nodes().len(),
                    edges = self.canvas.edges().len(),
                    "Dashboard loaded",
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(dashboard_id = %id, error = %e, "Failed to load dashboard");
                Err(self.fail(SyncError::Load(e)))
            }
        }
    }

    /// Replace the stored layout with the canvas and reload.
    ///
    /// The write carries the version seen at load time, so a dashboard
    /// changed elsewhere in the meantime yields a conflict. Saving before the
    /// bound dashboard has loaded fails with [`SyncError::NotLoaded`] and
    /// sends nothing. On failure the canvas keeps its unsaved edits.
    pub async fn save(&mut self) -> Result<(), SyncError> {
        let id = self.dashboard_id.clone().ok_or(SyncError::Unbound)?;

        let expected_version = match &self.dashboard {
            Some(dashboard) if dashboard.id == id => dashboard.version,
            _ => {
                tracing::warn!(dashboard_id = %id, "Save requested before dashboard was loaded");
                return Err(self.fail(SyncError::NotLoaded(id)));
            }
        };

        let layout = self.canvas.to_layout();
        warn_orphans(&id, &layout);
        let update = UpdateDashboard::layout(layout, Some(expected_version));

        let written = match self.store.update_dashboard(&id, &update).await {
            Ok(dashboard) => dashboard,
            Err(e) => {
                tracing::error!(
                    dashboard_id = %id,
                    expected_version,
                    error = %e,
                    "Failed to save dashboard",
                );
                return Err(self.fail(SyncError::Save(e)));
            }
        };
        tracing::info!(dashboard_id = %id, version = written.version, "Dashboard saved");
        self.dashboard = Some(written);
        self.saved = self.canvas.to_layout();

        match self.store.get_dashboard(&id).await {
            Ok(dashboard) => {
                self.apply(dashboard);
                Ok(())
            }
            Err(e) => {
                tracing::error!(dashboard_id = %id, error = %e, "Failed to reload saved dashboard");
                Err(self.fail(SyncError::Reload(e)))
            }
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// The dashboard as last loaded or saved.
    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_id(&self) -> Option<&str> {
        self.dashboard_id.as_deref()
    }

    /// User-visible message of the last failed load or save.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the canvas differs from the last loaded or saved layout.
    pub fn is_dirty(&self) -> bool {
        self.canvas.to_layout() != self.saved
    }

    // ---- private helpers ----

    fn apply(&mut self, dashboard: Dashboard) {
        let layout = dashboard.layout.clone().unwrap_or_else(Layout::empty);

        warn_orphans(&dashboard.id, &layout);
        let dupes = layout.duplicate_node_ids();
        if !dupes.is_empty() {
            tracing::warn!(dashboard_id = %dashboard.id, nodes = ?dupes, "Layout has duplicate node ids");
        }

        self.canvas = Canvas::from_layout(layout.clone());
        self.saved = layout;
        self.dashboard = Some(dashboard);
        self.last_error = None;
    }

    fn reset(&mut self) {
        self.canvas = Canvas::empty();
        self.saved = Layout::empty();
        self.dashboard = None;
    }

    fn fail(&mut self, err: SyncError) -> SyncError {
        self.last_error = Some(err.user_message());
        err
    }
}

fn warn_orphans(dashboard_id: &str, layout: &Layout) {
    let orphans = layout.orphan_edges();
    if !orphans.is_empty() {
        let ids: Vec<&str> = orphans.iter().map(|e| e.id.as_str()).collect();
        tracing::warn!(
            dashboard_id = %dashboard_id,
            edges = ?ids,
            "Layout has edges pointing at missing nodes",
        );
    }
}
