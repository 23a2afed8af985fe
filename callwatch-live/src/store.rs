//! Shared campaign store
//!
//! Thin mutable adapter around the pure projector. The reducer is the
//! only writer; every mutation goes through `apply`/`reconcile`, which
//! keeps the projection reproducible from a recorded event log. Each
//! write publishes a freshly derived view for renderers.

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use callwatch_common::events::CampaignEvent;
use callwatch_common::snapshot::CampaignSnapshot;

use crate::projector::view::CampaignView;
use crate::projector::CampaignProjection;

/// Shared state for one campaign group, accessible by all components
pub struct CampaignStore {
    projection: RwLock<CampaignProjection>,

    /// View broadcaster for renderers
    view_tx: broadcast::Sender<CampaignView>,
}

impl CampaignStore {
    pub fn new(group_id: impl Into<String>) -> Self {
        let (view_tx, _) = broadcast::channel(64);
        Self {
            projection: RwLock::new(CampaignProjection::new(group_id)),
            view_tx,
        }
    }

    /// Apply one event, stamped with its arrival time here at the
    /// mutation edge, and publish the recomputed view.
    pub async fn apply(&self, event: CampaignEvent) {
        let now = Utc::now();
        let mut projection = self.projection.write().await;
        projection.apply_at(event, now);
        self.publish(&projection);
    }

    /// Apply a same-tick batch (status changes before transcript
    /// appends) and publish once.
    pub async fn apply_batch(&self, events: Vec<CampaignEvent>) {
        let now = Utc::now();
        let mut projection = self.projection.write().await;
        projection.apply_batch_at(events, now);
        self.publish(&projection);
    }

    /// Union a snapshot into the projection and publish.
    pub async fn reconcile(&self, snapshot: &CampaignSnapshot) {
        let mut projection = self.projection.write().await;
        crate::projector::reconcile::reconcile(&mut projection, snapshot);
        self.publish(&projection);
    }

    /// Mark the campaign cancelled (cancel confirmation timeout).
    pub async fn mark_cancelled(&self) {
        let mut projection = self.projection.write().await;
        projection.mark_cancelled();
        self.publish(&projection);
    }

    /// Republish the current view without touching state. Drives the
    /// render cadence for elapsed-call-time display.
    pub async fn touch(&self) {
        let projection = self.projection.read().await;
        self.publish(&projection);
    }

    /// Derive the current view on demand.
    pub async fn view(&self) -> CampaignView {
        self.projection.read().await.view()
    }

    /// Subscribe to view updates for rendering.
    pub fn subscribe(&self) -> broadcast::Receiver<CampaignView> {
        self.view_tx.subscribe()
    }

    fn publish(&self, projection: &CampaignProjection) {
        // Ignore send errors (no receivers is OK)
        let _ = self.view_tx.send(projection.view());
    }
}
