//! REST snapshot shapes
//!
//! `GET /campaign/{group_id}` returns the full aggregate for a campaign
//! group. The same shape also arrives over the socket as a
//! `campaign_update` frame. Push delivery carries no gap-detection
//! sequence number, so the snapshot is the reconnect safety net: the
//! client unions it into local state rather than replaying anything.

use serde::{Deserialize, Serialize};

use crate::events::{ProviderSummary, ResultEntry};
use crate::records::{GeoPoint, Slot, TranscriptLine};

/// Full campaign aggregate as served by the orchestrator.
///
/// Every field is optional or defaulted; older orchestrator revisions
/// omit several of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Wire phase string, parsed leniently via `CampaignPhase::from_wire`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub origin: Option<GeoPoint>,
    #[serde(default)]
    pub origin_lat: Option<f64>,
    #[serde(default)]
    pub origin_lng: Option<f64>,
    #[serde(default)]
    pub providers: Vec<ProviderSummary>,
    #[serde(default)]
    pub calls: Vec<SnapshotCall>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub best_match: Option<ResultEntry>,
}

impl CampaignSnapshot {
    /// Geographic anchor, whichever encoding the server used.
    pub fn origin_point(&self) -> Option<GeoPoint> {
        self.origin.or(match (self.origin_lat, self.origin_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        })
    }
}

/// Per-provider call state within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCall {
    pub provider_id: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    /// Wire status string, parsed leniently via `CallStatus::from_wire`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub offered_slot: Option<Slot>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transcript: Option<Vec<TranscriptLine>>,
}
