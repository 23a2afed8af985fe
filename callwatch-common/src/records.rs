//! Call and campaign domain types
//!
//! One `CallRecord` exists per provider contacted in a campaign. Records
//! are created lazily by whichever event mentions a provider first and
//! are never deleted within a campaign's lifetime, only mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a single provider call.
///
/// Statuses only move forward (see `phase_rank`); once a terminal status
/// is reached no further lifecycle transition occurs for that call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Provider known but not yet dialed
    Queued,
    /// Dial initiated
    Ringing,
    /// Far side answered
    Connected,
    /// Agent is invoking backend tools mid-call (calendar checks etc.)
    Negotiating,
    /// Appointment confirmed
    Booked,
    /// Provider had no matching availability
    NoAvailability,
    /// Call could not be placed or errored out
    Failed,
    /// Never dialed (e.g. no phone number on file)
    Skipped,
    /// Call wound down without a clear outcome
    Completed,
    /// Call dropped or cut off by operator command or timeout
    Disconnected,
}

impl CallStatus {
    /// True once the call can take no further lifecycle transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallStatus::Booked
                | CallStatus::NoAvailability
                | CallStatus::Failed
                | CallStatus::Skipped
                | CallStatus::Completed
                | CallStatus::Disconnected
        )
    }

    /// True while a call is in flight (counts toward `active`).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            CallStatus::Ringing | CallStatus::Connected | CallStatus::Negotiating
        )
    }

    /// Position in the forward-only lifecycle. All terminal statuses
    /// share the highest rank; a transition is only accepted when it
    /// raises the rank (negotiating -> connected being the one
    /// permitted backward edge).
    pub fn phase_rank(self) -> u8 {
        match self {
            CallStatus::Queued => 0,
            CallStatus::Ringing => 1,
            CallStatus::Connected => 2,
            CallStatus::Negotiating => 3,
            _ => 4,
        }
    }

    /// Sort key for deterministic rendering: bookings first, then
    /// in-flight calls by progress, then the remaining outcomes.
    pub fn display_priority(self) -> u8 {
        match self {
            CallStatus::Booked => 0,
            CallStatus::Negotiating => 1,
            CallStatus::Connected => 2,
            CallStatus::Ringing => 3,
            CallStatus::Queued => 4,
            CallStatus::NoAvailability => 5,
            CallStatus::Completed => 6,
            CallStatus::Disconnected => 7,
            CallStatus::Skipped => 8,
            CallStatus::Failed => 9,
        }
    }

    /// Lenient parse of backend status strings. Accepts the wire names
    /// plus legacy spellings still emitted by older orchestrator
    /// revisions ("found", "dialing", "timeout").
    pub fn from_wire(s: &str) -> Option<CallStatus> {
        match s {
            "queued" | "found" => Some(CallStatus::Queued),
            "ringing" | "dialing" => Some(CallStatus::Ringing),
            "connected" => Some(CallStatus::Connected),
            "negotiating" => Some(CallStatus::Negotiating),
            "booked" => Some(CallStatus::Booked),
            "no_availability" => Some(CallStatus::NoAvailability),
            "failed" => Some(CallStatus::Failed),
            "skipped" => Some(CallStatus::Skipped),
            "completed" => Some(CallStatus::Completed),
            "disconnected" | "timeout" => Some(CallStatus::Disconnected),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::Connected => "connected",
            CallStatus::Negotiating => "negotiating",
            CallStatus::Booked => "booked",
            CallStatus::NoAvailability => "no_availability",
            CallStatus::Failed => "failed",
            CallStatus::Skipped => "skipped",
            CallStatus::Completed => "completed",
            CallStatus::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

/// Campaign-level phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    Idle,
    Searching,
    Calling,
    Completed,
    Cancelled,
    Error,
}

impl CampaignPhase {
    /// True once the campaign can make no further progress.
    pub fn is_over(self) -> bool {
        matches!(
            self,
            CampaignPhase::Completed | CampaignPhase::Cancelled | CampaignPhase::Error
        )
    }

    /// Ordering used to reject phase regressions from stale snapshots.
    pub fn phase_rank(self) -> u8 {
        match self {
            CampaignPhase::Idle => 0,
            CampaignPhase::Searching => 1,
            CampaignPhase::Calling => 2,
            _ => 3,
        }
    }

    /// Lenient parse of server phase strings. Unknown strings yield
    /// `None` and leave the current phase untouched.
    pub fn from_wire(s: &str) -> Option<CampaignPhase> {
        match s {
            "idle" => Some(CampaignPhase::Idle),
            "searching" => Some(CampaignPhase::Searching),
            "calling" => Some(CampaignPhase::Calling),
            "completed" | "complete" | "no_providers" => Some(CampaignPhase::Completed),
            "cancelled" => Some(CampaignPhase::Cancelled),
            "error" | "failed" => Some(CampaignPhase::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CampaignPhase::Idle => "idle",
            CampaignPhase::Searching => "searching",
            CampaignPhase::Calling => "calling",
            CampaignPhase::Completed => "completed",
            CampaignPhase::Cancelled => "cancelled",
            CampaignPhase::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The calling assistant
    Agent,
    /// The provider's side of the call
    Counterparty,
}

/// Transcript line stamp: either an offset into the call (seconds) or
/// an absolute timestamp string, depending on orchestrator revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Stamp {
    Offset(f64),
    Timestamp(String),
}

/// One line of call transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default, alias = "offset", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Stamp>,
}

/// A proposed or confirmed appointment date/time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub date: String,
    pub time: String,
}

/// Geographic anchor for map rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// State of one provider call within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    /// Stable key, unique within a campaign
    pub provider_id: String,
    /// Provider display name (empty until a descriptive event arrives)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub status: CallStatus,
    /// Append-only; insertion order is significant
    #[serde(default)]
    pub transcript: Vec<TranscriptLine>,
    #[serde(default)]
    pub offered_slot: Option<Slot>,
    /// Relative ranking strength 0..1, may update multiple times
    #[serde(default)]
    pub score: Option<f64>,
    /// Explanation for terminal negative statuses
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Weak back-reference to the owning campaign, lookup only
    #[serde(default)]
    pub campaign_id: Option<String>,
}

impl CallRecord {
    /// New record in the initial state with descriptive fields empty.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            name: String::new(),
            rating: None,
            distance_miles: None,
            photo_url: None,
            location: None,
            status: CallStatus::Queued,
            transcript: Vec::new(),
            offered_slot: None,
            score: None,
            reason: None,
            conversation_id: None,
            started_at: None,
            campaign_id: None,
        }
    }
}
