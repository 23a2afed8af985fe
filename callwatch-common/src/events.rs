//! Socket event types for the campaign transcript channel
//!
//! One connection per campaign group carries a heterogeneous stream of
//! JSON messages tagged by a `type` field. The enum below is the closed
//! union of every message the client handles; anything else lands on
//! `Unknown` so new backend event types never break an older client.

use serde::{Deserialize, Serialize};

use crate::records::{GeoPoint, Slot, Speaker, TranscriptLine};
use crate::snapshot::CampaignSnapshot;

/// Campaign socket events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignEvent {
    /// Server-declared campaign phase change
    CampaignStatus {
        status: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        campaign_id: Option<String>,
    },

    /// Provider discovery finished; all candidates at once
    ProvidersFound {
        #[serde(default)]
        campaign_id: Option<String>,
        #[serde(default)]
        origin: Option<GeoPoint>,
        providers: Vec<ProviderSummary>,
    },

    /// Single candidate surfaced incrementally during search
    ProviderFound {
        #[serde(default)]
        provider: Option<FoundProvider>,
        /// Flat fallback key some backends send instead of the nest
        #[serde(default)]
        provider_id: Option<String>,
    },

    /// Dial initiated for a provider
    CallStarted {
        provider_id: String,
        #[serde(default)]
        provider_name: Option<String>,
        #[serde(default)]
        provider_rating: Option<f64>,
        #[serde(default)]
        provider_distance: Option<f64>,
        #[serde(default)]
        photo_url: Option<String>,
        #[serde(default)]
        campaign_id: Option<String>,
    },

    /// Far side answered
    CallConnected {
        provider_id: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },

    /// Generic per-call status push; the string parses leniently
    CallStatus {
        provider_id: String,
        status: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },

    /// Agent invoked a backend tool mid-call (enters negotiation)
    ToolCalled {
        provider_id: String,
        #[serde(default)]
        tool: Option<String>,
    },

    /// Tool finished; a calendar check that found an opening carries
    /// the offered slot
    ToolResult {
        provider_id: String,
        #[serde(default)]
        tool: Option<String>,
        #[serde(default)]
        result: Option<ToolOutcome>,
    },

    /// Live transcript delta
    TranscriptChunk {
        provider_id: String,
        speaker: Speaker,
        text: String,
    },

    /// Tentative slot proposed during negotiation
    SlotOffered {
        provider_id: String,
        date: String,
        time: String,
    },

    /// Appointment confirmed (terminal: booked)
    BookingConfirmed {
        provider_id: String,
        date: String,
        time: String,
        #[serde(default)]
        service_type: Option<String>,
    },

    /// Provider had nothing available (terminal)
    NoAvailability {
        provider_id: String,
        #[serde(default)]
        reason: Option<String>,
    },

    /// Call wound down; may carry a final transcript flush
    CallEnded {
        provider_id: String,
        #[serde(default)]
        transcript: Option<Vec<TranscriptLine>>,
    },

    /// Full transcript delivered out of band
    TranscriptLoaded {
        provider_id: String,
        transcript: Vec<TranscriptLine>,
    },

    /// Call could not be placed or errored out (terminal)
    CallFailed {
        provider_id: String,
        #[serde(default)]
        error: Option<String>,
    },

    /// Call resolved with a wire status and a scored outcome
    CallCompleted {
        provider_id: String,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        result: Option<CallOutcome>,
    },

    /// Provider never dialed (terminal)
    CallSkipped {
        provider_id: String,
        #[serde(default)]
        reason: Option<String>,
    },

    /// Campaign finished; carries final per-provider results
    CampaignComplete {
        #[serde(default)]
        campaign_id: Option<String>,
        #[serde(default)]
        results: Vec<ResultEntry>,
        #[serde(default)]
        best_match: Option<ResultEntry>,
    },

    /// Group finished without per-provider results
    GroupComplete {
        #[serde(default)]
        group_id: Option<String>,
    },

    /// Campaign aborted server-side
    CampaignError {
        #[serde(default)]
        error: Option<String>,
    },

    /// Full aggregate pushed over the socket; reconciled like a
    /// REST snapshot
    CampaignUpdate { campaign: CampaignSnapshot },

    /// Forward compatibility: unrecognized `type` values are ignored
    #[serde(other)]
    Unknown,
}

/// Provider descriptive fields from discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Nested provider payload on incremental discovery. Field names
/// differ from the bulk `ProviderSummary` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundProvider {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Payload of a finished tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub slot: Option<Slot>,
}

/// Scored outcome carried by `call_completed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome {
    #[serde(default)]
    pub score: Option<f64>,
}

/// Per-provider entry in campaign results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEntry {
    pub provider_id: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    /// Wire status string, parsed leniently via `CallStatus::from_wire`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub offered_slot: Option<Slot>,
}

impl CampaignEvent {
    /// Get event type as string for filtering and logging
    pub fn event_type(&self) -> &str {
        match self {
            CampaignEvent::CampaignStatus { .. } => "campaign_status",
            CampaignEvent::ProvidersFound { .. } => "providers_found",
            CampaignEvent::ProviderFound { .. } => "provider_found",
            CampaignEvent::CallStarted { .. } => "call_started",
            CampaignEvent::CallConnected { .. } => "call_connected",
            CampaignEvent::CallStatus { .. } => "call_status",
            CampaignEvent::ToolCalled { .. } => "tool_called",
            CampaignEvent::ToolResult { .. } => "tool_result",
            CampaignEvent::TranscriptChunk { .. } => "transcript_chunk",
            CampaignEvent::SlotOffered { .. } => "slot_offered",
            CampaignEvent::BookingConfirmed { .. } => "booking_confirmed",
            CampaignEvent::NoAvailability { .. } => "no_availability",
            CampaignEvent::CallEnded { .. } => "call_ended",
            CampaignEvent::TranscriptLoaded { .. } => "transcript_loaded",
            CampaignEvent::CallFailed { .. } => "call_failed",
            CampaignEvent::CallCompleted { .. } => "call_completed",
            CampaignEvent::CallSkipped { .. } => "call_skipped",
            CampaignEvent::CampaignComplete { .. } => "campaign_complete",
            CampaignEvent::GroupComplete { .. } => "group_complete",
            CampaignEvent::CampaignError { .. } => "campaign_error",
            CampaignEvent::CampaignUpdate { .. } => "campaign_update",
            CampaignEvent::Unknown => "unknown",
        }
    }

    /// True for events that change a record or campaign status, as
    /// opposed to transcript appends. Within one logical tick status
    /// changes apply first so rendering reflects the freshest status
    /// with the transcript catching up after.
    pub fn is_status_change(&self) -> bool {
        !matches!(
            self,
            CampaignEvent::TranscriptChunk { .. }
                | CampaignEvent::TranscriptLoaded { .. }
                | CampaignEvent::Unknown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CallStatus;

    #[test]
    fn test_call_started_round_trip() {
        let json = r#"{
            "type": "call_started",
            "provider_id": "p-77",
            "provider_name": "Harbor Dental",
            "provider_rating": 4.6,
            "provider_distance": 2.3,
            "campaign_id": "c-1"
        }"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), "call_started");
        match event {
            CampaignEvent::CallStarted {
                provider_id,
                provider_name,
                provider_rating,
                ..
            } => {
                assert_eq!(provider_id, "p-77");
                assert_eq!(provider_name.as_deref(), Some("Harbor Dental"));
                assert_eq!(provider_rating, Some(4.6));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_deserializes_to_unknown() {
        let json = r#"{"type":"future_unknown_event","payload":{"x":1}}"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, CampaignEvent::Unknown));
        assert_eq!(event.event_type(), "unknown");
    }

    #[test]
    fn test_missing_provider_id_is_a_parse_error() {
        let json = r#"{"type":"call_connected","conversation_id":"conv-9"}"#;
        assert!(serde_json::from_str::<CampaignEvent>(json).is_err());
    }

    #[test]
    fn test_providers_found_payload() {
        let json = r#"{
            "type": "providers_found",
            "campaign_id": "c-1",
            "origin": {"lat": 42.36, "lng": -71.06},
            "providers": [
                {"provider_id": "p-1", "name": "A", "rating": 4.9, "distance_miles": 1.1,
                 "lat": 42.37, "lng": -71.05},
                {"provider_id": "p-2", "name": "B"}
            ]
        }"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        match event {
            CampaignEvent::ProvidersFound {
                origin, providers, ..
            } => {
                assert_eq!(origin.unwrap().lat, 42.36);
                assert_eq!(providers.len(), 2);
                assert_eq!(providers[1].rating, None);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_result_entry_status_parses_leniently() {
        let entry: ResultEntry = serde_json::from_str(
            r#"{"provider_id":"p-1","status":"timeout","score":0.4}"#,
        )
        .unwrap();
        assert_eq!(
            entry.status.as_deref().and_then(CallStatus::from_wire),
            Some(CallStatus::Disconnected)
        );
    }

    #[test]
    fn test_call_status_payload() {
        let json = r#"{"type":"call_status","provider_id":"p-3","status":"dialing",
                       "conversation_id":"conv-7"}"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        match event {
            CampaignEvent::CallStatus {
                provider_id,
                status,
                conversation_id,
            } => {
                assert_eq!(provider_id, "p-3");
                assert_eq!(CallStatus::from_wire(&status), Some(CallStatus::Ringing));
                assert_eq!(conversation_id.as_deref(), Some("conv-7"));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_call_completed_carries_nested_score() {
        let json = r#"{"type":"call_completed","provider_id":"p-3","status":"booked",
                       "result":{"score":0.87,"slot_count":1}}"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        match event {
            CampaignEvent::CallCompleted { status, result, .. } => {
                assert_eq!(status.as_deref(), Some("booked"));
                assert_eq!(result.unwrap().score, Some(0.87));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_provider_found_nested_payload() {
        let json = r#"{"type":"provider_found",
                       "provider":{"id":"p-8","name":"Bayside","rating":4.1,"distance":0.8}}"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        match event {
            CampaignEvent::ProviderFound { provider, .. } => {
                let p = provider.unwrap();
                assert_eq!(p.id.as_deref(), Some("p-8"));
                assert_eq!(p.distance, Some(0.8));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_tool_result_calendar_slot() {
        let json = r#"{"type":"tool_result","provider_id":"p-2","tool":"check_calendar",
                       "result":{"available":true,"slot":{"date":"2025-03-04","time":"14:00"}}}"#;
        let event: CampaignEvent = serde_json::from_str(json).unwrap();
        match event {
            CampaignEvent::ToolResult { tool, result, .. } => {
                assert_eq!(tool.as_deref(), Some("check_calendar"));
                let outcome = result.unwrap();
                assert_eq!(outcome.available, Some(true));
                assert_eq!(outcome.slot.unwrap().time, "14:00");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_status_change_classification() {
        let chunk: CampaignEvent = serde_json::from_str(
            r#"{"type":"transcript_chunk","provider_id":"p","speaker":"agent","text":"hi"}"#,
        )
        .unwrap();
        assert!(!chunk.is_status_change());

        let booked: CampaignEvent = serde_json::from_str(
            r#"{"type":"booking_confirmed","provider_id":"p","date":"2025-03-01","time":"10:00"}"#,
        )
        .unwrap();
        assert!(booked.is_status_change());
    }
}
