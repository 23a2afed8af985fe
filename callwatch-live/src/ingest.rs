//! Socket frame normalization
//!
//! Raw text frames become typed `CampaignEvent`s here. Malformed and
//! unrecognized frames are logged and dropped; nothing in this layer
//! mutates state and no error escapes the event-processing boundary.

use tracing::{debug, warn};

use callwatch_common::events::CampaignEvent;

/// Decode one raw frame. `None` means the frame was dropped (logged).
pub fn decode_frame(raw: &str) -> Option<CampaignEvent> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "dropping undecodable frame");
            return None;
        }
    };

    let Some(kind) = value.get("type").and_then(|t| t.as_str()).map(str::to_owned) else {
        warn!("dropping frame without type discriminator");
        return None;
    };

    match serde_json::from_value::<CampaignEvent>(value) {
        Ok(CampaignEvent::Unknown) => {
            debug!(event_type = %kind, "ignoring unrecognized event type");
            None
        }
        Ok(event) => Some(event),
        Err(e) => {
            warn!(event_type = %kind, error = %e, "dropping malformed event");
            None
        }
    }
}
