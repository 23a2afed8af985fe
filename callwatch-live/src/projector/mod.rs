//! Live campaign projector
//!
//! A pure reducer: previous state + event -> next state. Each incoming
//! event is processed to completion before the next, so the per-provider
//! state machine never observes partial updates. The mutable singleton
//! lives in `store`; nothing here touches the network or a clock.
//! Arrival times come in through `apply_at`, so replaying a recorded
//! event log with its recorded times reproduces identical state.

pub mod reconcile;
pub(crate) mod record;
pub mod view;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use callwatch_common::events::{CampaignEvent, ProviderSummary, ResultEntry};
use callwatch_common::records::{
    CallRecord, CallStatus, CampaignPhase, GeoPoint, Stamp, TranscriptLine,
};

use view::CampaignView;

/// Projection of one campaign group's live state.
///
/// Records are kept in arrival order; deterministic display ordering is
/// derived in the view, never stored.
#[derive(Debug, Clone)]
pub struct CampaignProjection {
    pub group_id: String,
    pub phase: CampaignPhase,
    /// Last human-readable status line from the server
    pub message: Option<String>,
    pub origin: Option<GeoPoint>,
    pub records: Vec<CallRecord>,
}

impl CampaignProjection {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            phase: CampaignPhase::Idle,
            message: None,
            origin: None,
            records: Vec::new(),
        }
    }

    /// Look up a record by provider id.
    pub fn record(&self, provider_id: &str) -> Option<&CallRecord> {
        self.records.iter().find(|r| r.provider_id == provider_id)
    }

    /// Look up or lazily create the record for a provider. Records are
    /// created by whichever event mentions the provider first and never
    /// deleted for the lifetime of the campaign. Events carrying an
    /// empty provider key are refused.
    fn ensure(&mut self, provider_id: &str) -> Option<&mut CallRecord> {
        if provider_id.is_empty() {
            warn!("dropping event with empty provider id");
            return None;
        }
        if let Some(idx) = self
            .records
            .iter()
            .position(|r| r.provider_id == provider_id)
        {
            return self.records.get_mut(idx);
        }
        debug!(%provider_id, "creating call record on first reference");
        self.records.push(CallRecord::new(provider_id));
        self.records.last_mut()
    }

    /// Apply one event stamped with the current wall clock. Live
    /// convenience over `apply_at`.
    pub fn apply(&mut self, event: CampaignEvent) {
        self.apply_at(event, Utc::now());
    }

    /// Apply one normalized event at arrival instant `now`. Total:
    /// every event maps to a defined (possibly empty) state change,
    /// never a panic or error. Deterministic in its arguments.
    pub fn apply_at(&mut self, event: CampaignEvent, now: DateTime<Utc>) {
        match event {
            CampaignEvent::CampaignStatus {
                status, message, ..
            } => {
                match CampaignPhase::from_wire(&status) {
                    // The server owns phase declarations during a live
                    // session; only the terminal "completed" derivation
                    // is computed locally (in the view).
                    Some(phase) => self.phase = phase,
                    None => debug!(%status, "keeping phase, unknown server phase string"),
                }
                if message.is_some() {
                    self.message = message;
                }
            }

            CampaignEvent::ProvidersFound {
                origin, providers, ..
            } => {
                if origin.is_some() {
                    self.origin = origin;
                }
                for provider in providers {
                    self.absorb_provider(&provider);
                }
            }

            CampaignEvent::ProviderFound {
                provider,
                provider_id,
            } => {
                let summary = ProviderSummary {
                    provider_id: provider
                        .as_ref()
                        .and_then(|p| p.id.clone())
                        .or(provider_id)
                        .unwrap_or_default(),
                    name: provider.as_ref().and_then(|p| p.name.clone()),
                    rating: provider.as_ref().and_then(|p| p.rating),
                    distance_miles: provider.as_ref().and_then(|p| p.distance),
                    photo_url: None,
                    lat: provider.as_ref().and_then(|p| p.lat),
                    lng: provider.as_ref().and_then(|p| p.lng),
                };
                self.absorb_provider(&summary);
            }

            CampaignEvent::CallStarted {
                provider_id,
                provider_name,
                provider_rating,
                provider_distance,
                photo_url,
                campaign_id,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if let Some(name) = provider_name {
                    if rec.name.is_empty() {
                        rec.name = name;
                    }
                }
                rec.rating = rec.rating.or(provider_rating);
                rec.distance_miles = rec.distance_miles.or(provider_distance);
                if rec.photo_url.is_none() {
                    rec.photo_url = photo_url;
                }
                if rec.campaign_id.is_none() {
                    rec.campaign_id = campaign_id;
                }
                if record::advance(rec, CallStatus::Ringing) && rec.started_at.is_none() {
                    rec.started_at = Some(now);
                }
            }

            CampaignEvent::CallConnected {
                provider_id,
                conversation_id,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if rec.conversation_id.is_none() {
                    rec.conversation_id = conversation_id;
                }
                record::advance(rec, CallStatus::Connected);
            }

            CampaignEvent::CallStatus {
                provider_id,
                status,
                conversation_id,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if rec.conversation_id.is_none() {
                    rec.conversation_id = conversation_id;
                }
                match CallStatus::from_wire(&status) {
                    Some(next) => {
                        record::advance(rec, next);
                    }
                    None => debug!(%provider_id, %status, "ignoring unknown call status"),
                }
            }

            CampaignEvent::ToolCalled { provider_id, tool } => {
                debug!(%provider_id, tool = tool.as_deref().unwrap_or(""), "tool invocation");
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                record::advance(rec, CallStatus::Negotiating);
            }

            CampaignEvent::ToolResult {
                provider_id,
                tool,
                result,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                // Only a calendar check that found an opening carries a
                // slot, and a resolved call keeps its settled slot.
                if tool.as_deref() == Some("check_calendar") && !rec.status.is_terminal() {
                    if let Some(outcome) = result {
                        if outcome.available == Some(true) {
                            if let Some(slot) = outcome.slot {
                                rec.offered_slot = Some(slot);
                            }
                        }
                    }
                }
            }

            CampaignEvent::TranscriptChunk {
                provider_id,
                speaker,
                text,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                record::append_line(
                    rec,
                    TranscriptLine {
                        speaker,
                        text,
                        timestamp: Some(Stamp::Timestamp(now.to_rfc3339())),
                    },
                );
            }

            CampaignEvent::SlotOffered {
                provider_id,
                date,
                time,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                // A slot may only be proposed mid-negotiation. Once a call
                // resolves its slot is settled; a booked record in
                // particular keeps the confirmed slot over any late offer.
                if !rec.status.is_terminal() {
                    rec.offered_slot = Some(callwatch_common::records::Slot { date, time });
                }
            }

            CampaignEvent::BookingConfirmed {
                provider_id,
                date,
                time,
                ..
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if record::advance(rec, CallStatus::Booked) {
                    rec.offered_slot = Some(callwatch_common::records::Slot { date, time });
                }
            }

            CampaignEvent::NoAvailability {
                provider_id,
                reason,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if record::advance(rec, CallStatus::NoAvailability) {
                    rec.reason = reason;
                }
            }

            CampaignEvent::CallFailed { provider_id, error } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if record::advance(rec, CallStatus::Failed) {
                    rec.reason = error;
                }
            }

            CampaignEvent::CallCompleted {
                provider_id,
                status,
                result,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                let next = status
                    .as_deref()
                    .and_then(CallStatus::from_wire)
                    .unwrap_or(CallStatus::Completed);
                record::advance(rec, next);
                // Score updates stay valid after a terminal status.
                if let Some(score) = result.and_then(|r| r.score) {
                    rec.score = Some(score);
                }
            }

            CampaignEvent::CallSkipped {
                provider_id,
                reason,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                if record::advance(rec, CallStatus::Skipped) {
                    rec.reason = reason;
                }
            }

            CampaignEvent::CallEnded {
                provider_id,
                transcript,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                // Generic wind-down without a clear outcome; a no-op
                // when a real terminal already landed.
                record::advance(rec, CallStatus::Completed);
                if let Some(lines) = transcript {
                    record::flush_transcript(rec, lines);
                }
            }

            CampaignEvent::TranscriptLoaded {
                provider_id,
                transcript,
            } => {
                let Some(rec) = self.ensure(&provider_id) else {
                    return;
                };
                record::flush_transcript(rec, transcript);
            }

            CampaignEvent::CampaignComplete {
                results,
                best_match,
                ..
            } => {
                for entry in &results {
                    self.apply_result_entry(entry);
                }
                if let Some(entry) = &best_match {
                    self.apply_result_entry(entry);
                }
                self.phase = CampaignPhase::Completed;
            }

            CampaignEvent::GroupComplete { .. } => {
                self.phase = CampaignPhase::Completed;
            }

            CampaignEvent::CampaignError { error } => {
                self.phase = CampaignPhase::Error;
                if error.is_some() {
                    self.message = error;
                }
            }

            CampaignEvent::CampaignUpdate { campaign } => {
                reconcile::reconcile(self, &campaign);
            }

            // Ingest filters these out; a no-op keeps apply total.
            CampaignEvent::Unknown => {}
        }
    }

    /// Apply a batch of events arriving in the same logical tick.
    /// Status-changing events apply before transcript appends so
    /// rendering reflects the freshest status with the transcript
    /// catching up after.
    pub fn apply_batch(&mut self, events: Vec<CampaignEvent>) {
        self.apply_batch_at(events, Utc::now());
    }

    /// Batch form of `apply_at`; one arrival instant for the tick.
    pub fn apply_batch_at(&mut self, events: Vec<CampaignEvent>, now: DateTime<Utc>) {
        let (status_changes, appends): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| e.is_status_change());
        for event in status_changes {
            self.apply_at(event, now);
        }
        for event in appends {
            self.apply_at(event, now);
        }
    }

    /// Derive the renderable aggregate. Pure: identical record sets
    /// always yield identical views.
    pub fn view(&self) -> CampaignView {
        view::project(self)
    }

    /// Mark the campaign cancelled. Used by the session after explicit
    /// server confirmation never arrives within the cancel timeout.
    pub fn mark_cancelled(&mut self) {
        self.phase = CampaignPhase::Cancelled;
    }

    /// Merge discovery-time descriptive fields into a record, creating
    /// it in `queued` when unseen. Never touches status of known records.
    pub(crate) fn absorb_provider(&mut self, provider: &ProviderSummary) {
        let location = match (provider.lat, provider.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };
        let Some(rec) = self.ensure(&provider.provider_id) else {
            return;
        };
        if rec.name.is_empty() {
            if let Some(name) = &provider.name {
                rec.name = name.clone();
            }
        }
        rec.rating = rec.rating.or(provider.rating);
        rec.distance_miles = rec.distance_miles.or(provider.distance_miles);
        if rec.photo_url.is_none() {
            rec.photo_url = provider.photo_url.clone();
        }
        if rec.location.is_none() {
            rec.location = location;
        }
    }

    /// Apply one final-results entry: score updates always land (valid
    /// post-terminal), status recovers a missed terminal event, a slot
    /// fills in only alongside a booking.
    pub(crate) fn apply_result_entry(&mut self, entry: &ResultEntry) {
        let status = entry.status.as_deref().and_then(CallStatus::from_wire);
        let Some(rec) = self.ensure(&entry.provider_id) else {
            return;
        };
        if let Some(name) = &entry.provider_name {
            if rec.name.is_empty() {
                rec.name = name.clone();
            }
        }
        if entry.score.is_some() {
            rec.score = entry.score;
        }
        if let Some(status) = status {
            record::advance(rec, status);
        }
        if rec.status == CallStatus::Booked && rec.offered_slot.is_none() {
            rec.offered_slot = entry.offered_slot.clone();
        }
    }
}
