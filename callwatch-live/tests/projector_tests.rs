//! Integration tests for the campaign projector
//!
//! Covers terminal idempotence, forward-only transitions, derived
//! totals, unknown-event safety, scoreboard ordering, and a full
//! campaign walkthrough.

use callwatch_common::events::{CampaignEvent, ProviderSummary, ResultEntry};
use callwatch_common::records::{CallStatus, CampaignPhase, Speaker};
use callwatch_live::ingest::decode_frame;
use callwatch_live::CampaignProjection;

// =============================================================================
// Event helpers
// =============================================================================

fn provider(id: &str, name: &str) -> ProviderSummary {
    ProviderSummary {
        provider_id: id.into(),
        name: Some(name.into()),
        rating: None,
        distance_miles: None,
        photo_url: None,
        lat: None,
        lng: None,
    }
}

fn providers_found(ids: &[(&str, &str)]) -> CampaignEvent {
    CampaignEvent::ProvidersFound {
        campaign_id: Some("c-1".into()),
        origin: None,
        providers: ids.iter().map(|(id, name)| provider(id, name)).collect(),
    }
}

fn call_started(id: &str) -> CampaignEvent {
    CampaignEvent::CallStarted {
        provider_id: id.into(),
        provider_name: None,
        provider_rating: None,
        provider_distance: None,
        photo_url: None,
        campaign_id: None,
    }
}

fn call_connected(id: &str) -> CampaignEvent {
    CampaignEvent::CallConnected {
        provider_id: id.into(),
        conversation_id: None,
    }
}

fn tool_called(id: &str, tool: &str) -> CampaignEvent {
    CampaignEvent::ToolCalled {
        provider_id: id.into(),
        tool: Some(tool.into()),
    }
}

fn booking_confirmed(id: &str, date: &str, time: &str) -> CampaignEvent {
    CampaignEvent::BookingConfirmed {
        provider_id: id.into(),
        date: date.into(),
        time: time.into(),
        service_type: None,
    }
}

fn call_failed(id: &str, error: &str) -> CampaignEvent {
    CampaignEvent::CallFailed {
        provider_id: id.into(),
        error: Some(error.into()),
    }
}

fn chunk(id: &str, text: &str) -> CampaignEvent {
    CampaignEvent::TranscriptChunk {
        provider_id: id.into(),
        speaker: Speaker::Counterparty,
        text: text.into(),
    }
}

fn booked_with_score(p: &mut CampaignProjection, id: &str, score: f64) {
    p.apply(booking_confirmed(id, "2025-03-01", "10:00"));
    p.apply(CampaignEvent::CampaignComplete {
        campaign_id: None,
        results: vec![ResultEntry {
            provider_id: id.into(),
            provider_name: None,
            status: None,
            score: Some(score),
            offered_slot: None,
        }],
        best_match: None,
    });
}

// =============================================================================
// P1: idempotent terminal state
// =============================================================================

#[test]
fn duplicate_terminal_event_is_a_no_op() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(call_started("p-1"));
    p.apply(booking_confirmed("p-1", "2025-03-01", "10:00"));

    let before = p.record("p-1").unwrap().clone();
    let done_before = p.view().done;

    p.apply(booking_confirmed("p-1", "2025-04-09", "16:00"));

    let after = p.record("p-1").unwrap();
    assert_eq!(after.status, CallStatus::Booked);
    assert_eq!(after.offered_slot, before.offered_slot, "slot must not move");
    assert_eq!(p.view().done, done_before, "tallies must not double-count");
}

#[test]
fn conflicting_terminal_event_cannot_flip_outcome() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(booking_confirmed("p-1", "2025-03-01", "10:00"));
    p.apply(call_failed("p-1", "late failure"));

    let rec = p.record("p-1").unwrap();
    assert_eq!(rec.status, CallStatus::Booked);
    assert!(rec.offered_slot.is_some());
}

// =============================================================================
// P2: forward-only transitions
// =============================================================================

#[test]
fn terminal_records_never_move_back() {
    for terminal in [
        CampaignEvent::NoAvailability {
            provider_id: "p-1".into(),
            reason: None,
        },
        call_failed("p-1", "busy"),
        CampaignEvent::CallSkipped {
            provider_id: "p-1".into(),
            reason: None,
        },
    ] {
        let mut p = CampaignProjection::new("g-1");
        p.apply(terminal);
        let settled = p.record("p-1").unwrap().status;
        assert!(settled.is_terminal());

        for resurrect in [
            call_started("p-1"),
            call_connected("p-1"),
            tool_called("p-1", "check_calendar"),
        ] {
            p.apply(resurrect);
            assert_eq!(p.record("p-1").unwrap().status, settled);
        }
    }
}

#[test]
fn late_lifecycle_events_cannot_regress_progress() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(call_started("p-1"));
    p.apply(call_connected("p-1"));
    p.apply(tool_called("p-1", "check_calendar"));

    // a late duplicate call_started must not pull the record back
    p.apply(call_started("p-1"));
    assert_eq!(p.record("p-1").unwrap().status, CallStatus::Negotiating);
}

#[test]
fn transcript_still_flows_after_terminal() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(call_failed("p-1", "busy"));
    p.apply(chunk("p-1", "sorry, we're closed"));
    let rec = p.record("p-1").unwrap();
    assert_eq!(rec.status, CallStatus::Failed);
    assert_eq!(rec.transcript.len(), 1);
}

// =============================================================================
// P3: derived totals
// =============================================================================

#[test]
fn done_active_queued_partition_total_after_any_sequence() {
    let sequences: Vec<Vec<CampaignEvent>> = vec![
        vec![providers_found(&[("p-1", "A"), ("p-2", "B"), ("p-3", "C")])],
        vec![
            providers_found(&[("p-1", "A"), ("p-2", "B")]),
            call_started("p-1"),
            call_connected("p-1"),
        ],
        vec![
            call_started("p-1"),
            call_failed("p-1", "busy"),
            call_started("p-2"),
            tool_called("p-2", "check_calendar"),
            booking_confirmed("p-2", "2025-03-01", "10:00"),
            chunk("p-2", "see you then"),
        ],
        vec![
            providers_found(&[("p-1", "A")]),
            CampaignEvent::CallSkipped {
                provider_id: "p-1".into(),
                reason: Some("no phone number".into()),
            },
            CampaignEvent::CallEnded {
                provider_id: "p-2".into(),
                transcript: None,
            },
        ],
    ];

    for events in sequences {
        let mut p = CampaignProjection::new("g-1");
        for event in events {
            p.apply(event);
            let view = p.view();
            assert_eq!(
                view.done + view.active + view.queued,
                view.total,
                "partition must hold after every event"
            );
        }
    }
}

// =============================================================================
// P4: unknown event safety
// =============================================================================

#[test]
fn unknown_event_changes_nothing() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(providers_found(&[("p-1", "A")]));
    let before = p.view();

    // through the ingest boundary
    assert!(decode_frame(r#"{"type":"future_unknown_event","provider_id":"p-1"}"#).is_none());

    // and through the reducer directly
    p.apply(CampaignEvent::Unknown);
    let after = p.view();
    assert_eq!(after.total, before.total);
    assert_eq!(after.records, before.records);
    assert_eq!(after.phase, before.phase);
}

// =============================================================================
// P6: scoreboard ordering
// =============================================================================

#[test]
fn booked_list_orders_by_score_descending() {
    let mut p = CampaignProjection::new("g-1");
    booked_with_score(&mut p, "p-1", 0.9);
    booked_with_score(&mut p, "p-2", 0.4);
    booked_with_score(&mut p, "p-3", 0.7);

    let view = p.view();
    let order: Vec<&str> = view.booked.iter().map(|r| r.provider_id.as_str()).collect();
    assert_eq!(order, ["p-1", "p-3", "p-2"]);
    assert_eq!(view.best_match.unwrap().provider_id, "p-1");
}

#[test]
fn unscored_bookings_sort_last_in_arrival_order() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(booking_confirmed("p-1", "2025-03-01", "10:00"));
    booked_with_score(&mut p, "p-2", 0.5);
    p.apply(booking_confirmed("p-3", "2025-03-02", "11:00"));

    let view = p.view();
    let order: Vec<&str> = view.booked.iter().map(|r| r.provider_id.as_str()).collect();
    assert_eq!(order, ["p-2", "p-1", "p-3"]);
}

// =============================================================================
// Full campaign walkthrough
// =============================================================================

#[test]
fn campaign_walkthrough() {
    let mut p = CampaignProjection::new("g-1");

    p.apply(providers_found(&[("p-1", "Harbor Dental"), ("p-2", "Bayview Dental")]));
    let view = p.view();
    assert_eq!(view.total, 2);
    assert_eq!(view.queued, 2);
    assert_eq!(p.record("p-1").unwrap().status, CallStatus::Queued);

    p.apply(call_started("p-1"));
    assert_eq!(p.view().active, 1);
    assert_eq!(p.record("p-1").unwrap().status, CallStatus::Ringing);

    p.apply(call_connected("p-1"));
    assert_eq!(p.record("p-1").unwrap().status, CallStatus::Connected);

    p.apply(tool_called("p-1", "check_calendar"));
    assert_eq!(p.record("p-1").unwrap().status, CallStatus::Negotiating);

    p.apply(booking_confirmed("p-1", "2025-03-01", "10:00"));
    let rec = p.record("p-1").unwrap();
    assert_eq!(rec.status, CallStatus::Booked);
    let slot = rec.offered_slot.as_ref().unwrap();
    assert_eq!(slot.date, "2025-03-01");
    assert_eq!(slot.time, "10:00");
    assert_eq!(p.view().done, 1);

    p.apply(call_failed("p-2", "busy"));
    assert_eq!(p.view().done, 2);
    assert_eq!(p.record("p-2").unwrap().reason.as_deref(), Some("busy"));

    p.apply(CampaignEvent::CampaignComplete {
        campaign_id: None,
        results: vec![],
        best_match: None,
    });

    let view = p.view();
    assert_eq!(view.phase, CampaignPhase::Completed);
    assert_eq!(view.total, 2);
    assert_eq!(view.done, 2);
    assert_eq!(view.active, 0);
    let booked: Vec<&str> = view.booked.iter().map(|r| r.provider_id.as_str()).collect();
    assert_eq!(booked, ["p-1"]);
}

#[test]
fn completed_phase_derived_without_final_event() {
    // resilience against a missed campaign_complete frame
    let mut p = CampaignProjection::new("g-1");
    p.apply(CampaignEvent::CampaignStatus {
        status: "calling".into(),
        message: None,
        campaign_id: None,
    });
    p.apply(providers_found(&[("p-1", "A"), ("p-2", "B")]));
    p.apply(booking_confirmed("p-1", "2025-03-01", "10:00"));
    assert_eq!(p.view().phase, CampaignPhase::Calling);

    p.apply(call_failed("p-2", "busy"));
    assert_eq!(p.view().phase, CampaignPhase::Completed);
}

#[test]
fn campaign_error_surfaces_message() {
    let mut p = CampaignProjection::new("g-1");
    p.apply(CampaignEvent::CampaignError {
        error: Some("places quota exhausted".into()),
    });
    let view = p.view();
    assert_eq!(view.phase, CampaignPhase::Error);
    assert_eq!(view.message.as_deref(), Some("places quota exhausted"));
}
