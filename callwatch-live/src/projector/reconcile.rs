//! Snapshot reconciliation
//!
//! Push delivery has no gap-detection sequence number, so after any
//! reconnect the client refetches the full REST snapshot and reconciles
//! instead of replaying missed frames. Reconciliation is a union:
//! records only ever gain information, statuses only advance (the
//! snapshot wins when more terminal), and a stale snapshot can never
//! regress a terminal record.

use tracing::debug;

use callwatch_common::records::{CallStatus, CampaignPhase};
use callwatch_common::snapshot::{CampaignSnapshot, SnapshotCall};

use super::record;
use super::CampaignProjection;

/// Union a snapshot into the projection.
pub fn reconcile(p: &mut CampaignProjection, snap: &CampaignSnapshot) {
    if let Some(status) = snap.status.as_deref() {
        match CampaignPhase::from_wire(status) {
            Some(next) => adopt_phase(p, next),
            None => debug!(%status, "keeping phase, unknown snapshot phase string"),
        }
    }
    if snap.message.is_some() {
        p.message = snap.message.clone();
    }
    if p.origin.is_none() {
        p.origin = snap.origin_point();
    }

    for provider in &snap.providers {
        p.absorb_provider(provider);
    }
    for call in &snap.calls {
        absorb_call(p, call);
    }
    for entry in &snap.results {
        p.apply_result_entry(entry);
    }
    if let Some(entry) = &snap.best_match {
        p.apply_result_entry(entry);
    }
}

/// Adopt the snapshot phase only when it is at least as far along;
/// once locally over, lateral terminal changes from a stale snapshot
/// are ignored too.
fn adopt_phase(p: &mut CampaignProjection, next: CampaignPhase) {
    let cur = p.phase;
    if next == cur {
        return;
    }
    if next.phase_rank() > cur.phase_rank()
        || (next.phase_rank() == cur.phase_rank() && !cur.is_over())
    {
        p.phase = next;
    } else {
        debug!(current = %cur, ignored = %next, "ignoring phase regression from snapshot");
    }
}

fn absorb_call(p: &mut CampaignProjection, call: &SnapshotCall) {
    let status = call.status.as_deref().and_then(CallStatus::from_wire);
    if call.status.is_some() && status.is_none() {
        debug!(
            provider_id = %call.provider_id,
            status = call.status.as_deref().unwrap_or(""),
            "unknown snapshot call status"
        );
    }

    let Some(rec) = p.ensure(&call.provider_id) else {
        return;
    };
    if let Some(name) = &call.provider_name {
        if rec.name.is_empty() {
            rec.name = name.clone();
        }
    }
    if rec.conversation_id.is_none() {
        rec.conversation_id = call.conversation_id.clone();
    }

    // advance() enforces forward-only / sticky-terminal, which is
    // exactly the "prefer the more terminal status" snapshot rule.
    if let Some(status) = status {
        record::advance(rec, status);
    }

    if call.score.is_some() {
        rec.score = call.score;
    }
    if rec.reason.is_none() {
        rec.reason = call.reason.clone().or_else(|| call.error.clone());
    }
    if rec.offered_slot.is_none()
        && !matches!(rec.status, CallStatus::NoAvailability | CallStatus::Failed)
    {
        rec.offered_slot = call.offered_slot.clone();
    }
    if let Some(lines) = &call.transcript {
        record::flush_transcript(rec, lines.clone());
    }
}
