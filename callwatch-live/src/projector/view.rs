//! Aggregate view model
//!
//! Derives the renderable campaign summary from the record set on every
//! recompute. Nothing here is stored; counters cannot drift from the
//! records they describe.

use std::cmp::Ordering;

use serde::Serialize;

use callwatch_common::records::{CallRecord, CallStatus, CampaignPhase, GeoPoint};

use super::CampaignProjection;

/// Renderable campaign summary.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignView {
    pub group_id: String,
    pub phase: CampaignPhase,
    pub message: Option<String>,
    pub origin: Option<GeoPoint>,
    pub total: usize,
    pub done: usize,
    pub active: usize,
    pub queued: usize,
    /// All records, status-priority then arrival order
    pub records: Vec<CallRecord>,
    /// Booked records, score descending (missing scores last), arrival
    /// order breaking ties
    pub booked: Vec<CallRecord>,
    pub best_match: Option<CallRecord>,
}

/// Recompute the aggregate. Pure and total: the same record set always
/// produces the identical view.
pub fn project(p: &CampaignProjection) -> CampaignView {
    let total = p.records.len();
    let done = p.records.iter().filter(|r| r.status.is_terminal()).count();
    let active = p.records.iter().filter(|r| r.status.is_active()).count();
    let queued = p
        .records
        .iter()
        .filter(|r| r.status == CallStatus::Queued)
        .count();

    let mut records = p.records.clone();
    records.sort_by_key(|r| r.status.display_priority());

    let mut booked: Vec<CallRecord> = p
        .records
        .iter()
        .filter(|r| r.status == CallStatus::Booked)
        .cloned()
        .collect();
    booked.sort_by(|a, b| compare_scores(a.score, b.score));

    let best_match = booked.first().cloned();

    // The server declares the phase; "completed" is additionally derived
    // locally so a missed final event cannot strand the view. Cancelled
    // and error declarations are not overridden.
    let phase = if total > 0
        && done == total
        && !matches!(p.phase, CampaignPhase::Cancelled | CampaignPhase::Error)
    {
        CampaignPhase::Completed
    } else {
        p.phase
    };

    CampaignView {
        group_id: p.group_id.clone(),
        phase,
        message: p.message.clone(),
        origin: p.origin,
        total,
        done,
        active,
        queued,
        records,
        booked,
        best_match,
    }
}

/// Score ordering: higher first, missing scores last. Stable sorts keep
/// arrival order among ties.
fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
