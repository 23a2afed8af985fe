//! Per-provider call state transitions
//!
//! Transitions only move forward through the call lifecycle. Terminal
//! statuses are sticky: once reached, later lifecycle events for the
//! same provider are ignored, while transcript flushes and score
//! updates remain valid.

use callwatch_common::records::{CallRecord, CallStatus, TranscriptLine};
use tracing::debug;

/// Attempt to move a record to `next`. Returns true when the status
/// actually changed.
///
/// Rules:
/// - duplicate statuses are idempotent no-ops
/// - terminal records never change status again
/// - otherwise the phase rank must increase, except the one permitted
///   backward edge negotiating -> connected (tool invocations may
///   repeat within a call)
/// - entering no_availability or failed clears a tentatively offered
///   slot so a failed call never surfaces a phantom offer
pub(crate) fn advance(record: &mut CallRecord, next: CallStatus) -> bool {
    let current = record.status;
    if current == next {
        return false;
    }
    if current.is_terminal() {
        debug!(
            provider_id = %record.provider_id,
            current = %current,
            ignored = %next,
            "ignoring lifecycle event for terminal record"
        );
        return false;
    }

    let reentry = current == CallStatus::Negotiating && next == CallStatus::Connected;
    if !reentry && next.phase_rank() <= current.phase_rank() {
        debug!(
            provider_id = %record.provider_id,
            current = %current,
            ignored = %next,
            "ignoring out-of-order transition"
        );
        return false;
    }

    record.status = next;
    if matches!(next, CallStatus::NoAvailability | CallStatus::Failed)
        && record.offered_slot.take().is_some()
    {
        debug!(
            provider_id = %record.provider_id,
            "cleared stale offered slot on negative outcome"
        );
    }
    true
}

/// Append one transcript line. Valid in any status, including after a
/// terminal event (a final flush commonly trails the terminal status).
pub(crate) fn append_line(record: &mut CallRecord, line: TranscriptLine) {
    record.transcript.push(line);
}

/// Replace the transcript with a full flush. The flush wins only when
/// it carries at least as many lines as currently held, keeping
/// transcript growth monotonic when a flush races a late delta.
pub(crate) fn flush_transcript(record: &mut CallRecord, lines: Vec<TranscriptLine>) {
    if lines.len() >= record.transcript.len() {
        record.transcript = lines;
    } else {
        debug!(
            provider_id = %record.provider_id,
            held = record.transcript.len(),
            flushed = lines.len(),
            "ignoring transcript flush shorter than held transcript"
        );
    }
}
