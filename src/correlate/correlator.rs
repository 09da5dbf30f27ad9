//! Correlates the merged event timeline with the video sample timeline.
//!
//! Correlation is a pure function of its inputs: the same `(Session, fps,
//! duration)` always yields the same enrichment, so downstream prompts are
//! reproducible for a fixed recording.

use crate::session::{Event, Session};
use crate::timeline::{SampleTimeline, SampleWindow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An event paired with the video sample windows that contextualize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedInteraction {
    pub event: Event,
    /// The minimum-distance sample window (ties resolve to the earlier one)
    pub nearest: SampleWindow,
    /// Window at or before the event, `None` before the first window
    pub before: Option<SampleWindow>,
    /// Window strictly after the event, `None` past the last window
    pub after: Option<SampleWindow>,
    /// Set when the event's timestamp falls outside `[0, duration]`.
    ///
    /// Such events are still enriched against the nearest available window;
    /// the generative step benefits from seeing every candidate action even
    /// when its timing is imperfect.
    pub out_of_range: bool,
}

/// Enrich every event of `session` against `timeline`, preserving order.
///
/// No event is dropped; out-of-range events are flagged, not discarded.
pub fn correlate(session: &Session, timeline: &SampleTimeline) -> Vec<EnrichedInteraction> {
    let enriched: Vec<EnrichedInteraction> = session
        .events
        .iter()
        .map(|event| enrich(event, session.duration, timeline))
        .collect();

    let flagged = enriched.iter().filter(|e| e.out_of_range).count();
    if flagged > 0 {
        debug!("{} of {} interactions fall outside the session window", flagged, enriched.len());
    }
    enriched
}

fn enrich(event: &Event, duration: f64, timeline: &SampleTimeline) -> EnrichedInteraction {
    let t = event.timestamp();
    let (before, after) = timeline.bracket(t);
    EnrichedInteraction {
        event: event.clone(),
        nearest: timeline.nearest(t),
        before,
        after,
        out_of_range: !event.is_within(duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::event::{MouseAction, MouseButton, Position};

    fn session_with(timestamps: &[f64], duration: f64) -> Session {
        Session {
            duration,
            events: timestamps
                .iter()
                .map(|&t| Event::Mouse {
                    timestamp: t,
                    action: MouseAction::Press,
                    button: MouseButton::Left,
                    position: Position { x: 1, y: 1 },
                })
                .collect(),
            malformed_records: 0,
        }
    }

    #[test]
    fn test_one_enrichment_per_event_in_order() {
        let session = session_with(&[5.2, 6.1, 80.0], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let enriched = correlate(&session, &timeline);
        assert_eq!(enriched.len(), 3);
        for (e, t) in enriched.iter().zip([5.2, 6.1, 80.0]) {
            assert_eq!(e.event.timestamp(), t);
        }
    }

    #[test]
    fn test_nearest_window_selection() {
        let session = session_with(&[5.2], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let enriched = correlate(&session, &timeline);
        assert!((enriched[0].nearest.timestamp - 5.0).abs() < 1e-9);
        assert!((enriched[0].before.unwrap().timestamp - 5.0).abs() < 1e-9);
        assert!((enriched[0].after.unwrap().timestamp - 6.25).abs() < 1e-9);
        assert!(!enriched[0].out_of_range);
    }

    #[test]
    fn test_out_of_range_event_flagged_and_enriched_against_last_window() {
        let session = session_with(&[130.0], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let enriched = correlate(&session, &timeline);
        assert_eq!(enriched.len(), 1);
        assert!(enriched[0].out_of_range);
        assert_eq!(enriched[0].nearest.timestamp, timeline.last().timestamp);
        assert!(enriched[0].after.is_none());
    }

    #[test]
    fn test_negative_timestamp_flagged() {
        let session = session_with(&[-1.0], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let enriched = correlate(&session, &timeline);
        assert!(enriched[0].out_of_range);
        assert_eq!(enriched[0].nearest.timestamp, 0.0);
        assert!(enriched[0].before.is_none());
    }

    #[test]
    fn test_correlation_is_deterministic() {
        let session = session_with(&[0.625, 5.2, 119.9], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let first = correlate(&session, &timeline);
        let second = correlate(&session, &timeline);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_break_carries_through_enrichment() {
        let session = session_with(&[0.625], 120.5);
        let timeline = SampleTimeline::build(120.5, 0.8).unwrap();
        let enriched = correlate(&session, &timeline);
        assert_eq!(enriched[0].nearest.index, 0);
    }
}
