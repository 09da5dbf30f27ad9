//! Interaction log extraction.
//!
//! Parses the recorder's JSON artifact into a [`Session`]: one merged,
//! chronologically ordered event timeline. Records missing a timestamp or a
//! discriminating type field are counted as malformed rather than silently
//! skipped, so callers always see how much of the log was unusable.

use crate::session::event::{Event, KeyboardAction, MouseAction, MouseButton, Position};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Priority keys for the stable merge. Mouse events sort before keyboard
/// events at identical timestamps; within a stream, original order is kept.
const MOUSE_STREAM: u8 = 0;
const KEYBOARD_STREAM: u8 = 1;

/// Raw session metadata block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSessionInfo {
    /// Declared session duration in seconds
    pub duration: Option<f64>,
    /// Recording platform label, informational only
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosition {
    pub x: i64,
    pub y: i64,
}

/// One raw mouse record. All fields optional so a malformed record surfaces
/// as a count, not a deserialization failure for the whole artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMouseRecord {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub button: Option<String>,
    pub timestamp: Option<f64>,
    pub position: Option<RawPosition>,
}

/// One raw keyboard record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawKeyboardRecord {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub key_name: Option<String>,
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub is_character: bool,
}

/// The raw interaction artifact as written by the recorder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionLog {
    #[serde(default)]
    pub session_info: RawSessionInfo,
    #[serde(default)]
    pub mouse_interactions: Vec<RawMouseRecord>,
    #[serde(default)]
    pub keyboard_events: Vec<RawKeyboardRecord>,
}

/// How a typed-text run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndAction {
    Enter,
    Tab,
    Delete,
    Incomplete,
}

/// A run of printable keystrokes grouped into one logical text entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSequence {
    /// Timestamp of the first character in the run
    pub timestamp: f64,
    pub text: String,
    pub end_action: EndAction,
}

/// The merged, time-ordered interaction timeline for one recording.
///
/// Constructed only by [`InteractionLog::extract`]; read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Declared session duration in seconds
    pub duration: f64,
    /// Events sorted by `(timestamp, stream-priority)` ascending
    pub events: Vec<Event>,
    /// Count of records that could not be parsed into events
    pub malformed_records: usize,
}

impl InteractionLog {
    /// Load and parse the artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse the artifact from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::MalformedInput(format!("invalid JSON: {}", e)))
    }

    /// Extract the merged [`Session`] timeline.
    ///
    /// Fails with [`Error::MalformedInput`] when the artifact lacks
    /// `session_info.duration` or carries no events in either stream.
    pub fn extract(&self) -> Result<Session> {
        let duration = self
            .session_info
            .duration
            .ok_or_else(|| Error::MalformedInput("session_info.duration is missing".to_string()))?;

        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::MalformedInput(format!(
                "session_info.duration must be a positive number, got {}",
                duration
            )));
        }

        if self.mouse_interactions.is_empty() && self.keyboard_events.is_empty() {
            return Err(Error::MalformedInput(
                "both mouse_interactions and keyboard_events are empty, nothing to correlate"
                    .to_string(),
            ));
        }

        let mut malformed = 0usize;
        let mut keyed: Vec<(u8, Event)> = Vec::new();

        for record in &self.mouse_interactions {
            match parse_mouse_record(record) {
                Some(event) => keyed.push((MOUSE_STREAM, event)),
                None => malformed += 1,
            }
        }

        for record in &self.keyboard_events {
            match parse_keyboard_record(record) {
                Some(event) => keyed.push((KEYBOARD_STREAM, event)),
                None => malformed += 1,
            }
        }

        if malformed > 0 {
            warn!("{} malformed record(s) in interaction log", malformed);
        }

        // Stable merge: sort is stable, so equal (timestamp, priority) keys
        // keep original stream order.
        keyed.sort_by(|a, b| {
            a.1.timestamp()
                .partial_cmp(&b.1.timestamp())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let events: Vec<Event> = keyed.into_iter().map(|(_, e)| e).collect();
        debug!(
            "extracted {} events ({} malformed) over {:.1}s",
            events.len(),
            malformed,
            duration
        );

        Ok(Session {
            duration,
            events,
            malformed_records: malformed,
        })
    }
}

fn parse_mouse_record(record: &RawMouseRecord) -> Option<Event> {
    let timestamp = record.timestamp.filter(|t| t.is_finite())?;
    let action = match record.kind.as_deref()? {
        "mouse_press" | "press" => MouseAction::Press,
        "mouse_release" | "release" => MouseAction::Release,
        "mouse_move" | "move" => MouseAction::Move,
        "mouse_click" | "click" => MouseAction::Click,
        _ => return None,
    };
    // Moves carry no meaningful button in some recorder versions
    let button = match record.button.as_deref() {
        Some("left") => MouseButton::Left,
        Some("right") => MouseButton::Right,
        Some("middle") => MouseButton::Middle,
        None if action == MouseAction::Move => MouseButton::Left,
        _ => return None,
    };
    let raw_pos = record.position.as_ref()?;
    if raw_pos.x < 0 || raw_pos.y < 0 {
        return None;
    }
    Some(Event::Mouse {
        timestamp,
        action,
        button,
        position: Position {
            x: raw_pos.x as u32,
            y: raw_pos.y as u32,
        },
    })
}

fn parse_keyboard_record(record: &RawKeyboardRecord) -> Option<Event> {
    let timestamp = record.timestamp.filter(|t| t.is_finite())?;
    let action = match record.kind.as_deref()? {
        "key_press" => KeyboardAction::KeyPress,
        "key_release" => KeyboardAction::KeyRelease,
        _ => return None,
    };
    let key_name = record.key_name.clone()?;
    Some(Event::Keyboard {
        timestamp,
        action,
        key_name,
        is_character: record.is_character,
    })
}

impl Session {
    /// Number of events in the merged timeline
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fraction of raw records that failed to parse
    pub fn malformed_ratio(&self) -> f64 {
        let total = self.events.len() + self.malformed_records;
        if total == 0 {
            0.0
        } else {
            self.malformed_records as f64 / total as f64
        }
    }

    /// Timestamp of the last event, if any
    pub fn last_timestamp(&self) -> Option<f64> {
        self.events.last().map(|e| e.timestamp())
    }

    /// Count of events whose timestamp falls outside `[0, duration]`
    pub fn out_of_range_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !e.is_within(self.duration))
            .count()
    }

    /// Group consecutive printable key presses into logical text entries.
    ///
    /// Return/Enter and Tab terminate a run; Backspace/Delete removes the
    /// last buffered character. A run still open at the end of the session
    /// is emitted as `Incomplete`.
    pub fn group_text_sequences(&self) -> Vec<TextSequence> {
        let mut sequences = Vec::new();
        let mut current = String::new();
        let mut start: Option<f64> = None;

        for event in &self.events {
            let Event::Keyboard {
                timestamp,
                action: KeyboardAction::KeyPress,
                key_name,
                is_character,
            } = event
            else {
                continue;
            };

            // Terminator keys act regardless of the recorder's is_character flag
            match key_name.as_str() {
                "Return" | "Enter" => {
                    if !current.trim().is_empty() {
                        sequences.push(TextSequence {
                            timestamp: start.unwrap_or(*timestamp),
                            text: std::mem::take(&mut current),
                            end_action: EndAction::Enter,
                        });
                    } else {
                        current.clear();
                    }
                    start = None;
                }
                "Tab" => {
                    if !current.trim().is_empty() {
                        sequences.push(TextSequence {
                            timestamp: start.unwrap_or(*timestamp),
                            text: std::mem::take(&mut current),
                            end_action: EndAction::Tab,
                        });
                    } else {
                        current.clear();
                    }
                    start = None;
                }
                "BackSpace" | "Delete" => {
                    current.pop();
                    if current.is_empty() {
                        start = None;
                    }
                }
                key if *is_character && key.chars().count() == 1 => {
                    if current.is_empty() {
                        start = Some(*timestamp);
                    }
                    current.push_str(key);
                }
                _ => {}
            }
        }

        if !current.trim().is_empty() {
            sequences.push(TextSequence {
                timestamp: start.unwrap_or(0.0),
                text: current,
                end_action: EndAction::Incomplete,
            });
        }

        sequences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse_record(kind: &str, ts: f64) -> RawMouseRecord {
        RawMouseRecord {
            kind: Some(kind.to_string()),
            button: Some("left".to_string()),
            timestamp: Some(ts),
            position: Some(RawPosition { x: 100, y: 200 }),
        }
    }

    fn key_record(key: &str, ts: f64, is_char: bool) -> RawKeyboardRecord {
        RawKeyboardRecord {
            kind: Some("key_press".to_string()),
            key_name: Some(key.to_string()),
            timestamp: Some(ts),
            is_character: is_char,
        }
    }

    fn log_with(
        duration: Option<f64>,
        mouse: Vec<RawMouseRecord>,
        keys: Vec<RawKeyboardRecord>,
    ) -> InteractionLog {
        InteractionLog {
            session_info: RawSessionInfo {
                duration,
                platform: Some("test".to_string()),
            },
            mouse_interactions: mouse,
            keyboard_events: keys,
        }
    }

    #[test]
    fn test_extract_basic_session() {
        let log = log_with(
            Some(120.5),
            vec![mouse_record("mouse_press", 5.2)],
            vec![key_record("a", 6.1, true)],
        );
        let session = log.extract().unwrap();
        assert_eq!(session.duration, 120.5);
        assert_eq!(session.len(), 2);
        assert_eq!(session.malformed_records, 0);
        assert!(session.events[0].is_mouse());
        assert!(session.events[1].is_keyboard());
    }

    #[test]
    fn test_missing_duration_is_malformed_input() {
        let log = log_with(None, vec![mouse_record("mouse_press", 1.0)], vec![]);
        match log.extract() {
            Err(Error::MalformedInput(msg)) => assert!(msg.contains("duration")),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_duration_is_malformed_input() {
        let log = log_with(Some(0.0), vec![mouse_record("mouse_press", 1.0)], vec![]);
        assert!(matches!(log.extract(), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_empty_streams_are_malformed_input() {
        let log = log_with(Some(10.0), vec![], vec![]);
        assert!(matches!(log.extract(), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_merge_sorts_by_timestamp() {
        let log = log_with(
            Some(10.0),
            vec![mouse_record("mouse_press", 3.0), mouse_record("mouse_press", 1.0)],
            vec![key_record("a", 2.0, true)],
        );
        let session = log.extract().unwrap();
        let timestamps: Vec<f64> = session.events.iter().map(|e| e.timestamp()).collect();
        assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_equal_timestamp_tie_break_mouse_first() {
        let log = log_with(
            Some(10.0),
            vec![mouse_record("mouse_press", 2.0)],
            vec![key_record("a", 2.0, true)],
        );
        let session = log.extract().unwrap();
        assert!(session.events[0].is_mouse());
        assert!(session.events[1].is_keyboard());
    }

    #[test]
    fn test_malformed_records_counted_not_dropped_silently() {
        let mut bad_type = mouse_record("teleport", 1.0);
        bad_type.kind = Some("teleport".to_string());
        let no_timestamp = RawMouseRecord {
            kind: Some("mouse_press".to_string()),
            button: Some("left".to_string()),
            timestamp: None,
            position: Some(RawPosition { x: 1, y: 1 }),
        };
        let no_kind = RawKeyboardRecord {
            kind: None,
            key_name: Some("a".to_string()),
            timestamp: Some(1.0),
            is_character: true,
        };
        let log = log_with(
            Some(10.0),
            vec![mouse_record("mouse_press", 1.0), bad_type, no_timestamp],
            vec![key_record("b", 2.0, true), no_kind],
        );
        let session = log.extract().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.malformed_records, 3);
        assert!((session.malformed_ratio() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_position_is_malformed() {
        let mut record = mouse_record("mouse_press", 1.0);
        record.position = Some(RawPosition { x: -5, y: 10 });
        let log = log_with(Some(10.0), vec![record, mouse_record("mouse_click", 2.0)], vec![]);
        let session = log.extract().unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.malformed_records, 1);
    }

    #[test]
    fn test_move_without_button_is_accepted() {
        let record = RawMouseRecord {
            kind: Some("mouse_move".to_string()),
            button: None,
            timestamp: Some(1.0),
            position: Some(RawPosition { x: 5, y: 5 }),
        };
        let log = log_with(Some(10.0), vec![record], vec![]);
        let session = log.extract().unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.malformed_records, 0);
    }

    #[test]
    fn test_out_of_range_events_are_kept_and_counted() {
        let log = log_with(
            Some(10.0),
            vec![mouse_record("mouse_press", 5.0), mouse_record("mouse_press", 15.0)],
            vec![],
        );
        let session = log.extract().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.out_of_range_count(), 1);
        assert_eq!(session.last_timestamp(), Some(15.0));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            InteractionLog::from_json("not json at all {"),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_from_json_full_artifact() {
        let json = r#"{
            "session_info": {"duration": 120.5, "platform": "Windows"},
            "mouse_interactions": [
                {"type": "mouse_press", "button": "left", "timestamp": 5.2,
                 "position": {"x": 640, "y": 480}}
            ],
            "keyboard_events": [
                {"type": "key_press", "key_name": "a", "timestamp": 6.1,
                 "is_character": true}
            ]
        }"#;
        let log = InteractionLog::from_json(json).unwrap();
        let session = log.extract().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.duration, 120.5);
    }

    #[test]
    fn test_text_sequence_grouping_enter() {
        let log = log_with(
            Some(30.0),
            vec![mouse_record("mouse_press", 0.5)],
            vec![
                key_record("h", 1.0, true),
                key_record("i", 1.2, true),
                key_record("Return", 1.5, true),
                key_record("o", 2.0, true),
                key_record("k", 2.1, true),
                key_record("Tab", 2.5, true),
            ],
        );
        let session = log.extract().unwrap();
        let seqs = session.group_text_sequences();
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].text, "hi");
        assert_eq!(seqs[0].end_action, EndAction::Enter);
        assert_eq!(seqs[0].timestamp, 1.0);
        assert_eq!(seqs[1].text, "ok");
        assert_eq!(seqs[1].end_action, EndAction::Tab);
    }

    #[test]
    fn test_text_sequence_backspace_and_incomplete() {
        let log = log_with(
            Some(30.0),
            vec![mouse_record("mouse_press", 0.5)],
            vec![
                key_record("a", 1.0, true),
                key_record("b", 1.1, true),
                key_record("BackSpace", 1.2, true),
                key_record("c", 1.3, true),
            ],
        );
        let session = log.extract().unwrap();
        let seqs = session.group_text_sequences();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].text, "ac");
        assert_eq!(seqs[0].end_action, EndAction::Incomplete);
    }

    #[test]
    fn test_text_sequence_ignores_control_keys_and_releases() {
        let mut shift = key_record("Shift", 1.0, false);
        shift.is_character = false;
        let release = RawKeyboardRecord {
            kind: Some("key_release".to_string()),
            key_name: Some("a".to_string()),
            timestamp: Some(1.1),
            is_character: true,
        };
        let log = log_with(
            Some(30.0),
            vec![mouse_record("mouse_press", 0.5)],
            vec![shift, release, key_record("x", 1.2, true)],
        );
        let session = log.extract().unwrap();
        let seqs = session.group_text_sequences();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].text, "x");
    }
}
