//! Core event types for the merged interaction timeline.
//!
//! Each recorded interaction is either a mouse or a keyboard event with a
//! timestamp in seconds relative to the start of the recording.

use serde::{Deserialize, Serialize};

/// Mouse actions recognized by the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    /// Button pressed down
    Press,
    /// Button released
    Release,
    /// Pointer moved (sampled)
    Move,
    /// A full click (press + release collapsed by the recorder)
    Click,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardAction {
    KeyPress,
    KeyRelease,
}

/// Screen position in pixels (origin top-left, non-negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

/// A single interaction from the merged timeline.
///
/// Exactly one variant per event; the merged timeline is ordered by
/// `timestamp` with mouse events sorting before keyboard events at identical
/// timestamps (fixed tie-break, see [`crate::session::extractor`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Mouse {
        /// Seconds since recording start
        timestamp: f64,
        action: MouseAction,
        button: MouseButton,
        position: Position,
    },
    Keyboard {
        /// Seconds since recording start
        timestamp: f64,
        action: KeyboardAction,
        key_name: String,
        /// Distinguishes printable input from control keys
        is_character: bool,
    },
}

impl Event {
    /// Timestamp in seconds relative to recording start
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Mouse { timestamp, .. } => *timestamp,
            Event::Keyboard { timestamp, .. } => *timestamp,
        }
    }

    /// Check if this is a mouse event
    pub fn is_mouse(&self) -> bool {
        matches!(self, Event::Mouse { .. })
    }

    /// Check if this is a keyboard event
    pub fn is_keyboard(&self) -> bool {
        matches!(self, Event::Keyboard { .. })
    }

    /// Check if this is a left-button press or click
    pub fn is_left_click(&self) -> bool {
        matches!(
            self,
            Event::Mouse {
                action: MouseAction::Press | MouseAction::Click,
                button: MouseButton::Left,
                ..
            }
        )
    }

    /// Check if this is a printable key press
    pub fn is_character_press(&self) -> bool {
        matches!(
            self,
            Event::Keyboard {
                action: KeyboardAction::KeyPress,
                is_character: true,
                ..
            }
        )
    }

    /// Whether the timestamp lies within `[0, duration]`.
    ///
    /// Events outside the window are flagged downstream, never dropped.
    pub fn is_within(&self, duration: f64) -> bool {
        let t = self.timestamp();
        t >= 0.0 && t <= duration
    }

    /// Short human-readable description for timelines and prompts
    pub fn describe(&self) -> String {
        match self {
            Event::Mouse {
                action,
                button,
                position,
                ..
            } => {
                let verb = match action {
                    MouseAction::Press => "press",
                    MouseAction::Release => "release",
                    MouseAction::Move => "move",
                    MouseAction::Click => "click",
                };
                format!(
                    "{:?} {} at ({}, {})",
                    button, verb, position.x, position.y
                )
                .to_lowercase()
            }
            Event::Keyboard {
                action, key_name, ..
            } => match action {
                KeyboardAction::KeyPress => format!("press key '{}'", key_name),
                KeyboardAction::KeyRelease => format!("release key '{}'", key_name),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(ts: f64) -> Event {
        Event::Mouse {
            timestamp: ts,
            action: MouseAction::Press,
            button: MouseButton::Left,
            position: Position { x: 10, y: 20 },
        }
    }

    fn key(ts: f64, name: &str, is_char: bool) -> Event {
        Event::Keyboard {
            timestamp: ts,
            action: KeyboardAction::KeyPress,
            key_name: name.to_string(),
            is_character: is_char,
        }
    }

    #[test]
    fn test_timestamp_accessor() {
        assert_eq!(mouse(5.2).timestamp(), 5.2);
        assert_eq!(key(6.1, "a", true).timestamp(), 6.1);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(mouse(0.0).is_mouse());
        assert!(!mouse(0.0).is_keyboard());
        assert!(key(0.0, "a", true).is_keyboard());
        assert!(!key(0.0, "a", true).is_mouse());
    }

    #[test]
    fn test_left_click_detection() {
        assert!(mouse(1.0).is_left_click());

        let right = Event::Mouse {
            timestamp: 1.0,
            action: MouseAction::Press,
            button: MouseButton::Right,
            position: Position::default(),
        };
        assert!(!right.is_left_click());

        let moved = Event::Mouse {
            timestamp: 1.0,
            action: MouseAction::Move,
            button: MouseButton::Left,
            position: Position::default(),
        };
        assert!(!moved.is_left_click());
    }

    #[test]
    fn test_character_press_detection() {
        assert!(key(0.0, "a", true).is_character_press());
        assert!(!key(0.0, "Return", false).is_character_press());

        let release = Event::Keyboard {
            timestamp: 0.0,
            action: KeyboardAction::KeyRelease,
            key_name: "a".to_string(),
            is_character: true,
        };
        assert!(!release.is_character_press());
    }

    #[test]
    fn test_is_within_bounds() {
        assert!(mouse(0.0).is_within(10.0));
        assert!(mouse(10.0).is_within(10.0));
        assert!(!mouse(10.001).is_within(10.0));
        assert!(!mouse(-0.5).is_within(10.0));
    }

    #[test]
    fn test_describe() {
        assert_eq!(mouse(1.0).describe(), "left press at (10, 20)");
        assert_eq!(key(1.0, "Return", false).describe(), "press key 'Return'");
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = mouse(5.2);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"mouse\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_keyboard_serialization_tag() {
        let event = key(6.1, "Tab", false);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"keyboard\""));
        assert!(json.contains("\"key_name\":\"Tab\""));
    }
}
