//! Prompt construction for video-aware command generation.
//!
//! The interaction timeline gives the model anchor points: every recorded
//! event is listed under a short activity window so the model knows which
//! stretches of video to inspect closely. Text sequences are reassembled so
//! the prompt carries whole typed strings rather than per-key noise.

use crate::correlate::EnrichedInteraction;
use crate::session::{Session, TextSequence};

/// Gap above which a new activity window starts, in seconds
const ACTIVITY_WINDOW_GAP: f64 = 2.0;

/// A burst of consecutive interactions separated by short gaps
#[derive(Debug)]
struct ActivityWindow<'a> {
    start: f64,
    end: f64,
    interactions: Vec<&'a EnrichedInteraction>,
}

fn group_activity_windows<'a>(interactions: &'a [EnrichedInteraction]) -> Vec<ActivityWindow<'a>> {
    let mut windows: Vec<ActivityWindow<'a>> = Vec::new();
    for interaction in interactions {
        let t = interaction.event.timestamp();
        match windows.last_mut() {
            Some(window) if t - window.end <= ACTIVITY_WINDOW_GAP => {
                window.end = t;
                window.interactions.push(interaction);
            }
            _ => windows.push(ActivityWindow {
                start: t,
                end: t,
                interactions: vec![interaction],
            }),
        }
    }
    windows
}

/// Render the annotated timeline the model reads alongside the video.
pub fn interaction_timeline(interactions: &[EnrichedInteraction]) -> String {
    let mut lines = Vec::new();
    lines.push("=== UI INTERACTION TIMELINE FOR VIDEO ANALYSIS ===".to_string());
    lines.push(format!("Total Interactions: {}", interactions.len()));
    lines.push(String::new());
    lines.push("Key moments for video frame analysis:".to_string());
    lines.push(String::new());

    for (i, window) in group_activity_windows(interactions).iter().enumerate() {
        lines.push(format!(
            "--- Time Window {}: {:.1}s - {:.1}s ---",
            i + 1,
            window.start,
            window.end
        ));
        for interaction in &window.interactions {
            let mut line = format!(
                "[{:.1}s] {}",
                interaction.event.timestamp(),
                interaction.event.describe()
            );
            if interaction.out_of_range {
                line.push_str(" (outside video range)");
            }
            lines.push(line);
            lines.push(format!(
                "    Nearest video sample: frame {} at {:.2}s",
                interaction.nearest.index, interaction.nearest.timestamp
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Summarize interaction kinds and reassembled typed text.
pub fn interaction_summary(session: &Session) -> String {
    let mouse = session.events.iter().filter(|e| e.is_mouse()).count();
    let keyboard = session.events.iter().filter(|e| e.is_keyboard()).count();

    let mut lines = Vec::new();
    lines.push("Interaction Type Breakdown:".to_string());
    lines.push(format!("- Mouse: {}", mouse));
    lines.push(format!("- Keyboard: {}", keyboard));

    let sequences: Vec<TextSequence> = session
        .group_text_sequences()
        .into_iter()
        .filter(|s| !s.text.is_empty())
        .collect();
    if !sequences.is_empty() {
        lines.push(String::new());
        lines.push("Text Input Patterns:".to_string());
        for sequence in sequences.iter().take(5) {
            lines.push(format!("- '{}'", sequence.text));
        }
        if sequences.len() > 5 {
            lines.push(format!("... and {} more", sequences.len() - 5));
        }
    }

    lines.join("\n")
}

/// Build the full generation prompt from a correlated session.
pub fn build_prompt(session: &Session, interactions: &[EnrichedInteraction]) -> String {
    let timeline = interaction_timeline(interactions);
    let summary = interaction_summary(session);

    format!(
        r#"You are an expert RPA analyst creating detailed, contextual workflow commands for desktop applications. Your task is to analyze both the user interaction timeline AND the video to generate precise, human-readable RPA commands.

CRITICAL ANALYSIS APPROACH:
- VIDEO-FIRST ANALYSIS: Use the video to identify what UI elements users are interacting with
- CONTEXTUAL MAPPING: Correlate video frames with interaction timestamps to understand user intent
- SEMANTIC UNDERSTANDING: Describe what elements are being used (buttons, fields, dropdowns, tabs)
- HUMAN-EDITABLE: Generate clear, structured commands that humans can easily modify

{timeline}

INTERACTION SUMMARY:
{summary}

VIDEO ANALYSIS REQUIREMENTS:
IDENTIFY UI ELEMENTS: For each interaction, identify the specific UI element being used
- Login fields, buttons, menu items
- Search bars, dropdown menus, data grids
- Tabs, panels, dialog boxes
- Action buttons, navigation elements

UNDERSTAND CONTEXT: Determine the purpose of each action
- What screen/module is the user in?
- What type of data are they entering?
- What workflow step are they performing?

DETECT PATTERNS: Recognize common interaction patterns
- Login sequence
- Menu navigation
- Search and filter operations
- Data entry workflows
- Confirmation and submission steps

RPA COMMAND STRUCTURE:
Generate commands in this human-readable format:

1. LOGIN & SETUP:
"Login to the application using username [USERNAME] and password [PASSWORD], then click Login button. Navigate to [MODULE] by clicking on [GROUP] and then Start."

2. NAVIGATION & SEARCH:
"On the main page, type '[SEARCH_TERM]' in the search field and press Enter. In the [SECTION] area, locate the [ELEMENT_TYPE] for '[VALUE]' and [ACTION]."

3. DATA ENTRY:
"In the [FORM/GRID], locate the '[FIELD_NAME]' field and type '[VALUE]'. Use Tab to move to the next field. For dropdown fields, type '[OPTION]' directly to select."

4. COMPLETION:
"Click the '[BUTTON_NAME]' button to [ACTION_PURPOSE]. If confirmation dialog appears, click '[RESPONSE]'. Wait for processing to complete."

Generate structured, contextual RPA commands that describe the specific UI elements and their purposes based on what you see in the video."#
    )
}
