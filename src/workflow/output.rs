//! Output artifact formatting and atomic persistence.
//!
//! Generated command files carry a fixed comment header recording provenance
//! (source files, interaction count, sampling rate) and a closing marker so
//! downstream tooling can verify the file was written completely. Writes go
//! through a temp file in the destination directory and a rename, so a failed
//! generation never leaves a truncated artifact behind.

use crate::{Error, Result};
use chrono::Local;
use std::path::Path;
use tracing::info;

/// Closing marker appended to every generated artifact
pub const END_MARKER: &str = "# END OF WORKFLOW";

/// Provenance recorded in the artifact header
#[derive(Debug, Clone, PartialEq)]
pub struct OutputHeader {
    pub video_name: String,
    pub log_name: String,
    pub total_interactions: usize,
    pub fps: f64,
}

/// Wrap generated commands in the structured header and footer.
pub fn format_artifact(commands: &str, header: &OutputHeader) -> String {
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"# RPA Workflow Commands
# Generated: {generated}
# Source Video: {video}
# Source JSON: {log}
# Processing Mode: Enhanced Video-Aware Analysis
# Total Interactions: {interactions}
# Frame Rate Used: {fps} fps
#
# INSTRUCTIONS FOR EDITING:
# - This file is designed to be human-readable and editable
# - Modify values in brackets [VALUE] as needed
# - Adjust timing and sequences based on your requirements
# - Test workflow sections individually before full execution

{commands}

{END_MARKER}
# Commands generated using video analysis for UI context
# Interaction timestamps preserved for reference
"#,
        video = header.video_name,
        log = header.log_name,
        interactions = header.total_interactions,
        fps = header.fps,
    )
}

/// Recover provenance from a previously written artifact.
///
/// Returns `None` when the text does not carry the expected header lines or
/// the end marker, which signals a truncated or foreign file.
pub fn parse_header(text: &str) -> Option<OutputHeader> {
    if !text.contains(END_MARKER) {
        return None;
    }

    let mut video_name = None;
    let mut log_name = None;
    let mut total_interactions = None;
    let mut fps = None;

    for line in text.lines().take(20) {
        if let Some(rest) = line.strip_prefix("# Source Video: ") {
            video_name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("# Source JSON: ") {
            log_name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("# Total Interactions: ") {
            total_interactions = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("# Frame Rate Used: ") {
            fps = rest.trim().strip_suffix(" fps").and_then(|v| v.parse().ok());
        }
    }

    Some(OutputHeader {
        video_name: video_name?,
        log_name: log_name?,
        total_interactions: total_interactions?,
        fps: fps?,
    })
}

/// Write the artifact atomically: temp file in the same directory, then rename.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
    }

    let temp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .map_err(|e| Error::OutputWrite(format!("cannot create temp file: {}", e)))?;
    std::fs::write(temp.path(), contents)
        .map_err(|e| Error::OutputWrite(format!("cannot write temp file: {}", e)))?;
    temp.persist(path)
        .map_err(|e| Error::OutputWrite(format!("cannot persist {}: {}", path.display(), e)))?;

    info!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> OutputHeader {
        OutputHeader {
            video_name: "session.mp4".to_string(),
            log_name: "session_interactions.json".to_string(),
            total_interactions: 42,
            fps: 0.8,
        }
    }

    #[test]
    fn test_artifact_structure() {
        let artifact = format_artifact("1. Click the Login button.", &sample_header());
        assert!(artifact.starts_with("# RPA Workflow Commands"));
        assert!(artifact.contains("# Source Video: session.mp4"));
        assert!(artifact.contains("# Source JSON: session_interactions.json"));
        assert!(artifact.contains("# Total Interactions: 42"));
        assert!(artifact.contains("# Frame Rate Used: 0.8 fps"));
        assert!(artifact.contains("1. Click the Login button."));
        assert!(artifact.contains(END_MARKER));
    }

    #[test]
    fn test_header_round_trip() {
        let header = sample_header();
        let artifact = format_artifact("commands here", &header);
        let parsed = parse_header(&artifact).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_parse_rejects_missing_end_marker() {
        let header = sample_header();
        let artifact = format_artifact("commands", &header);
        let truncated = artifact.replace(END_MARKER, "");
        assert!(parse_header(&truncated).is_none());
    }

    #[test]
    fn test_parse_rejects_foreign_text() {
        assert!(parse_header("just some unrelated notes").is_none());
    }

    #[test]
    fn test_write_artifact_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/out/workflow.txt");
        write_artifact(&path, "contents").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "contents");
    }

    #[test]
    fn test_write_artifact_replaces_existing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("workflow.txt");
        write_artifact(&path, "first").unwrap();
        write_artifact(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
