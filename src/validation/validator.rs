//! Input and output validation.
//!
//! The checks run in independent groups that never short-circuit each other:
//! a missing video does not suppress the structural checks on an interaction
//! log that is present. Content-quality issues only ever downgrade to
//! warnings; error severity is reserved for conditions that make generation
//! meaningless (no events, no duration, unreadable video).

use crate::session::Session;
use crate::validation::report::{Category, ValidationFinding, ValidationReport};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

/// Globally cached regex patterns compiled once on first use.
struct CachedPatterns {
    action_line: Regex,
    placeholder: Regex,
    refusal: Regex,
}

fn cached_patterns() -> &'static CachedPatterns {
    static PATTERNS: OnceLock<CachedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CachedPatterns {
        action_line: Regex::new(
            r"(?i)\b(click|double-click|type|press|select|login|log in|navigate|open|close|scroll|enter|wait|switch)\b",
        )
        .unwrap(),
        placeholder: Regex::new(r"\[[A-Z_]+\]").unwrap(),
        refusal: Regex::new(r"(?i)(i cannot|i'm unable|as an ai|i am unable|error:)").unwrap(),
    })
}

/// Video artifact metadata as seen by the validator.
///
/// The core never decodes the container; it treats the video purely as
/// `(path, duration, size)` plus an opaque handle handed to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub path: PathBuf,
    /// Declared playback duration in seconds
    pub duration_secs: f64,
    pub size_bytes: u64,
}

impl VideoMetadata {
    /// Stat `path` and combine with the declared duration.
    pub fn probe<P: AsRef<Path>>(path: P, duration_secs: f64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(Error::InvalidDuration(duration_secs));
        }
        Ok(Self {
            path,
            duration_secs,
            size_bytes,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Tunable validation thresholds.
///
/// All values were empirically chosen for UI recordings; they are
/// configuration defaults, not hardcoded law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Hard video size cap in MB (error when exceeded)
    pub max_video_mb: f64,
    /// Soft video size cap in MB (warning when exceeded)
    pub recommended_video_mb: f64,
    /// Malformed-record ratio above which structure degrades to a warning
    pub malformed_ratio_warn: f64,
    /// Below this density the session looks like missed capture
    pub min_events_per_minute: f64,
    /// Above this density the session looks like recording noise
    pub max_events_per_second: f64,
    /// Relative duration drift between video and log tolerated silently
    pub duration_drift_ratio: f64,
    /// Sessions longer than this draw a complexity warning
    pub long_session_secs: f64,
    /// Generated output shorter than this draws a warning
    pub min_command_chars: usize,
    /// Generated output longer than this draws a warning
    pub max_command_chars: usize,
    /// Minimum count of recognizable action lines in the output
    pub min_action_lines: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_video_mb: 100.0,
            recommended_video_mb: 50.0,
            malformed_ratio_warn: 0.1,
            min_events_per_minute: 2.0,
            max_events_per_second: 20.0,
            duration_drift_ratio: 0.05,
            long_session_secs: 600.0,
            min_command_chars: 100,
            max_command_chars: 5000,
            min_action_lines: 3,
        }
    }
}

/// Runs the pre-generation and post-generation check groups.
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate both input artifacts and their mutual synchronization.
    ///
    /// `fps` is the video sampling rate; the synchronization tail check
    /// tolerates up to one sample period of overshoot.
    pub fn validate(
        &self,
        video: &VideoMetadata,
        session: &Session,
        fps: f64,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.extend(self.check_video(video));
        report.extend(self.check_structure(session));
        report.extend(self.check_content(session));
        report.extend(self.check_synchronization(video, session, fps));
        report
    }

    fn check_video(&self, video: &VideoMetadata) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        if !video.path.exists() {
            findings.push(
                ValidationFinding::error(
                    Category::Video,
                    format!("video file not found: {}", video.path.display()),
                )
                .with_suggestion("check the file path and ensure the video file exists"),
            );
            return findings;
        }

        let extension = video
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            findings.push(
                ValidationFinding::error(
                    Category::Video,
                    format!("unsupported video format '.{}'", extension),
                )
                .with_suggestion("use MP4, MOV, or AVI for best compatibility"),
            );
        }

        let size_mb = video.size_mb();
        if size_mb > self.config.max_video_mb {
            findings.push(
                ValidationFinding::error(
                    Category::Video,
                    format!("video file too large: {:.1} MB", size_mb),
                )
                .with_suggestion(
                    "compress the video or reduce the recording duration; lower resolution works well for UI recordings",
                ),
            );
        } else if size_mb > self.config.recommended_video_mb {
            findings.push(
                ValidationFinding::warning(
                    Category::Video,
                    format!("video file large: {:.1} MB", size_mb),
                )
                .with_suggestion("large files take longer to process and cost more tokens"),
            );
        } else {
            findings.push(ValidationFinding::info(
                Category::Video,
                format!("video file size OK: {:.1} MB", size_mb),
            ));
        }

        findings
    }

    fn check_structure(&self, session: &Session) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let ratio = session.malformed_ratio();

        if ratio > self.config.malformed_ratio_warn {
            findings.push(
                ValidationFinding::warning(
                    Category::Structure,
                    format!(
                        "{} of {} records malformed ({:.0}%)",
                        session.malformed_records,
                        session.malformed_records + session.len(),
                        ratio * 100.0
                    ),
                )
                .with_suggestion("the recorder may have produced a partially corrupt log"),
            );
        } else if session.malformed_records > 0 {
            findings.push(ValidationFinding::info(
                Category::Structure,
                format!("{} malformed record(s) skipped", session.malformed_records),
            ));
        }

        findings
    }

    fn check_content(&self, session: &Session) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        if session.is_empty() {
            findings.push(
                ValidationFinding::error(Category::Content, "no interactions found in session")
                    .with_suggestion("re-record the workflow with user interactions"),
            );
            return findings;
        }

        let per_minute = session.len() as f64 / (session.duration / 60.0);
        let per_second = session.len() as f64 / session.duration;

        if per_minute < self.config.min_events_per_minute {
            findings.push(
                ValidationFinding::warning(
                    Category::Content,
                    format!(
                        "very sparse interactions: {:.1} per minute over {:.1}s",
                        per_minute, session.duration
                    ),
                )
                .with_suggestion("the workflow may be too simple or capture may be incomplete"),
            );
        } else if per_second > self.config.max_events_per_second {
            findings.push(
                ValidationFinding::warning(
                    Category::Content,
                    format!("very dense interactions: {:.1} per second", per_second),
                )
                .with_suggestion("high event rates usually indicate recording noise"),
            );
        } else {
            findings.push(ValidationFinding::info(
                Category::Content,
                format!("{} interaction(s) over {:.1}s", session.len(), session.duration),
            ));
        }

        if session.duration > self.config.long_session_secs {
            findings.push(
                ValidationFinding::warning(
                    Category::Content,
                    format!("long session: {:.1}s", session.duration),
                )
                .with_suggestion("long workflows produce lengthy commands; consider splitting"),
            );
        }

        findings
    }

    fn check_synchronization(
        &self,
        video: &VideoMetadata,
        session: &Session,
        fps: f64,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        let longest = session.duration.max(video.duration_secs);
        if longest > 0.0 {
            let drift = (session.duration - video.duration_secs).abs() / longest;
            if drift > self.config.duration_drift_ratio {
                findings.push(
                    ValidationFinding::warning(
                        Category::Synchronization,
                        format!(
                            "session duration {:.1}s and video duration {:.1}s drift by {:.0}%",
                            session.duration,
                            video.duration_secs,
                            drift * 100.0
                        ),
                    )
                    .with_suggestion("verify that video and log come from the same recording"),
                );
            }
        }

        let period = if fps > 0.0 { 1.0 / fps } else { 0.0 };
        if let Some(last) = session.last_timestamp() {
            if last > video.duration_secs + period {
                findings.push(
                    ValidationFinding::warning(
                        Category::Synchronization,
                        format!(
                            "last interaction at {:.1}s exceeds video end ({:.1}s) by more than one sample period",
                            last, video.duration_secs
                        ),
                    )
                    .with_suggestion("interactions recorded after video cutoff lack visual context"),
                );
            }
        }

        findings
    }

    /// Post-generation quality checks on the generated command text.
    ///
    /// Quality issues are warnings at most; only an empty result is an
    /// error, since there is nothing to write.
    pub fn validate_output(&self, commands: &str) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let trimmed = commands.trim();

        if trimmed.is_empty() {
            findings.push(
                ValidationFinding::error(Category::Output, "no commands generated")
                    .with_suggestion("check the API response and input quality"),
            );
            return findings;
        }

        if trimmed.len() < self.config.min_command_chars {
            findings.push(
                ValidationFinding::warning(
                    Category::Output,
                    format!("generated commands are very short ({} chars)", trimmed.len()),
                )
                .with_suggestion("the workflow may be too simple or generation incomplete"),
            );
        } else if trimmed.len() > self.config.max_command_chars {
            findings.push(
                ValidationFinding::warning(
                    Category::Output,
                    format!("generated commands are very long ({} chars)", trimmed.len()),
                )
                .with_suggestion("consider splitting into smaller workflow sections"),
            );
        }

        let patterns = cached_patterns();
        let action_lines = trimmed
            .lines()
            .filter(|line| patterns.action_line.is_match(line))
            .count();
        if action_lines < self.config.min_action_lines {
            findings.push(
                ValidationFinding::warning(
                    Category::Output,
                    format!(
                        "only {} recognizable action line(s), expected at least {}",
                        action_lines, self.config.min_action_lines
                    ),
                )
                .with_suggestion("commands may be too generic; verify the UI context was captured"),
            );
        }

        if patterns.refusal.is_match(trimmed) {
            findings.push(
                ValidationFinding::warning(
                    Category::Output,
                    "output contains error or refusal markers from the model",
                )
                .with_suggestion("re-run generation or inspect the raw response"),
            );
        }

        if patterns.placeholder.is_match(trimmed) {
            findings.push(
                ValidationFinding::info(
                    Category::Output,
                    "placeholder values found in commands",
                )
                .with_suggestion("replace placeholder values with actual data before execution"),
            );
        }

        findings.push(ValidationFinding::info(
            Category::Output,
            format!("commands generated successfully ({} characters)", trimmed.len()),
        ));

        findings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
