//! Workflow generation orchestrator.
//!
//! Drives the full pipeline: extract the session from the interaction log,
//! build the sample timeline, correlate events to video samples, gate on
//! validation, call the generative model with bounded retry, post-validate
//! the returned commands, and persist the artifact atomically.

use crate::correlate::correlate;
use crate::gemini::{CommandModel, GenerateOptions};
use crate::session::{InteractionLog, Session};
use crate::timeline::SampleTimeline;
use crate::validation::{Severity, ValidationReport, Validator, VideoMetadata};
use crate::workflow::output::{self, OutputHeader};
use crate::workflow::prompt;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrator settings, derived from the application config
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Video sampling rate in frames per second
    pub fps: f64,
    /// Attempts per generation call, including the first
    pub max_retries: u32,
    pub options: GenerateOptions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fps: 0.8,
            max_retries: 3,
            options: GenerateOptions::default(),
        }
    }
}

/// Accounting for one completed generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub output_path: PathBuf,
    pub total_interactions: usize,
    pub malformed_records: usize,
    /// Attempts the successful model call consumed
    pub attempts: u32,
    /// Warning findings from input and output validation
    pub warnings: Vec<String>,
}

/// End-to-end pipeline from recorded session to workflow artifact.
pub struct WorkflowGenerator<M: CommandModel> {
    model: M,
    validator: Validator,
    config: GeneratorConfig,
}

impl<M: CommandModel> WorkflowGenerator<M> {
    pub fn new(model: M, validator: Validator, config: GeneratorConfig) -> Self {
        Self {
            model,
            validator,
            config,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run extraction and input validation only, without calling the model.
    pub fn validate_inputs(
        &self,
        video: &VideoMetadata,
        log_path: &Path,
    ) -> Result<(Session, ValidationReport)> {
        let log = InteractionLog::load(log_path)?;
        let session = log.extract()?;
        let report = self.validator.validate(video, &session, self.config.fps);
        Ok((session, report))
    }

    /// Generate workflow commands for one recorded session.
    ///
    /// Fails with [`Error::ValidationFailed`] before any network call when the
    /// inputs carry error-severity findings, and never leaves a partial file
    /// at `output_path`.
    pub async fn generate(
        &self,
        video: &VideoMetadata,
        log_path: &Path,
        output_path: &Path,
    ) -> Result<GenerationOutcome> {
        let (session, report) = self.validate_inputs(video, log_path)?;
        let error_count = report.error_count();
        if error_count > 0 {
            return Err(Error::ValidationFailed {
                report,
                error_count,
            });
        }
        let mut warnings: Vec<String> = report
            .findings()
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .map(|f| f.message.clone())
            .collect();
        for warning in &warnings {
            warn!("input validation: {}", warning);
        }

        let timeline = SampleTimeline::build(session.duration, self.config.fps)?;
        let enriched = correlate(&session, &timeline);
        debug!(
            "correlated {} events against {} sample windows",
            enriched.len(),
            timeline.len()
        );

        let prompt_text = prompt::build_prompt(&session, &enriched);
        let (commands, attempts) = self.call_with_retry(&video.path, &prompt_text).await?;
        info!(
            "model returned {} chars after {} attempt(s)",
            commands.len(),
            attempts
        );

        let output_findings = self.validator.validate_output(&commands);
        let output_errors = output_findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        if output_errors > 0 {
            return Err(Error::ValidationFailed {
                report: ValidationReport::new(output_findings),
                error_count: output_errors,
            });
        }
        for finding in &output_findings {
            if finding.severity == Severity::Warning {
                warn!("output validation: {}", finding.message);
                warnings.push(finding.message.clone());
            }
        }

        let header = OutputHeader {
            video_name: file_name_of(&video.path),
            log_name: file_name_of(log_path),
            total_interactions: session.len(),
            fps: self.config.fps,
        };
        let artifact = output::format_artifact(&commands, &header);
        output::write_artifact(output_path, &artifact)?;

        Ok(GenerationOutcome {
            output_path: output_path.to_path_buf(),
            total_interactions: session.len(),
            malformed_records: session.malformed_records,
            attempts,
            warnings,
        })
    }

    /// Call the model, retrying transient failures with exponential backoff.
    async fn call_with_retry(&self, video_path: &Path, prompt_text: &str) -> Result<(String, u32)> {
        let max_attempts = self.config.max_retries.max(1);
        let mut last_message = String::new();

        for attempt in 1..=max_attempts {
            match self
                .model
                .generate(video_path, prompt_text, &self.config.options)
                .await
            {
                Ok(text) => return Ok((text, attempt)),
                Err(Error::ExternalCall { message, .. }) => {
                    warn!(
                        "generation attempt {}/{} failed: {}",
                        attempt, max_attempts, message
                    );
                    last_message = message;
                    if attempt < max_attempts {
                        let backoff = Duration::from_secs(1 << attempt.min(6));
                        debug!("retrying in {:?}", backoff);
                        tokio::time::sleep(backoff).await;
                    }
                }
                // Local failures (missing video file, bad config) are not retried
                Err(other) => return Err(other),
            }
        }

        Err(Error::ExternalCall {
            attempts: max_attempts,
            message: last_message,
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted model: fails `failures` times, then returns `response`.
    struct ScriptedModel {
        failures: u32,
        calls: AtomicU32,
        response: String,
    }

    impl ScriptedModel {
        fn succeeding(response: &str) -> Self {
            Self {
                failures: 0,
                calls: AtomicU32::new(0),
                response: response.to_string(),
            }
        }

        fn failing_first(failures: u32, response: &str) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                response: response.to_string(),
            }
        }
    }

    impl CommandModel for ScriptedModel {
        async fn generate(
            &self,
            _video_path: &Path,
            _prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(Error::ExternalCall {
                    attempts: 1,
                    message: format!("simulated failure {}", call),
                })
            } else {
                Ok(self.response.clone())
            }
        }
    }

    fn good_commands() -> String {
        let mut text = String::from(
            "1. Click the Login button on the start screen.\n\
             2. Type 'report' in the search field and press Enter.\n\
             3. Select the first result and open the details panel.\n",
        );
        while text.len() < 120 {
            text.push_str("4. Wait for the page to finish loading.\n");
        }
        text
    }

    fn write_log(dir: &Path, events_json: &str) -> PathBuf {
        let path = dir.join("session_interactions.json");
        std::fs::write(&path, events_json).unwrap();
        path
    }

    fn write_video(dir: &Path) -> PathBuf {
        let path = dir.join("session.mp4");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        path
    }

    fn rich_log_json(duration: f64) -> String {
        let mut mouse = Vec::new();
        for i in 0..6 {
            mouse.push(format!(
                r#"{{"type": "mouse_press", "button": "left", "timestamp": {}, "position": {{"x": 100, "y": 200}}}}"#,
                5.0 + i as f64 * 8.0
            ));
        }
        format!(
            r#"{{"session_info": {{"duration": {}}}, "mouse_interactions": [{}], "keyboard_events": []}}"#,
            duration,
            mouse.join(",")
        )
    }

    fn generator(model: ScriptedModel, max_retries: u32) -> WorkflowGenerator<ScriptedModel> {
        WorkflowGenerator::new(
            model,
            Validator::new(ValidationConfig::default()),
            GeneratorConfig {
                max_retries,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_successful_generation_writes_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(dir.path(), &rich_log_json(60.0));
        let output_path = dir.path().join("workflow.txt");

        let generator = generator(ScriptedModel::succeeding(&good_commands()), 3);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let outcome = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.total_interactions, 6);
        let written = std::fs::read_to_string(&output_path).unwrap();
        assert!(written.contains("Click the Login button"));
        let header = output::parse_header(&written).unwrap();
        assert_eq!(header.total_interactions, 6);
        assert_eq!(header.fps, 0.8);
        assert_eq!(header.video_name, "session.mp4");
    }

    #[tokio::test]
    async fn test_empty_log_fails_before_model_call() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(
            dir.path(),
            r#"{"session_info": {"duration": 60.0}, "mouse_interactions": [], "keyboard_events": []}"#,
        );
        let output_path = dir.path().join("workflow.txt");

        let model = ScriptedModel::succeeding(&good_commands());
        let generator = generator(model, 3);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let err = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedInput(_)));
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 0);
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn test_missing_video_file_is_validation_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_path = write_log(dir.path(), &rich_log_json(60.0));
        let output_path = dir.path().join("workflow.txt");

        let generator = generator(ScriptedModel::succeeding(&good_commands()), 3);
        let video = VideoMetadata::probe(dir.path().join("missing.mp4"), 60.0).unwrap();
        let err = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap_err();

        match err {
            Error::ValidationFailed { error_count, .. } => assert!(error_count >= 1),
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 0);
        assert!(!output_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(dir.path(), &rich_log_json(60.0));
        let output_path = dir.path().join("workflow.txt");

        let generator = generator(ScriptedModel::failing_first(2, &good_commands()), 3);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let outcome = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert!(output_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_reports_attempts_and_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(dir.path(), &rich_log_json(60.0));
        let output_path = dir.path().join("workflow.txt");

        let generator = generator(ScriptedModel::failing_first(10, &good_commands()), 3);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let err = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap_err();

        match err {
            Error::ExternalCall { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("simulated failure 3"));
            }
            other => panic!("expected ExternalCall, got {:?}", other),
        }
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 3);
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn test_empty_model_output_fails_post_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(dir.path(), &rich_log_json(60.0));
        let output_path = dir.path().join("workflow.txt");

        let generator = generator(ScriptedModel::succeeding(""), 1);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let err = generator
            .generate(&video, &log_path, &output_path)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ValidationFailed { .. }));
        assert!(!output_path.exists());
    }

    #[test]
    fn test_validate_inputs_surfaces_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = write_video(dir.path());
        let log_path = write_log(dir.path(), &rich_log_json(60.0));

        let generator = generator(ScriptedModel::succeeding("x"), 1);
        let video = VideoMetadata::probe(&video_path, 60.0).unwrap();
        let (session, report) = generator.validate_inputs(&video, &log_path).unwrap();
        assert_eq!(session.len(), 6);
        assert!(report.is_valid());
    }
}
