//! Run orchestration: connectivity precheck, then each endpoint in order

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::artifact::{self, ArtifactWriter};
use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::payload::{self, ImageStyle, RenderKind};
use crate::verifier::{Connectivity, EndpointVerifier, Outcome, Verdict};

/// Which cases a run covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Health, config and every render permutation
    #[default]
    Full,
    /// Health and config only
    Endpoints,
    /// Render permutations only
    Images,
}

/// Steps of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Connectivity,
    Health,
    Config,
    UserInfo,
    AdminList,
    Summary,
}

impl Suite {
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            Suite::Full => &[
                Phase::Connectivity,
                Phase::Health,
                Phase::Config,
                Phase::UserInfo,
                Phase::AdminList,
                Phase::Summary,
            ],
            Suite::Endpoints => &[
                Phase::Connectivity,
                Phase::Health,
                Phase::Config,
                Phase::Summary,
            ],
            Suite::Images => &[
                Phase::Connectivity,
                Phase::UserInfo,
                Phase::AdminList,
                Phase::Summary,
            ],
        }
    }
}

/// Everything a run produced, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub api_base: String,
    pub suite: Suite,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Set when the precheck found no service; no endpoint was called
    pub aborted: Option<String>,
    pub outcomes: Vec<Outcome>,
    /// Image files under the artifact root after the run, with sizes
    pub images: Vec<(PathBuf, u64)>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.count(Verdict::Pass)
    }

    pub fn warned(&self) -> usize {
        self.count(Verdict::Warn)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Fail)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    fn count(&self, verdict: Verdict) -> usize {
        self.outcomes.iter().filter(|o| o.verdict == verdict).count()
    }
}

/// Sequential orchestrator over one verifier and one artifact writer
pub struct TestRunner {
    verifier: EndpointVerifier,
    writer: ArtifactWriter,
    styles: Vec<ImageStyle>,
}

impl TestRunner {
    pub fn new(config: HarnessConfig) -> E2eResult<Self> {
        config.validate()?;
        let writer = ArtifactWriter::new(config.output_dir.clone());
        let verifier = EndpointVerifier::new(config)?;
        Ok(Self {
            verifier,
            writer,
            styles: ImageStyle::ALL.to_vec(),
        })
    }

    /// Restrict the render cases to a subset of styles
    pub fn with_styles(mut self, styles: Vec<ImageStyle>) -> Self {
        self.styles = styles;
        self
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    pub fn config(&self) -> &HarnessConfig {
        self.verifier.config()
    }

    /// Run a suite to completion, or stop right after an unreachable precheck
    pub async fn run(&self, suite: Suite) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport {
            api_base: self.config().api_base(),
            suite,
            started_at: Utc::now(),
            duration_ms: 0,
            aborted: None,
            outcomes: Vec::new(),
            images: Vec::new(),
        };

        info!("OneBot Info Image API check ({:?}) against {}", suite, report.api_base);

        for phase in suite.phases() {
            debug!("Phase: {:?}", phase);
            match phase {
                Phase::Connectivity => {
                    let connectivity = self.verifier.check_connectivity().await;
                    if let Connectivity::Unreachable { reason } = connectivity {
                        error!("Service unreachable, aborting run");
                        report.aborted = Some(reason);
                        break;
                    }
                }
                Phase::Health => report.outcomes.push(self.verifier.verify_health().await),
                Phase::Config => report.outcomes.push(self.verifier.verify_config().await),
                Phase::UserInfo => {
                    self.run_render_cases(RenderKind::UserInfo, &mut report.outcomes)
                        .await
                }
                Phase::AdminList => {
                    self.run_render_cases(RenderKind::AdminList, &mut report.outcomes)
                        .await
                }
                Phase::Summary => {
                    report.images = self.writer.list_images();
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        if !report.is_aborted() {
            info!(
                "Results: {} passed, {} warned, {} failed ({} ms)",
                report.passed(),
                report.warned(),
                report.failed(),
                report.duration_ms
            );
        }
        report
    }

    /// One case per style; a failing style never stops the next one
    async fn run_render_cases(&self, kind: RenderKind, outcomes: &mut Vec<Outcome>) {
        info!("Testing {} ({} style(s))", kind.label(), self.styles.len());
        for style in &self.styles {
            outcomes.push(self.run_render_case(kind, *style).await);
        }
    }

    /// Save the request body, call the endpoint, save the image on success
    pub async fn run_render_case(&self, kind: RenderKind, style: ImageStyle) -> Outcome {
        info!("Case {} with style {}", kind.case_name(), style);
        let request = payload::build_request(kind, self.config().render_options(style));

        let body_saved = self
            .writer
            .save_json(&request, &artifact::request_filename(kind, style));

        let result = self.verifier.verify_render(kind, &request).await;
        let mut outcome = result.outcome;

        match body_saved {
            Ok(path) => outcome.artifacts.push(path),
            Err(e) => {
                error!("Failed to save request body for {}: {}", outcome.label(), e);
                outcome.artifact_failed(format!("request body not saved: {}", e));
            }
        }

        if let Some(data) = result.data {
            let filename = artifact::image_filename(kind, style, data.image_type.extension());
            match self.writer.save_image(&data.image_base64, &filename) {
                Ok(path) => outcome.artifacts.push(path),
                Err(e) => {
                    error!("Failed to save image {}: {}", filename, e);
                    outcome.artifact_failed(format!("image not saved: {}", e));
                }
            }
        }

        outcome
    }

    /// Write the report as pretty JSON to `<output>/test-results.json`
    pub fn write_report(&self, report: &RunReport) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(self.writer.root())?;

        let path = self.writer.root().join("test-results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
