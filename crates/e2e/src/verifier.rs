//! Endpoint verification - one HTTP call per endpoint, classified
//!
//! Nothing here returns an error for a misbehaving service. Transport
//! errors, unexpected status codes and contract mismatches all become an
//! [`Outcome`] so the run can move on to the next case.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::contract::{self, RenderData, RenderResponse, CONFIG, HEALTH};
use crate::error::E2eResult;
use crate::payload::{RenderKind, RenderRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

/// Why an outcome is not a plain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    /// Timeout or connection error on this call
    Transport,
    /// Non-200 status
    HttpStatus,
    /// HTTP 200 with a body that does not fit the contract
    Format,
    /// Health reported a status other than `ok`
    Degraded,
    /// Render response with `success: false`
    Rejected,
    /// Image or request body could not be written
    Artifact,
}

/// Classified result of one endpoint call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub endpoint: String,
    pub style: Option<String>,
    pub verdict: Verdict,
    pub finding: Option<Finding>,
    pub http_status: Option<u16>,
    pub details: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

impl Outcome {
    fn new(endpoint: &str, style: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            style: style.map(str::to_string),
            verdict: Verdict::Pass,
            finding: None,
            http_status: None,
            details: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    fn warn(mut self, finding: Finding) -> Self {
        self.verdict = Verdict::Warn;
        self.finding = Some(finding);
        self
    }

    fn fail(mut self, finding: Finding) -> Self {
        self.verdict = Verdict::Fail;
        self.finding = Some(finding);
        self
    }

    fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    /// Record an artifact persistence problem without discarding the call result
    pub fn artifact_failed(&mut self, reason: impl Into<String>) {
        if self.verdict == Verdict::Pass {
            self.verdict = Verdict::Warn;
            self.finding = Some(Finding::Artifact);
        }
        self.details.push(reason.into());
    }

    pub fn label(&self) -> String {
        match &self.style {
            Some(style) => format!("{} [{}]", self.endpoint, style),
            None => self.endpoint.clone(),
        }
    }

    fn log(&self) {
        let summary = self.details.first().map(String::as_str).unwrap_or("");
        match self.verdict {
            Verdict::Pass => info!("✓ {} {}", self.label(), summary),
            Verdict::Warn => warn!("⚠ {} - {}", self.label(), self.details.join("; ")),
            Verdict::Fail => error!("✗ {} - {}", self.label(), self.details.join("; ")),
        }
    }
}

/// Result of the connectivity precheck
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connectivity {
    Reachable { status: u16 },
    Unreachable { reason: String },
}

impl Connectivity {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Connectivity::Reachable { .. })
    }
}

/// Statuses the precheck accepts as "something is listening"
const REACHABLE_STATUSES: [u16; 3] = [200, 404, 500];

/// Render call outcome plus the image payload when the call passed
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub outcome: Outcome,
    pub data: Option<RenderData>,
}

struct RawResponse {
    status: StatusCode,
    body: String,
}

pub struct EndpointVerifier {
    client: reqwest::Client,
    config: HarnessConfig,
}

impl EndpointVerifier {
    pub fn new(config: HarnessConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Loose reachability probe on the health path
    pub async fn check_connectivity(&self) -> Connectivity {
        let url = self.config.endpoint_url(HEALTH.path);
        let timeout = self.config.timeouts.connectivity();
        info!("Checking connectivity: {}", url);

        match self.client.get(&url).timeout(timeout).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if REACHABLE_STATUSES.contains(&status) {
                    info!("✓ Service reachable (HTTP {})", status);
                    Connectivity::Reachable { status }
                } else {
                    let reason = format!("unexpected response: HTTP {}", status);
                    error!("✗ Service not usable: {}", reason);
                    Connectivity::Unreachable { reason }
                }
            }
            Err(e) => {
                let reason = describe_transport_error(&e, timeout);
                error!("✗ Cannot reach {}: {}", self.config.base_url, reason);
                Connectivity::Unreachable { reason }
            }
        }
    }

    /// GET health: `status` and `timestamp` required, `status == "ok"` for a pass
    pub async fn verify_health(&self) -> Outcome {
        let outcome = Outcome::new(HEALTH.name, None);
        let outcome = match self.get(HEALTH.path, self.config.timeouts.request()).await {
            Err(reason) => outcome.fail(Finding::Transport).detail(reason),
            Ok(raw) => classify_health(outcome, raw),
        };
        outcome.log();
        outcome
    }

    /// GET config: `imageStyles` and `imageTypes`, both sequences
    pub async fn verify_config(&self) -> Outcome {
        let outcome = Outcome::new(CONFIG.name, None);
        let outcome = match self.get(CONFIG.path, self.config.timeouts.request()).await {
            Err(reason) => outcome.fail(Finding::Transport).detail(reason),
            Ok(raw) => classify_config(outcome, raw),
        };
        outcome.log();
        outcome
    }

    /// POST a render request and check the response contract
    pub async fn verify_render(&self, kind: RenderKind, payload: &RenderRequest) -> RenderOutcome {
        let contract = contract::render_contract(kind);
        let outcome = Outcome::new(contract.name, Some(payload.style().key()));
        let url = self.config.endpoint_url(contract.path);
        let timeout = self.config.timeouts.render();
        debug!("{:?} {} ({})", contract.method, url, payload.style());

        let sent = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await;

        let raw = match sent {
            Ok(resp) => read_body(resp, timeout).await,
            Err(e) => Err(describe_transport_error(&e, timeout)),
        };

        let result = match raw {
            Err(reason) => RenderOutcome {
                outcome: outcome.fail(Finding::Transport).detail(reason),
                data: None,
            },
            Ok(raw) => classify_render(outcome, raw),
        };
        result.outcome.log();
        result
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<RawResponse, String> {
        let url = self.config.endpoint_url(path);
        debug!("GET {}", url);
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(resp) => read_body(resp, timeout).await,
            Err(e) => Err(describe_transport_error(&e, timeout)),
        }
    }
}

async fn read_body(resp: reqwest::Response, timeout: Duration) -> Result<RawResponse, String> {
    let status = resp.status();
    match resp.text().await {
        Ok(body) => Ok(RawResponse { status, body }),
        Err(e) => Err(describe_transport_error(&e, timeout)),
    }
}

fn describe_transport_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("timed out after {} ms", timeout.as_millis())
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    }
}

/// Non-200 responses surface the raw body instead of parsing it
fn http_failure(outcome: Outcome, raw: &RawResponse) -> Outcome {
    outcome
        .fail(Finding::HttpStatus)
        .detail(format!("HTTP {}", raw.status.as_u16()))
        .detail(format!("response body: {}", raw.body))
}

fn parse_json(outcome: Outcome, raw: &RawResponse) -> Result<(Outcome, Value), Outcome> {
    match serde_json::from_str::<Value>(&raw.body) {
        Ok(body) => {
            debug!(
                "{} response:\n{}",
                outcome.endpoint,
                serde_json::to_string_pretty(&body).unwrap_or_default()
            );
            Ok((outcome, body))
        }
        Err(e) => Err(outcome
            .fail(Finding::Format)
            .detail(format!("response is not JSON: {}", e))
            .detail(format!("response body: {}", raw.body))),
    }
}

fn classify_health(mut outcome: Outcome, raw: RawResponse) -> Outcome {
    outcome.http_status = Some(raw.status.as_u16());
    if raw.status != StatusCode::OK {
        return http_failure(outcome, &raw);
    }
    let (outcome, body) = match parse_json(outcome, &raw) {
        Ok(parsed) => parsed,
        Err(outcome) => return outcome,
    };

    let check = HEALTH.validate(&body);
    if !check.passed() {
        let mut outcome = outcome
            .warn(Finding::Format)
            .detail("response format does not match contract");
        outcome.details.extend(check.describe());
        return outcome;
    }

    match body["status"].as_str() {
        Some("ok") => outcome.detail(format!("status ok at {}", body["timestamp"])),
        other => outcome
            .warn(Finding::Degraded)
            .detail(format!("service reports status {}", other.unwrap_or("?"))),
    }
}

fn classify_config(mut outcome: Outcome, raw: RawResponse) -> Outcome {
    outcome.http_status = Some(raw.status.as_u16());
    if raw.status != StatusCode::OK {
        return http_failure(outcome, &raw);
    }
    let (mut outcome, body) = match parse_json(outcome, &raw) {
        Ok(parsed) => parsed,
        Err(outcome) => return outcome,
    };

    let check = CONFIG.validate(&body);
    if !check.passed() {
        outcome = outcome.warn(Finding::Format);
        outcome.details.extend(check.describe());
    }

    for (key, label) in [("imageStyles", "image styles"), ("imageTypes", "image types")] {
        if let Some(entries) = body.get(key).and_then(Value::as_array) {
            outcome.details.push(format!("{} supported: {}", label, entries.len()));
            for (i, entry) in entries.iter().enumerate() {
                let text = entry.as_str().map(str::to_string).unwrap_or_else(|| entry.to_string());
                outcome.details.push(format!("  {}. {}", i + 1, text));
            }
        }
    }
    for key in ["defaultImageStyle", "defaultImageType", "defaultScreenshotQuality"] {
        if let Some(value) = body.get(key) {
            outcome.details.push(format!("{}: {}", key, value));
        }
    }
    outcome
}

fn classify_render(mut outcome: Outcome, raw: RawResponse) -> RenderOutcome {
    outcome.http_status = Some(raw.status.as_u16());
    if raw.status != StatusCode::OK {
        return RenderOutcome {
            outcome: http_failure(outcome, &raw),
            data: None,
        };
    }
    let (outcome, body) = match parse_json(outcome, &raw) {
        Ok(parsed) => parsed,
        Err(outcome) => return RenderOutcome { outcome, data: None },
    };

    let check = contract::validate_render(&body);
    if !check.passed() {
        let mut outcome = outcome
            .fail(Finding::Format)
            .detail("response format does not match contract");
        outcome.details.extend(check.describe());
        return RenderOutcome { outcome, data: None };
    }

    match RenderResponse::from_value(&body) {
        Some(RenderResponse::Success(data)) => {
            let outcome = outcome
                .detail(format!("image type {}", data.image_type.extension()))
                .detail(format!("generated at {}", data.timestamp))
                .detail(format!("base64 length {}", data.image_base64.len()));
            RenderOutcome {
                outcome,
                data: Some(data),
            }
        }
        Some(RenderResponse::Failure { error, message }) => {
            let mut outcome = outcome
                .fail(Finding::Rejected)
                .detail("service returned success: false");
            if let Some(error) = error {
                outcome.details.push(format!("error: {}", error));
            }
            if let Some(message) = message {
                outcome.details.push(format!("message: {}", message));
            }
            RenderOutcome { outcome, data: None }
        }
        None => RenderOutcome {
            outcome: outcome
                .fail(Finding::Format)
                .detail("render data does not decode into image payload fields"),
            data: None,
        },
    }
}
