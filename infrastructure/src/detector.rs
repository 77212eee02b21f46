//! Challenge detector over fetched page markup
//!
//! Fetches the target page and scans it for well-known challenge widget
//! markers. A browser-automation detector can replace this behind the
//! same port.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use trisolve_application::{ChallengeDetector, DetectionReport, SolveTask};
use trisolve_domain::DomainError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker substring to reported challenge kind
const MARKERS: &[(&str, &str)] = &[
    ("g-recaptcha", "recaptcha"),
    ("grecaptcha", "recaptcha"),
    ("h-captcha", "hcaptcha"),
    ("cf-turnstile", "turnstile"),
    ("challenge-platform", "turnstile"),
    ("funcaptcha", "funcaptcha"),
    ("arkose", "funcaptcha"),
];

/// Detects challenge widgets by scanning page markup for known markers
pub struct MarkerDetector {
    client: reqwest::Client,
}

impl MarkerDetector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeDetector for MarkerDetector {
    async fn detect(&self, task: &SolveTask) -> Result<DetectionReport, DomainError> {
        let response = self
            .client
            .get(&task.url)
            .send()
            .await
            .map_err(|e| DomainError::Detection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Detection(format!(
                "fetch failed with HTTP {status}"
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::Detection(e.to_string()))?;

        let report = scan_markup(&body);
        debug!(url = %task.url, found = report.found, kind = ?report.captcha_kind, "Detection scan finished");
        Ok(report)
    }
}

/// Scan markup for the first known challenge marker
fn scan_markup(body: &str) -> DetectionReport {
    let lowered = body.to_lowercase();
    for (marker, kind) in MARKERS {
        if lowered.contains(marker) {
            let mut report = DetectionReport::found(*kind);
            report.details = Some(format!("marker '{marker}'"));
            return report;
        }
    }
    DetectionReport::not_found()
}
