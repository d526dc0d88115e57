//! Issue tracker → text generation pipeline behind the status summary screen.

mod gemini;
mod linear;
mod report;

pub use gemini::{GeminiClient, DEFAULT_MODEL};
pub use linear::{assigned_issues, LinearClient, LinearIssue};
pub use report::{ReportIssue, ReportProject, StatusReport};

use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned {code}: {body}")]
    Status {
        service: &'static str,
        code: u16,
        body: String,
    },
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("No {0} API key configured")]
    MissingApiKey(&'static str),
    #[error("Response contained no text")]
    EmptyResponse,
    #[error("No assigned issues updated in the last {days} days")]
    NoIssues { days: u32 },
}

/// Source of the issues to summarize
pub trait IssueTracker {
    /// Raw JSON of the assigned, non-backlog issues updated in the last
    /// `since_days` days
    fn fetch_assigned_issues(
        &self,
        since_days: u32,
    ) -> impl Future<Output = Result<serde_json::Value, SummaryError>> + Send;
}

pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        content: &str,
        temperature: f32,
    ) -> impl Future<Output = Result<String, SummaryError>> + Send;
}

/// Inputs for one summary run
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub prompt: String,
    pub temperature: f32,
    pub days: u32,
}

/// Progress notifications for the loading indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryStage {
    QueryingIssues { days: u32 },
    Generating { issues: usize },
    Decoding,
}

impl std::fmt::Display for SummaryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryStage::QueryingIssues { days } => write!(f, "Querying Linear ({} days)...", days),
            SummaryStage::Generating { issues } => write!(f, "Summarizing {} issues...", issues),
            SummaryStage::Decoding => write!(f, "Reading response..."),
        }
    }
}

/// Finished summary: the decoded report plus the raw generated text
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResult {
    pub report: StatusReport,
    pub raw: String,
    pub days: u32,
}

/// Fetch issues, widen the range by one day once if nothing came back, then
/// have the generator turn them into a [`StatusReport`].
pub async fn summarize_status<T, G>(
    tracker: &T,
    generator: &G,
    request: &SummaryRequest,
    mut progress: impl FnMut(SummaryStage) + Send,
) -> Result<SummaryResult, SummaryError>
where
    T: IssueTracker + Sync,
    G: TextGenerator + Sync,
{
    let mut days = request.days.max(1);
    progress(SummaryStage::QueryingIssues { days });
    let mut issues = tracker.fetch_assigned_issues(days).await?;

    if assigned_issues(&issues).is_empty() {
        days += 1;
        warn!(days, "no issues returned, retrying with a wider range");
        progress(SummaryStage::QueryingIssues { days });
        issues = tracker.fetch_assigned_issues(days).await?;
        if assigned_issues(&issues).is_empty() {
            return Err(SummaryError::NoIssues { days });
        }
    }

    let count = assigned_issues(&issues).len();
    info!(count, days, "fetched issues");
    progress(SummaryStage::Generating { issues: count });
    let content = serde_json::to_string(&issues)?;
    let raw = generator
        .generate(&request.prompt, &content, request.temperature)
        .await?;

    progress(SummaryStage::Decoding);
    let report = StatusReport::parse(&raw).inspect_err(|e| {
        warn!(error = %e, "generated text did not match the report schema");
    })?;
    info!(projects = report.projects.len(), "summary ready");

    Ok(SummaryResult { report, raw, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeTracker {
        responses: Mutex<Vec<serde_json::Value>>,
        calls: Mutex<Vec<u32>>,
    }

    impl FakeTracker {
        fn new(responses: Vec<serde_json::Value>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl IssueTracker for FakeTracker {
        async fn fetch_assigned_issues(&self, since_days: u32) -> Result<serde_json::Value, SummaryError> {
            self.calls.lock().unwrap().push(since_days);
            let mut responses = self.responses.lock().unwrap();
            Ok(if responses.is_empty() {
                issues(0)
            } else {
                responses.remove(0)
            })
        }
    }

    struct FakeGenerator {
        reply: String,
        seen: Mutex<Option<(String, String, f32)>>,
    }

    impl FakeGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(None),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str, content: &str, temperature: f32) -> Result<String, SummaryError> {
            *self.seen.lock().unwrap() = Some((prompt.to_string(), content.to_string(), temperature));
            Ok(self.reply.clone())
        }
    }

    fn issues(count: usize) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = (0..count)
            .map(|i| serde_json::json!({"id": format!("ISS-{i}"), "title": format!("Issue {i}")}))
            .collect();
        serde_json::json!({"data": {"viewer": {"assignedIssues": {"nodes": nodes}}}})
    }

    fn request() -> SummaryRequest {
        SummaryRequest {
            prompt: "Summarize".into(),
            temperature: 0.2,
            days: 1,
        }
    }

    const REPLY: &str = r#"{"projects":[{"title":"Core","issues":[{"status":":check:","label":"Fix login"}]}]}"#;

    #[tokio::test]
    async fn summarizes_without_retry_when_issues_exist() {
        let tracker = FakeTracker::new(vec![issues(2)]);
        let generator = FakeGenerator::replying(REPLY);
        let mut stages = Vec::new();

        let result = summarize_status(&tracker, &generator, &request(), |s| stages.push(s))
            .await
            .unwrap();

        assert_eq!(tracker.calls(), vec![1]);
        assert_eq!(result.report.projects[0].issues[0].label.as_deref(), Some("Fix login"));
        assert_eq!(result.days, 1);
        assert_eq!(stages.last(), Some(&SummaryStage::Decoding));

        let (prompt, content, temperature) = generator.seen.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "Summarize");
        assert!(content.contains("ISS-1"));
        assert!((temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_result_retries_once_with_one_more_day() {
        let tracker = FakeTracker::new(vec![issues(0), issues(1)]);
        let generator = FakeGenerator::replying(REPLY);

        let result = summarize_status(&tracker, &generator, &request(), |_| {}).await.unwrap();
        assert_eq!(tracker.calls(), vec![1, 2]);
        assert_eq!(result.days, 2);
    }

    #[tokio::test]
    async fn retry_is_bounded() {
        let tracker = FakeTracker::new(vec![issues(0), issues(0), issues(3)]);
        let generator = FakeGenerator::replying(REPLY);

        let err = summarize_status(&tracker, &generator, &request(), |_| {}).await.unwrap_err();
        assert!(matches!(err, SummaryError::NoIssues { days: 2 }));
        assert_eq!(tracker.calls(), vec![1, 2]);
        assert!(generator.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_reply_is_a_decode_error() {
        let tracker = FakeTracker::new(vec![issues(1)]);
        let generator = FakeGenerator::replying("Here is your summary!");

        let err = summarize_status(&tracker, &generator, &request(), |_| {}).await.unwrap_err();
        assert!(matches!(err, SummaryError::Decode(_)));
    }
}
