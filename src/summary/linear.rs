use serde::Deserialize;

use super::{IssueTracker, SummaryError};

pub const LINEAR_ENDPOINT: &str = "https://api.linear.app/graphql";

/// Issue fields the summary screen lists before generation finishes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinearIssue {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<LinearState>,
    #[serde(default)]
    pub project: Option<LinearProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinearState {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub state_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinearProject {
    #[serde(default)]
    pub name: Option<String>,
}

/// Issues under `data.viewer.assignedIssues.nodes`; anything unexpected
/// reads as no issues
pub fn assigned_issues(response: &serde_json::Value) -> Vec<LinearIssue> {
    response
        .pointer("/data/viewer/assignedIssues/nodes")
        .and_then(|nodes| nodes.as_array())
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|node| serde_json::from_value(node.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Assigned issues updated within `days`, skipping anything still in backlog
pub fn assigned_issues_query(days: u32) -> String {
    format!(
        "query{{viewer{{assignedIssues(filter:{{updatedAt:{{gt:\"-P{}D\"}},state:{{type:{{nin:[\"backlog\"]}}}}}}){{nodes{{id title url description updatedAt state{{id name color type}}project{{id name description}}attachments{{nodes{{url title subtitle}}}}comments{{nodes{{id body}}}}}}}}}}}}",
        days
    )
}

pub struct LinearClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl LinearClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SummaryError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SummaryError::MissingApiKey("Linear"));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: LINEAR_ENDPOINT.to_string(),
        })
    }
}

impl IssueTracker for LinearClient {
    async fn fetch_assigned_issues(&self, since_days: u32) -> Result<serde_json::Value, SummaryError> {
        let body = serde_json::json!({
            "query": assigned_issues_query(since_days),
            "variables": {}
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .header("content-type", "application/json; charset=utf-8")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Status {
                service: "Linear",
                code,
                body,
            });
        }

        Ok(resp.json::<serde_json::Value>().await?)
    }
}
