use serde::{Deserialize, Serialize};

/// Project-grouped status produced by the text generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub projects: Vec<ReportProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProject {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub issues: Vec<ReportIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportIssue {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl StatusReport {
    /// Decode generated text, tolerating a surrounding markdown code fence
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        let body = body.strip_suffix("```").unwrap_or(body).trim();
        serde_json::from_str(body)
    }

    pub fn issue_count(&self) -> usize {
        self.projects.iter().map(|p| p.issues.len()).sum()
    }

    /// Markdown rendering for the summary screen
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for project in &self.projects {
            let title = project.title.as_deref().unwrap_or("Untitled project");
            out.push_str(&format!("## {}\n\n", title));
            for issue in &project.issues {
                let label = issue.label.as_deref().unwrap_or_default();
                let label = match issue.link.as_deref() {
                    Some(link) if !link.is_empty() => format!("{} ({})", label, link),
                    _ => label.to_string(),
                };
                out.push_str(&format!(
                    "* `{}` **{}**\n",
                    issue.status.as_deref().unwrap_or("?"),
                    label
                ));
                if let Some(summary) = issue.summary.as_deref().filter(|s| !s.trim().is_empty()) {
                    out.push_str(&format!("  {}\n", summary.trim()));
                }
            }
            out.push('\n');
        }
        out
    }
}
