//! Plain-text renderings for pasting into chat.

use crate::models::Entry;
use crate::summary::{ReportIssue, StatusReport};

pub const EOD_HEADER: &str = "*EOD Update*";

/// One `"<indent>:icon: label"` line per task. Daily entries get the
/// `*EOD Update*` header line first.
pub fn format_entry_as_plain_text(entry: &Entry) -> String {
    let mut lines = Vec::with_capacity(entry.tasks.len() + 1);
    if entry.is_daily() {
        lines.push(EOD_HEADER.to_string());
    }
    lines.extend(entry.tasks.iter().map(ToString::to_string));
    lines.join("\n")
}

/// Header, then each project as a bold title followed by its issues
pub fn format_status_report(report: &StatusReport) -> String {
    let mut lines = vec![EOD_HEADER.to_string()];
    for project in &report.projects {
        if let Some(title) = project.title.as_deref().filter(|t| !t.trim().is_empty()) {
            lines.push(format!("*{}*", title));
        }
        lines.extend(project.issues.iter().map(format_issue));
    }
    lines.join("\n")
}

fn format_issue(issue: &ReportIssue) -> String {
    let status = issue.status.as_deref().unwrap_or_default();
    let label = issue.label.as_deref().unwrap_or_default();
    let mut line = match issue.link.as_deref().filter(|l| !l.is_empty()) {
        Some(link) => format!("{} [{}]({})", status, label, link),
        None => format!("{} {}", status, label),
    };
    if let Some(summary) = issue.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        line.push_str("\n\t");
        line.push_str(summary.trim());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, Icon, Task};
    use crate::summary::ReportProject;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    }

    #[test]
    fn daily_entry_gets_header() {
        let entry = Entry::on_date(day(), EntryType::Daily, vec![Task::new(Icon::Todo, "Ship feature")]);
        assert_eq!(format_entry_as_plain_text(&entry), "*EOD Update*\n:todo: Ship feature");
    }

    #[test]
    fn weekly_entry_has_no_header_and_keeps_indent() {
        let entry = Entry::on_date(
            day(),
            EntryType::Weekly,
            vec![
                Task::new(Icon::Check, "Launch"),
                Task::new(Icon::Progress, "Docs").with_indent(2),
            ],
        );
        assert_eq!(format_entry_as_plain_text(&entry), ":check: Launch\n  :progress: Docs");
    }

    #[test]
    fn status_report_lists_projects_and_links() {
        let report = StatusReport {
            projects: vec![ReportProject {
                title: Some("Billing".into()),
                issues: vec![
                    ReportIssue {
                        status: Some(":check:".into()),
                        label: Some("Invoice export".into()),
                        link: Some("https://linear.app/x/issue/B-1".into()),
                        summary: Some("Merged and deployed".into()),
                    },
                    ReportIssue {
                        status: Some(":todo:".into()),
                        label: Some("Refunds".into()),
                        link: None,
                        summary: None,
                    },
                ],
            }],
        };
        assert_eq!(
            format_status_report(&report),
            "*EOD Update*\n*Billing*\n:check: [Invoice export](https://linear.app/x/issue/B-1)\n\tMerged and deployed\n:todo: Refunds"
        );
    }

    #[test]
    fn untitled_project_skips_title_line() {
        let report = StatusReport {
            projects: vec![ReportProject {
                title: None,
                issues: vec![ReportIssue {
                    status: Some(":progress:".into()),
                    label: Some("Search".into()),
                    link: None,
                    summary: Some("  ".into()),
                }],
            }],
        };
        assert_eq!(format_status_report(&report), "*EOD Update*\n:progress: Search");
    }
}
