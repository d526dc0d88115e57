use std::cmp;

use ratatui::layout::{Alignment, Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use ratskin::RatSkin;
use termimad::minimad::Text as MinimadText;

use crate::tui::app::SummaryState;
use crate::tui::widgets::color::parse_color;
use crate::Config;

/// Markdown shown for each summary state
pub fn summary_markdown(state: &SummaryState) -> String {
    match state {
        SummaryState::Idle => "Press **r** to generate a status summary.".to_string(),
        SummaryState::Loading(stage) => format!("*{}*", stage),
        SummaryState::Ready(result) if result.report.projects.is_empty() => {
            format!("No projects in the summary for the last {} days.", result.days)
        }
        SummaryState::Ready(result) => result.report.to_markdown(),
        SummaryState::Failed(error) => format!("**Summary failed**\n\n{}\n\nPress **r** to retry.", error),
    }
}

pub fn render_summary_view(f: &mut Frame, area: Rect, state: &SummaryState, config: &Config, scroll_offset: u16) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let horizontal = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let content_area = horizontal[0];
    let scrollbar_area = horizontal[1];

    let viewport_height = content_area.height.saturating_sub(2) as usize;
    let text_width = content_area.width.saturating_sub(2);

    let markdown = summary_markdown(state);
    let content_lines = RatSkin::default().parse(MinimadText::from(markdown.as_str()), text_width);
    let lines: Vec<Line> = content_lines
        .into_iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans)
        })
        .collect();

    let total_lines = lines.len();
    let max_scroll = total_lines.saturating_sub(viewport_height);
    let scroll_offset = cmp::min(scroll_offset as usize, max_scroll);
    let end_line = cmp::min(scroll_offset + viewport_height, total_lines);
    let visible = Text::from(lines[scroll_offset.min(end_line)..end_line].to_vec());

    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let title = match state {
        SummaryState::Ready(result) => format!("Status Summary ({} issues, {} days)", result.report.issue_count(), result.days),
        SummaryState::Loading(_) => "Status Summary (working)".to_string(),
        _ => "Status Summary".to_string(),
    };

    let alignment = if matches!(state, SummaryState::Loading(_) | SummaryState::Idle) {
        Alignment::Center
    } else {
        Alignment::Left
    };
    let paragraph = Paragraph::new(visible)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().fg(fg_color))
        .alignment(alignment)
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(scroll_offset);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
