use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::editing::{EditState, FocusController};
use crate::models::{Entry, Task};
use crate::timeline::Direction;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::editor::Editor;
use crate::Config;

/// Spaces per indent level
pub const INDENT_WIDTH: usize = 2;

/// Columns before the label text: indent, glyph, space
pub fn label_offset(task: &Task) -> usize {
    task.indent as usize * INDENT_WIDTH + task.icon.glyph().chars().count() + 1
}

pub fn entry_title(entry: &Entry, direction: Direction) -> String {
    let arrow = match direction {
        Direction::Forward => "▶ ",
        Direction::Backward => "◀ ",
        Direction::None => "",
    };
    let kind = if entry.is_weekly() { "Weekly" } else { "Daily" };
    format!("{}{} · {}", arrow, kind, entry.date().format("%a %-d %b %Y"))
}

pub struct EntryView<'a> {
    pub entry: Option<&'a Entry>,
    pub focus: &'a FocusController,
    pub editor: &'a mut Editor,
    pub direction: Direction,
    pub pending: bool,
}

pub fn render_entry_view(f: &mut Frame, area: Rect, view: EntryView<'_>, config: &Config) {
    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let muted = parse_color(&theme.muted);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg = if theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&theme.highlight_fg)
    };

    let Some(entry) = view.entry else {
        let message = if view.pending { "Loading..." } else { "No entry for this day" };
        let paragraph = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Entry"))
            .style(Style::default().fg(muted));
        f.render_widget(paragraph, area);
        return;
    };

    let title_style = if entry.is_weekly() {
        Style::default().fg(parse_color(&theme.weekly_marker)).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(fg_color).add_modifier(Modifier::BOLD)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(entry_title(entry, view.direction), title_style));
    let inner = block.inner(area);
    let label_width = inner.width as usize;

    let mut selected = None;
    let mut editing_row = None;
    let items: Vec<ListItem> = entry
        .tasks
        .iter()
        .enumerate()
        .map(|(position, task)| {
            let indent = " ".repeat(task.indent as usize * INDENT_WIDTH);
            let glyph = Span::styled(format!("{}{} ", indent, task.icon.glyph()), Style::default().fg(fg_color));
            let state = view.focus.state_of(task.id);
            if state != EditState::Idle {
                selected = Some(position);
            }

            let label = match state {
                EditState::Editing => {
                    let width = label_width.saturating_sub(label_offset(task));
                    view.editor.update_horizontal_scroll(width.saturating_sub(1));
                    editing_row = Some((position, label_offset(task)));
                    Span::styled(view.editor.visible_text(width), Style::default().fg(fg_color))
                }
                _ if task.label.is_empty() => Span::styled("…", Style::default().fg(muted)),
                _ => Span::styled(task.label.clone(), Style::default().fg(fg_color)),
            };
            ListItem::new(Line::from(vec![glyph, label]))
        })
        .collect();

    let highlight = if editing_row.is_some() {
        Style::default().add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default().fg(highlight_fg).bg(highlight_bg)
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);

    if let Some((position, offset)) = editing_row {
        let row = position.saturating_sub(state.offset());
        let x = inner.x as usize + offset + view.editor.visible_cursor();
        let x = x.min(inner.right().saturating_sub(1) as usize) as u16;
        let y = inner.y + row as u16;
        if y < inner.bottom() {
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, Icon};
    use chrono::NaiveDate;

    #[test]
    fn label_offset_counts_indent_and_glyph() {
        let task = Task::new(Icon::Todo, "x").with_indent(2);
        assert_eq!(label_offset(&task), 4 + Icon::Todo.glyph().chars().count() + 1);
    }

    #[test]
    fn title_names_type_date_and_direction() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let entry = Entry::on_date(day, EntryType::Weekly, vec![]);
        assert_eq!(entry_title(&entry, Direction::None), "Weekly · Wed 5 Mar 2025");
        assert!(entry_title(&entry, Direction::Backward).starts_with("◀ "));
    }
}
