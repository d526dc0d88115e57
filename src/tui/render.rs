use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::{Mode, SummaryState};
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    date_switcher::render_date_switcher,
    entry_view::{render_entry_view, EntryView},
    help::render_help,
    status_bar::render_status_bar,
    summary_view::render_summary_view,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Weekly")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    render_date_switcher(
        f,
        layout.timeline_area,
        &app.timeline.buckets,
        app.selected_date(),
        app.timeline.today,
        &app.config,
    );

    if app.ui.mode == Mode::Summary {
        render_summary_view(f, layout.main_area, &app.summary.state, &app.config, app.ui.summary_scroll);
    } else {
        let pending = app.pending_navigation().is_some();
        let entry = app.ui.current_entry.and_then(|id| app.repository.entry(id));
        let view = EntryView {
            entry,
            focus: &app.focus,
            editor: &mut app.editor,
            direction: app.timeline.direction,
            pending,
        };
        render_entry_view(f, layout.main_area, view, &app.config);
    }

    if app.ui.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
    }

    if app.ui.mode == Mode::ConfirmDelete {
        if let Some(entry) = app.current_entry() {
            render_confirm_delete(f, f.area(), entry, app.ui.delete_modal_selection, &app.config);
        }
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::ConfirmDelete => vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()],
        Mode::Editing => vec![
            "Enter: New task".to_string(),
            "Tab/Shift+Tab: Indent".to_string(),
            "↑/↓: Move".to_string(),
            "Esc: Done".to_string(),
        ],
        Mode::Summary => {
            let mut hints = vec!["Esc: Back".to_string(), "r: Refresh".to_string()];
            if matches!(app.summary.state, SummaryState::Ready(_)) {
                hints.push(format!("{}: Copy", key(&kb.copy)));
                hints.push(format!("{}/{}: Scroll", key(&kb.list_up), key(&kb.list_down)));
            }
            hints
        }
        Mode::View => vec![
            format!("{}: Quit", key(&kb.quit)),
            format!("{}/{}: Day", key(&kb.previous_day), key(&kb.next_day)),
            format!("{}: Edit", key(&kb.edit)),
            format!("{}: New", key(&kb.new_task)),
            format!("{}: Icon", key(&kb.cycle_icon)),
            format!("{}: Copy", key(&kb.copy)),
            format!("{}: Summary", key(&kb.summary)),
            format!("{}: Help", key(&kb.help)),
        ],
    }
}
