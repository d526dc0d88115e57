use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;
use crate::Config;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(fg_color).bg(bg_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Timeline:\n");
    text.push_str(&format!("  {} / {} or ←/→: Previous / next day\n", key(&kb.previous_day), key(&kb.next_day)));
    text.push_str(&format!("  {}: Jump to today\n", key(&kb.today)));
    text.push_str(&format!("  {} / {}: Add daily / weekly entry\n", key(&kb.add_daily), key(&kb.add_weekly)));
    text.push('\n');

    text.push_str("Entry:\n");
    text.push_str(&format!("  {} / {}: Move between tasks\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} or Enter: Edit task label\n", key(&kb.edit)));
    text.push_str(&format!("  {}: New task below\n", key(&kb.new_task)));
    text.push_str(&format!("  {}: Delete task\n", key(&kb.delete_task)));
    text.push_str(&format!("  {}: Cycle icon\n", key(&kb.cycle_icon)));
    text.push_str(&format!("  {} / {}: Indent / outdent\n", key(&kb.indent), key(&kb.outdent)));
    text.push_str(&format!("  {} / {}: Move task up / down\n", key(&kb.move_up), key(&kb.move_down)));
    text.push_str(&format!("  {}: Switch daily / weekly\n", key(&kb.toggle_type)));
    text.push_str(&format!("  {}: Show the day's other entry\n", key(&kb.switch_entry)));
    text.push_str(&format!("  {}: Copy to clipboard\n", key(&kb.copy)));
    text.push_str(&format!("  {}: Delete entry\n", key(&kb.delete_entry)));
    text.push('\n');

    text.push_str("Editing:\n");
    text.push_str("  Enter: New task below\n");
    text.push_str("  Backspace on empty label: Outdent, then remove task\n");
    text.push_str("  Delete on empty label: Remove task\n");
    text.push_str("  ↑/↓: Previous / next task\n");
    text.push_str("  Tab / Shift+Tab: Indent / outdent\n");
    text.push_str("  Ctrl+←/→: Word left / right\n");
    text.push_str("  Ctrl+Z: Undo\n");
    text.push_str("  Esc: Finish editing\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Status summary\n", key(&kb.summary)));
    text.push_str(&format!("  {} or ?: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}
