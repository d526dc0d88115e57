use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::info;

use crate::editing::EditKey;
use crate::models::EntryType;
use crate::tui::app::Mode;
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::App;
use crate::utils::{has_primary_modifier, parse_key_binding};

/// Guard that ensures terminal state is restored even on panic
/// If the terminal is left in raw mode or the alternate screen, the user's
/// shell is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Manually restore terminal state (called on normal exit)
    /// After calling this, the guard will do nothing on drop
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Ignore errors in drop - we're already in a cleanup path
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check terminal size before entering alternate screen so the error
    // shows up in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!("tui started");

    loop {
        app.tick();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only process Press events to avoid double-processing on Windows
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if handle_key_event(&mut app, key_event)? {
                        break;
                    }
                }
                // the next draw picks up the new size
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

/// True when `key_event` is the configured binding
fn pressed(binding: &str, key_event: &KeyEvent) -> Result<bool, TuiError> {
    let parsed = parse_key_binding(binding).map_err(TuiError::KeyBindingError)?;
    Ok(parsed.matches(key_event))
}

/// Dispatch one key press. Returns true when the app should quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.ui.mode {
        Mode::Editing => handle_editing_mode(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::ConfirmDelete => handle_delete_confirmation_modal(app, key_event),
        Mode::Summary => handle_summary_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    // modified bindings first so Ctrl+Up is not read as Up
    if pressed(&kb.move_up, &key_event)? {
        app.move_task(-1);
    } else if pressed(&kb.move_down, &key_event)? {
        app.move_task(1);
    } else if pressed(&kb.quit, &key_event)? {
        return Ok(true);
    } else if pressed(&kb.previous_day, &key_event)? || key_event.code == KeyCode::Left {
        app.step_day(-1);
    } else if pressed(&kb.next_day, &key_event)? || key_event.code == KeyCode::Right {
        app.step_day(1);
    } else if pressed(&kb.today, &key_event)? {
        app.go_to_today();
    } else if pressed(&kb.list_up, &key_event)? || key_event.code == KeyCode::Up {
        app.move_focus(EditKey::FocusUp);
    } else if pressed(&kb.list_down, &key_event)? || key_event.code == KeyCode::Down {
        app.move_focus(EditKey::FocusDown);
    } else if pressed(&kb.edit, &key_event)? || key_event.code == KeyCode::Enter {
        app.begin_editing();
    } else if pressed(&kb.new_task, &key_event)? {
        app.new_task();
    } else if pressed(&kb.delete_task, &key_event)? {
        app.delete_task();
    } else if pressed(&kb.cycle_icon, &key_event)? {
        app.cycle_icon();
    } else if pressed(&kb.indent, &key_event)? {
        app.shift_indent(1);
    } else if pressed(&kb.outdent, &key_event)? {
        app.shift_indent(-1);
    } else if pressed(&kb.copy, &key_event)? {
        app.copy_entry();
    } else if pressed(&kb.toggle_type, &key_event)? {
        app.toggle_entry_type();
    } else if pressed(&kb.switch_entry, &key_event)? {
        app.switch_entry();
    } else if pressed(&kb.delete_entry, &key_event)? {
        app.request_delete_entry();
    } else if pressed(&kb.add_daily, &key_event)? {
        app.add_entry(EntryType::Daily);
    } else if pressed(&kb.add_weekly, &key_event)? {
        app.add_entry(EntryType::Weekly);
    } else if pressed(&kb.summary, &key_event)? {
        app.enter_summary_mode();
    } else if pressed(&kb.help, &key_event)? || key_event.code == KeyCode::Char('?') {
        app.enter_help_mode();
    }
    Ok(false)
}

fn handle_editing_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let primary = has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Esc => app.end_editing(),
        KeyCode::Enter => app.edit_key(EditKey::Commit),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::Up => app.edit_key(EditKey::FocusUp),
        KeyCode::Down => app.edit_key(EditKey::FocusDown),
        KeyCode::Tab => app.edit_key(EditKey::IndentIncrease),
        KeyCode::BackTab => app.edit_key(EditKey::IndentDecrease),
        KeyCode::Left if primary => app.editor.move_cursor_word_left(),
        KeyCode::Right if primary => app.editor.move_cursor_word_right(),
        KeyCode::Left => app.editor.move_cursor_left(),
        KeyCode::Right => app.editor.move_cursor_right(),
        KeyCode::Home => app.editor.move_cursor_home(),
        KeyCode::End => app.editor.move_cursor_end(),
        KeyCode::Char('z') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.editor.undo();
        }
        KeyCode::Char(ch) if !primary => app.editor.insert_char(ch),
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let help = app.config.key_bindings.help.clone();
    if key_event.code == KeyCode::Esc || key_event.code == KeyCode::Char('?') || pressed(&help, &key_event)? {
        app.exit_help_mode();
    }
    // Ignore all other keys in help mode
    Ok(false)
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    use crate::tui::widgets::confirm_delete::DELETE_OPTIONS;

    let last = DELETE_OPTIONS.len() - 1;
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            // wraps from the first option to the last
            app.ui.delete_modal_selection = app.ui.delete_modal_selection.checked_sub(1).unwrap_or(last);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.ui.delete_modal_selection = if app.ui.delete_modal_selection >= last {
                0
            } else {
                app.ui.delete_modal_selection + 1
            };
        }
        KeyCode::Enter => {
            if app.ui.delete_modal_selection == 0 {
                app.confirm_delete_entry();
            } else {
                app.cancel_delete();
            }
        }
        KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
    Ok(false)
}

fn handle_summary_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();
    if key_event.code == KeyCode::Esc || pressed(&kb.summary, &key_event)? {
        app.exit_summary_mode();
    } else if key_event.code == KeyCode::Char('r') {
        app.request_summary();
    } else if pressed(&kb.copy, &key_event)? {
        app.copy_summary();
    } else if pressed(&kb.list_up, &key_event)? || key_event.code == KeyCode::Up {
        app.ui.summary_scroll = app.ui.summary_scroll.saturating_sub(1);
    } else if pressed(&kb.list_down, &key_event)? || key_event.code == KeyCode::Down {
        app.ui.summary_scroll = app.ui.summary_scroll.saturating_add(1);
    } else if pressed(&kb.quit, &key_event)? {
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::creation::CreationPolicy;
    use crate::database::Database;
    use crate::repository::EntryRepository;
    use crate::Config;
    use chrono::NaiveDate;

    fn app() -> App {
        let repo = EntryRepository::open(Database::in_memory().unwrap(), CreationPolicy::default()).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let mut app = App::with_clipboard(Config::default(), repo, today, Box::new(MemoryClipboard::default()));
        app.tick();
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn labels(app: &App) -> Vec<(u16, String)> {
        app.current_entry()
            .unwrap()
            .tasks
            .iter()
            .map(|t| (t.indent, t.label.clone()))
            .collect()
    }

    #[test]
    fn typing_an_outline() {
        let mut app = app();
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "Release");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "notes");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(labels(&app), vec![(0, "Release".to_string()), (1, "notes".to_string())]);
    }

    #[test]
    fn view_keys_move_between_days() {
        let mut app = app();
        let today = app.selected_date();
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.selected_date(), today.pred_opt().unwrap());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.selected_date(), today);
    }

    #[test]
    fn delete_modal_cancel_keeps_entry() {
        let mut app = app();
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::View);
        assert!(app.current_entry().is_some());
    }

    #[test]
    fn help_toggles_and_quit_exits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.ui.mode, Mode::Help);
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, Mode::View);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn space_cycles_the_icon() {
        let mut app = app();
        let before = app.focused_task().unwrap().icon;
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.focused_task().unwrap().icon, before.next());
    }
}
