use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::timeline::DayBucket;
use crate::tui::layout::Layout;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::Config;

const MARKER: &str = "•";
/// Markers that fit next to the day number
const MAX_MARKERS: usize = 2;

/// Slice of `len` tiles to draw so that `selected` stays visible, roughly
/// centered, and the strip never runs past either end.
pub fn visible_range(len: usize, selected: usize, visible: usize) -> Range<usize> {
    if len <= visible {
        return 0..len;
    }
    let start = selected.saturating_sub(visible / 2).min(len - visible);
    start..start + visible
}

/// Day tiles: weekday, day number and one marker per entry with tasks
pub fn render_date_switcher(
    f: &mut Frame,
    area: Rect,
    buckets: &[DayBucket],
    selected: NaiveDate,
    today: NaiveDate,
    config: &Config,
) {
    let theme = config.get_active_theme();
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let weekly_color = parse_color(&theme.weekly_marker);
    let muted = parse_color(&theme.muted);

    let visible = (area.width / Layout::TILE_WIDTH).max(1) as usize;
    let selected_index = buckets.iter().position(|b| b.date == selected).unwrap_or(0);
    let range = visible_range(buckets.len(), selected_index, visible);

    for (slot, bucket) in buckets[range].iter().enumerate() {
        let x = area.x + slot as u16 * Layout::TILE_WIDTH;
        let tile = Rect::new(x, area.y, Layout::TILE_WIDTH.min(area.right().saturating_sub(x)), area.height);

        let is_selected = bucket.date == selected;
        let (tile_fg, tile_bg) = if is_selected {
            (get_contrast_text_color(highlight_bg), highlight_bg)
        } else if bucket.date > today {
            (muted, bg_color)
        } else {
            (fg_color, bg_color)
        };
        let base = Style::default().fg(tile_fg).bg(tile_bg);

        let mut day_line = vec![Span::styled(format!("{:>2} ", bucket.date.day()), base)];
        for is_weekly in bucket.markers().take(MAX_MARKERS) {
            let color = if is_weekly { weekly_color } else { tile_fg };
            day_line.push(Span::styled(MARKER, base.fg(color)));
        }

        let weekday = bucket.date.format("%a").to_string();
        let lines = vec![Line::from(Span::styled(weekday, base)), Line::from(day_line)];

        let mut border_style = Style::default().fg(if is_selected { highlight_bg } else { muted });
        if bucket.date == today {
            border_style = border_style.fg(fg_color).add_modifier(Modifier::BOLD);
        }
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(base)
            .block(Block::default().borders(Borders::ALL).border_style(border_style));
        f.render_widget(paragraph, tile);
    }
}
