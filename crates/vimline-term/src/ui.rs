use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use vimline_core::session::Severity;
use vimline_core::{Mode, SessionState};

/// Buffer area, status bar (1 line) and command line (1 line).
pub fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let [content_area, status_area, command_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    (content_area, status_area, command_area)
}

/// Display width of the first `column` characters of `line`.
fn display_width(line: &str, column: usize) -> usize {
    line.chars()
        .take(column)
        .map(|c| c.width().unwrap_or(0))
        .sum()
}

/// Offset `origin` by `delta` cells, saturating at the edge of the screen.
fn cell(origin: u16, delta: usize) -> u16 {
    origin.saturating_add(u16::try_from(delta).unwrap_or(u16::MAX))
}

/// Render the visible buffer lines, `~` past the end, and place the cursor.
pub fn render_buffer(frame: &mut Frame, area: Rect, session: &SessionState, top: usize) {
    let buf = session.buffer.as_ref();
    let lines: Vec<Line> = (top..top + area.height as usize)
        .map(|index| match buf.line(index) {
            Some(text) => Line::from(text.to_string()),
            None => Line::from(Span::styled("~", Style::default().fg(Color::Blue))),
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);

    if session.mode() != Mode::CommandLine {
        let cursor = buf.cursor();
        let line = buf.line(cursor.line).unwrap_or_default();
        let x = display_width(line, cursor.column).min(area.width.saturating_sub(1) as usize);
        let y = cursor.line.saturating_sub(top);
        frame.set_cursor_position((cell(area.x, x), cell(area.y, y)));
    }
}

/// Mode, file name, pending keys and cursor position.
pub fn render_status_bar(frame: &mut Frame, area: Rect, session: &SessionState, file_name: &str) {
    let status = session.status();
    let mode_style = match session.mode() {
        Mode::Insert | Mode::Replace => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        Mode::Visual(_) => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        _ => Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
    };
    let position = format!("{}:{}", status.cursor.line + 1, status.cursor.column + 1);

    let left = vec![
        Span::styled(format!(" {} ", status.mode), mode_style),
        Span::raw(" "),
        Span::styled(file_name.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    let used: usize = left.iter().map(|s| s.content.width()).sum();
    let right = format!("{}  {position} ", status.pending);
    let gap = (area.width as usize).saturating_sub(used + right.width());

    let mut spans = left;
    spans.push(Span::raw(" ".repeat(gap)));
    spans.push(Span::styled(right, Style::default().add_modifier(Modifier::DIM)));

    let bar = Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_widget(bar, area);
}

/// The command line while it is open, otherwise the last message.
pub fn render_bottom_line(frame: &mut Frame, area: Rect, session: &SessionState) {
    let status = session.status();
    if let Some(command_line) = status.command_line {
        let line = Line::from(vec![
            Span::styled(":", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(command_line.text.clone()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        let x = 1 + display_width(&command_line.text, command_line.cursor);
        frame.set_cursor_position((cell(area.x, x), area.y));
        return;
    }

    if let Some(message) = status.message {
        let style = match message.severity {
            Severity::Error => Style::default().fg(Color::Red),
            Severity::Info => Style::default(),
        };
        // Listings (`:registers`, `:map`) span several lines.
        let text = message.text.lines().collect::<Vec<_>>().join(" | ");
        frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
    }
}
