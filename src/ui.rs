use crate::classifier::{DayResult, DayStatus};
use crate::engine::AttendanceReport;
use crate::views::{missing_punches, MissingPunch};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    EmployeeSummary,
    DailyResults,
    MissingPunches,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::EmployeeSummary => Page::DailyResults,
            Page::DailyResults => Page::MissingPunches,
            Page::MissingPunches => Page::EmployeeSummary,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::EmployeeSummary => Page::MissingPunches,
            Page::DailyResults => Page::EmployeeSummary,
            Page::MissingPunches => Page::DailyResults,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::EmployeeSummary => "Employee Summary",
            Page::DailyResults => "Daily Results",
            Page::MissingPunches => "Missing Punches",
        }
    }
}

/// Daily results filter, bound to keys 1-4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Complete,
    Incomplete,
    Absent,
}

impl StatusFilter {
    pub fn accepts(&self, status: &DayStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Complete => status.is_complete(),
            StatusFilter::Incomplete => status.is_incomplete(),
            StatusFilter::Absent => status.is_absent(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Complete => "Complete",
            StatusFilter::Incomplete => "Incomplete",
            StatusFilter::Absent => "Absent",
        }
    }
}

pub struct App {
    pub report: AttendanceReport,
    pub missing: Vec<MissingPunch>,
    /// Indices into report.daily that pass the active filter
    pub filtered_days: Vec<usize>,
    pub filter: StatusFilter,
    pub current_page: Page,
    pub summary_state: TableState,
    pub daily_state: TableState,
    pub missing_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(report: AttendanceReport) -> Self {
        let missing = missing_punches(&report);

        let mut app = Self {
            filtered_days: (0..report.daily.len()).collect(),
            report,
            missing,
            filter: StatusFilter::All,
            current_page: Page::EmployeeSummary,
            summary_state: TableState::default(),
            daily_state: TableState::default(),
            missing_state: TableState::default(),
            show_detail: false,
        };

        if !app.report.summaries.is_empty() {
            app.summary_state.select(Some(0));
        }
        if !app.filtered_days.is_empty() {
            app.daily_state.select(Some(0));
        }
        if !app.missing.is_empty() {
            app.missing_state.select(Some(0));
        }
        app
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_day(&self) -> Option<&DayResult> {
        self.daily_state
            .selected()
            .and_then(|i| self.filtered_days.get(i))
            .and_then(|&idx| self.report.daily.get(idx))
    }

    pub fn apply_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.filtered_days = self
            .report
            .daily
            .iter()
            .enumerate()
            .filter(|(_, d)| filter.accepts(&d.status))
            .map(|(i, _)| i)
            .collect();

        // Reset selection to first item
        if self.filtered_days.is_empty() {
            self.daily_state.select(None);
        } else {
            self.daily_state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::EmployeeSummary => self.report.summaries.len(),
            Page::DailyResults => self.filtered_days.len(),
            Page::MissingPunches => self.missing.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::EmployeeSummary => &mut self.summary_state,
            Page::DailyResults => &mut self.daily_state,
            Page::MissingPunches => &mut self.missing_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.current_state();
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn stats(&self) -> AttendanceStats {
        let mut stats = AttendanceStats::default();

        for day in &self.report.daily {
            match day.status {
                DayStatus::Complete => stats.complete_days += 1,
                DayStatus::Incomplete { .. } => stats.incomplete_days += 1,
                DayStatus::Absent => stats.absent_days += 1,
            }
        }
        stats.compliant_employees = self.report.summaries.iter().filter(|s| s.is_compliant()).count();

        stats
    }
}

#[derive(Default)]
pub struct AttendanceStats {
    pub complete_days: usize,
    pub incomplete_days: usize,
    pub absent_days: usize,
    pub compliant_employees: usize,
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('1') => show_filtered(app, StatusFilter::All),
                KeyCode::Char('2') => show_filtered(app, StatusFilter::Complete),
                KeyCode::Char('3') => show_filtered(app, StatusFilter::Incomplete),
                KeyCode::Char('4') => show_filtered(app, StatusFilter::Absent),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => {
                    if app.current_len() > 0 {
                        app.current_state().select(Some(0));
                    }
                }
                KeyCode::End => {
                    let len = app.current_len();
                    if len > 0 {
                        app.current_state().select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn show_filtered(app: &mut App, filter: StatusFilter) {
    app.apply_filter(filter);
    app.current_page = Page::DailyResults;
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::DailyResults {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        render_daily(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::EmployeeSummary => render_summaries(f, chunks[1], app),
            Page::DailyResults => render_daily(f, chunks[1], app),
            Page::MissingPunches => render_missing(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn status_color(status: &DayStatus) -> Color {
    match status {
        DayStatus::Complete => Color::Green,
        DayStatus::Incomplete { .. } => Color::Yellow,
        DayStatus::Absent => Color::Red,
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn highlight() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let pages = [Page::EmployeeSummary, Page::DailyResults, Page::MissingPunches];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Compliant: {}/{}", stats.compliant_employees, app.report.summaries.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("✓ {}", stats.complete_days),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("◐ {}", stats.incomplete_days),
        Style::default().fg(Color::Yellow),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("✗ {}", stats.absent_days),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_summaries(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&[
        "Employee", "Department", "Days", "Complete", "Incomplete", "Absent", "Late", "Missing",
        "Compliance", "Status",
    ]);

    let rows: Vec<Row> = app
        .report
        .summaries
        .iter()
        .map(|s| {
            let color = if s.is_compliant() { Color::Green } else { Color::Red };
            Row::new(vec![
                Cell::from(truncate(&s.employee_id, 24)),
                Cell::from(truncate(&s.department, 18)),
                Cell::from(s.total_working_days.to_string()),
                Cell::from(s.complete_days.to_string()),
                Cell::from(s.incomplete_days.to_string()),
                Cell::from(s.absent_days.to_string()),
                Cell::from(s.late_count.to_string()),
                Cell::from(s.missing_checks.to_string()),
                Cell::from(format!("{:.2}%", s.compliance_rate)),
                Cell::from(s.final_status.to_string()).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(20),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(15),
        ],
    )
    .header(header)
    .block(bordered(" Employee Summary ".to_string()))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.summary_state);
}

fn render_daily(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&[
        "Date", "Employee", "Department", "Status", "Matched", "Late", "Late min", "Compliance",
    ]);

    let rows: Vec<Row> = app
        .filtered_days
        .iter()
        .filter_map(|&i| app.report.daily.get(i))
        .map(|d| {
            Row::new(vec![
                Cell::from(d.date.to_string()),
                Cell::from(truncate(&d.employee_id, 24)),
                Cell::from(truncate(&d.department, 18)),
                Cell::from(d.status.to_string()).style(Style::default().fg(status_color(&d.status))),
                Cell::from(format!("{}/{}", d.matched_count, d.required_count)),
                Cell::from(d.late_count.to_string()),
                Cell::from(format!("{:.1}", d.late_minutes)),
                Cell::from(format!("{:.2}%", d.compliance_rate)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(bordered(format!(" Daily Results [{}] ", app.filter.label())))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.daily_state);
}

fn render_missing(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Date", "Employee", "Department", "Slot", "Required", "Window"]);

    let rows: Vec<Row> = app
        .missing
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.date.to_string()),
                Cell::from(truncate(&m.employee_id, 24)),
                Cell::from(truncate(&m.department, 18)),
                Cell::from(truncate(&m.slot_label, 24)),
                Cell::from(m.required.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(m.window.clone()).style(Style::default().fg(Color::Red)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Length(20),
            Constraint::Length(26),
            Constraint::Length(18),
            Constraint::Length(15),
        ],
    )
    .header(header)
    .block(bordered(format!(" Missing Punches ({}) ", app.missing.len())))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.missing_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = match app.current_page {
        Page::EmployeeSummary => app.summary_state.selected(),
        Page::DailyResults => app.daily_state.selected(),
        Page::MissingPunches => app.missing_state.selected(),
    }
    .map(|i| i + 1)
    .unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.current_len()),
        Style::default().fg(Color::Cyan),
    )];

    if app.filter != StatusFilter::All {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", app.filter.label()),
            Style::default().fg(Color::Green),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Slots | "));
    status_spans.push(Span::styled("1-4", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" All/Complete/Incomplete/Absent | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Slot Matches ");

    let Some(day) = app.selected_day() else {
        f.render_widget(Paragraph::new("No day selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Employee: ", label),
            Span::raw(day.employee_id.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Date: ", label),
            Span::raw(day.date.to_string()),
        ]),
        Line::from(vec![
            Span::styled("  Status: ", label),
            Span::styled(day.status.to_string(), Style::default().fg(status_color(&day.status))),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
    ];

    for m in &day.matches {
        let (mark, color, actual) = match (m.matched_punch(), m.delay_minutes()) {
            (Some(punch), Some(delay)) => (
                "✓",
                Color::Green,
                format!("{} ({:+.1} min)", punch.format("%H:%M:%S"), delay),
            ),
            _ => ("✗", Color::Red, format!("none in {}", m.window.display())),
        };

        content.push(Line::from(vec![
            Span::styled(format!("  {} ", mark), Style::default().fg(color)),
            Span::styled(format!("{:<12}", m.slot.display_time()), Style::default().fg(Color::White)),
            Span::styled(truncate(&m.slot.label, 24), Style::default().fg(Color::DarkGray)),
        ]));
        content.push(Line::from(vec![
            Span::raw("      "),
            Span::styled(actual, Style::default().fg(color)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendanceConfig;
    use crate::engine::AttendanceEngine;
    use crate::records::RawTable;

    fn app() -> App {
        let punches = RawTable::from_records(
            &["Name", "Department", "Date", "Time"],
            &[
                &["Ahmad", "Admin", "2023-01-15", "08:00"],
                &["Ahmad", "Admin", "2023-01-16", "08:00"],
            ],
        );
        let shifts = RawTable::from_records(
            &["Name", "Shift Date"],
            &[&["Ahmad", "2023-01-15"], &["Ahmad", "2023-01-17"]],
        );
        let report = AttendanceEngine::new(AttendanceConfig::default())
            .unwrap()
            .calculate(&punches, &shifts)
            .unwrap();
        App::new(report)
    }

    #[test]
    fn test_filter_by_status() {
        let mut app = app();
        assert_eq!(app.filtered_days.len(), 2);

        app.apply_filter(StatusFilter::Absent);
        assert_eq!(app.filtered_days.len(), 1);
        assert_eq!(app.selected_day().unwrap().date.to_string(), "2023-01-17");

        app.apply_filter(StatusFilter::Complete);
        assert!(app.filtered_days.is_empty());
        assert!(app.selected_day().is_none());
    }

    #[test]
    fn test_navigation_wraps_per_page() {
        let mut app = app();
        app.current_page = Page::DailyResults;

        app.next();
        assert_eq!(app.daily_state.selected(), Some(1));
        app.next();
        assert_eq!(app.daily_state.selected(), Some(0));
        app.previous();
        assert_eq!(app.daily_state.selected(), Some(1));
        // Other pages keep their own selection
        assert_eq!(app.summary_state.selected(), Some(0));
    }

    #[test]
    fn test_page_cycle() {
        let page = Page::EmployeeSummary;
        assert_eq!(page.next().next().next(), page);
        assert_eq!(page.previous(), Page::MissingPunches);
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("أحمد عبدالله", 6), "أحم...");
        assert_eq!(truncate("Ahmad", 10), "Ahmad");
    }
}
