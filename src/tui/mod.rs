//! Ratatui-based terminal UI.
//!
//! Four tabs (Summary, Traffic, Conversion, Behavior) over the same dataset,
//! with a settings panel for the date preset, comparison period, and trend
//! granularity. Pages are built through the shared pipeline, so what the TUI
//! shows always matches the CLI reports.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
};

use crate::app::pipeline;
use crate::domain::{DashboardConfig, DatePreset};
use crate::error::AppError;
use crate::io::Dataset;
use crate::plot::ascii::render_bar_chart;
use crate::report::{Page, PageView, Period, Section, SectionBody, Series, ValueFormat, build_view, series_table};

mod plotters_chart;

use plotters_chart::{TrendChart, legend_color};

const SETTINGS: usize = 3;

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    let dataset = Dataset::load(&config.data_dir);
    let mut app = App::new(config, dataset);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: DashboardConfig,
    dataset: Dataset,
    page: Page,
    period: Option<Period>,
    view: Option<PageView>,
    selected_field: usize,
    scroll: u16,
    status: String,
}

impl App {
    fn new(config: DashboardConfig, dataset: Dataset) -> Self {
        let mut app = Self {
            config,
            dataset,
            page: Page::Summary,
            period: None,
            view: None,
            selected_field: 0,
            scroll: 0,
            status: String::new(),
        };
        app.refresh();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.set_page(self.page.next()),
            KeyCode::BackTab => self.set_page(self.page.prev()),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.set_page(Page::ALL[idx]);
            }
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < SETTINGS {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust(false),
            KeyCode::Right => self.adjust(true),
            KeyCode::PageDown | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(3),
            KeyCode::PageUp | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(3),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            _ => {}
        }
        false
    }

    fn set_page(&mut self, page: Page) {
        if page != self.page {
            self.page = page;
            self.scroll = 0;
            self.rebuild_view();
        }
    }

    fn adjust(&mut self, forward: bool) {
        match self.selected_field {
            0 => {
                let cur = pipeline::effective_preset(&self.config);
                self.config.preset = if forward { cur.next() } else { cur.prev() };
                // Leaving an explicit range: presets resolve against the data from here on.
                self.config.from = None;
                self.config.to = None;
            }
            1 => {
                let cur = self.config.comparison;
                self.config.comparison = if forward { cur.next() } else { cur.prev() };
            }
            _ => self.config.granularity = self.config.granularity.toggle(),
        }
        self.refresh();
    }

    fn reload(&mut self) {
        self.dataset = Dataset::load(&self.config.data_dir);
        tracing::info!(data_dir = %self.config.data_dir.display(), "reloaded dataset");
        self.refresh();
    }

    /// Re-resolve the period and rebuild the current page.
    fn refresh(&mut self) {
        match pipeline::resolve_period(&self.dataset, &self.config) {
            Ok(period) => {
                self.period = Some(period);
                self.rebuild_view();
            }
            Err(e) => {
                self.period = None;
                self.view = None;
                self.status = e.message().to_string();
            }
        }
    }

    fn rebuild_view(&mut self) {
        let Some(period) = &self.period else {
            return;
        };
        let view = build_view(self.page, &self.dataset, period, &pipeline::report_options(&self.config));
        let notices = self.dataset.notices();
        self.status = if notices.is_empty() {
            format!("{} loaded", self.page.title())
        } else {
            notices.join("; ")
        };
        self.view = Some(view);
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let titles: Vec<String> = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {}", i + 1, p.title()))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, rows[0]);

        let caption = self
            .view
            .as_ref()
            .map(|v| v.caption.clone())
            .unwrap_or_else(|| "no period".to_string());
        let line = Line::from(vec![
            Span::styled("kpi", Style::default().fg(Color::Cyan)),
            Span::raw(format!("  {}  ", self.config.data_dir.display())),
            Span::styled(caption, Style::default().fg(Color::Gray)),
        ]);
        frame.render_widget(Paragraph::new(line), rows[1]);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(SETTINGS as u16 + 2)])
            .split(columns[0]);

        self.draw_cards(frame, left[0]);
        self.draw_settings(frame, left[1]);

        let trend = self.view.as_ref().and_then(first_trend);
        if trend.is_some() {
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(45), Constraint::Min(0)])
                .split(columns[1]);
            self.draw_chart(frame, right[0]);
            self.draw_details(frame, right[1]);
        } else {
            self.draw_details(frame, columns[1]);
        }
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(view) = &self.view {
            for card in &view.cards {
                let (arrow, color) = match card.favorable {
                    Some(true) => (" ▲", Color::Green),
                    Some(false) => (" ▼", Color::Red),
                    None => ("", Color::Gray),
                };
                lines.push(Line::from(Span::styled(card.label.clone(), Style::default().fg(Color::Gray))));
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}", card.value), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  {}{arrow}", card.delta.as_deref().unwrap_or("")),
                        Style::default().fg(color),
                    ),
                ]));
            }
        }
        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("KPIs").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some((title, series, format)) = self.view.as_ref().and_then(first_trend) else {
            return;
        };

        let mut legend: Vec<Span> = vec![Span::raw(format!("{title} "))];
        for (i, s) in series.iter().enumerate() {
            legend.push(Span::styled(format!("■ {} ", s.name), Style::default().fg(legend_color(i))));
        }
        let block = Block::default().title(Line::from(legend)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = chart_data(series) else {
            let msg = Paragraph::new("(no data)").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = TrendChart {
            lines: &data.lines,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &data, format);
        }
    }

    fn draw_details(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.view {
            Some(view) => details_text(view, area.width.saturating_sub(2) as usize),
            None => "No data for the selected range.".to_string(),
        };
        let p = Paragraph::new(text)
            .scroll((self.scroll, 0))
            .block(Block::default().title("Details (PgUp/PgDn)").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let preset = pipeline::effective_preset(&self.config);
        let range = match (preset, &self.period) {
            (DatePreset::Custom, Some(p)) => p.current.to_string(),
            _ => preset.display_name().to_string(),
        };

        let items = vec![
            ListItem::new(format!("Range: {range}")),
            ListItem::new(format!("Compare: {}", self.config.comparison.display_name())),
            ListItem::new(format!("Trend: {}", self.config.granularity.display_name())),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab/1-4 page  ↑/↓ select  ←/→ adjust  R reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// The first trend section of a page, drawn as the chart.
fn first_trend(view: &PageView) -> Option<(&str, &[Series], ValueFormat)> {
    view.sections.iter().find_map(|s| match &s.body {
        SectionBody::Lines { series, format } => Some((s.title.as_str(), series.as_slice(), *format)),
        _ => None,
    })
}

/// Every section except the charted trend, as plain text.
fn details_text(view: &PageView, width: usize) -> String {
    let mut out = String::new();
    let mut charted = false;
    for section in &view.sections {
        if matches!(section.body, SectionBody::Lines { .. }) && !charted {
            charted = true;
            continue;
        }
        out.push_str(&section_text(section, width));
        out.push('\n');
    }
    out
}

fn section_text(section: &Section, width: usize) -> String {
    let body = match &section.body {
        SectionBody::Lines { series, format } => series_table(series, *format).render(),
        SectionBody::Bars { bars, format } => render_bar_chart(bars, width.max(30), *format),
        SectionBody::Table(table) => table.render(),
    };
    format!("{}:\n{body}", section.title)
}

struct ChartData {
    start: NaiveDate,
    lines: Vec<Vec<(f64, f64)>>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Convert date series to day offsets and padded bounds.
fn chart_data(series: &[Series]) -> Option<ChartData> {
    let start = series.iter().flat_map(|s| s.points.iter().map(|p| p.0)).min()?;
    let end = series.iter().flat_map(|s| s.points.iter().map(|p| p.0)).max()?;

    let lines: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter(|p| p.1.is_finite())
                .map(|&(d, v)| ((d - start).num_days() as f64, v))
                .collect()
        })
        .collect();

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in lines.iter().flatten() {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() {
        return None;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-9);
    let span = (end - start).num_days() as f64;
    Some(ChartData {
        start,
        lines,
        x_bounds: [0.0, span.max(1.0)],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 10,
        right: 3,
        top: 1,
        bottom: 1,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 4 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    data: &ChartData,
    format: ValueFormat,
) {
    let ticks = 4usize;
    let style = Style::default().fg(Color::Gray);

    let y = chart.y + chart.height;
    if y < inner.y + inner.height {
        for i in 0..ticks {
            let u = i as f64 / (ticks as f64 - 1.0);
            let offset = (data.x_bounds[0] + u * (data.x_bounds[1] - data.x_bounds[0])).round() as i64;
            let label = (data.start + chrono::Duration::days(offset)).format("%m/%d").to_string();
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let start = x.saturating_sub((label.len() / 2) as u16);
            frame.render_widget(
                Paragraph::new(label.clone()).style(style),
                Rect {
                    x: start,
                    y,
                    width: label.len() as u16,
                    height: 1,
                },
            );
        }
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = data.y_bounds[0] + u * (data.y_bounds[1] - data.y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let width = insets.left.saturating_sub(1);
        frame.render_widget(
            Paragraph::new(format.format(y_val))
                .alignment(Alignment::Right)
                .style(style),
            Rect {
                x: inner.x,
                y,
                width,
                height: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonMode, Granularity};
    use crate::report::fixtures::{d, daily_row, dataset};

    fn app() -> App {
        let mut ds = dataset();
        ds.daily.rows = (1..=31).map(|n| daily_row(n, 100.0 + n as f64, 2.0, 9000.0)).collect();
        App::new(DashboardConfig::default(), ds)
    }

    #[test]
    fn starts_on_summary_with_a_view() {
        let app = app();
        assert_eq!(app.page, Page::Summary);
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.page, Page::Summary);
        assert_eq!(app.period.as_ref().unwrap().current.end(), d(31));
    }

    #[test]
    fn tabs_and_digits_switch_pages() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.view.as_ref().unwrap().page, Page::Traffic);
        app.handle_key(KeyCode::Char('4'));
        assert_eq!(app.page, Page::Behavior);
        app.handle_key(KeyCode::BackTab);
        assert_eq!(app.page, Page::Conversion);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn settings_adjust_preset_comparison_and_granularity() {
        let mut app = app();
        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.preset, DatePreset::Last30);
        assert_eq!(app.period.as_ref().unwrap().current.start(), d(2));

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.config.comparison, ComparisonMode::PreviousDay);

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.config.granularity, Granularity::Weekly);
    }

    #[test]
    fn empty_data_shows_status_instead_of_a_view() {
        let app = App::new(DashboardConfig::default(), dataset());
        assert!(app.view.is_none());
        assert!(app.status.contains("kpi generate"));
    }

    #[test]
    fn chart_data_uses_day_offsets() {
        let series = vec![Series::new("sessions", vec![(d(1), 10.0), (d(3), 30.0)])];
        let data = chart_data(&series).unwrap();
        assert_eq!(data.start, d(1));
        assert_eq!(data.lines[0], vec![(0.0, 10.0), (2.0, 30.0)]);
        assert_eq!(data.x_bounds, [0.0, 2.0]);
        assert!(data.y_bounds[0] < 10.0 && data.y_bounds[1] > 30.0);
        assert!(chart_data(&[Series::new("empty", Vec::new())]).is_none());
    }
}
