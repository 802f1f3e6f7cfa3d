//! Ratatui-based terminal UI.
//!
//! The TUI is an editor for every session input: fit range, beverage name,
//! calibration standards, unknown-sample absorbances and the dilution inputs.
//! Each applied edit re-runs the session pipeline; the chart, tables and the
//! final concentration are redrawn from the fresh output.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
};

use crate::domain::{
    FitQuality, INVALID_FIT_MARKER, MISSING_MARKER, MessageLevel, SessionConfig,
};
use crate::error::AppError;

mod editor;
mod plotters_chart;

pub use editor::{Column, EditTarget, Editor, KeyOutcome, SETTINGS, Section, Setting};
use plotters_chart::CurveChart;

/// Start the TUI.
pub fn run(config: SessionConfig) -> Result<(), AppError> {
    // Load before taking over the terminal so CSV errors print normally.
    let loaded = crate::app::pipeline::load_session(&config)?;
    let skipped = loaded.standards_errors.len() + loaded.unknowns_errors.len();

    let mut app = Editor::new(loaded.inputs);
    if skipped > 0 {
        app.status = format!("Skipped {skipped} invalid CSV row(s).");
    }

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    event_loop(&mut app, &mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

fn event_loop<B: ratatui::backend::Backend>(
    app: &mut Editor,
    terminal: &mut Terminal<B>,
) -> Result<(), AppError> {
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            terminal
                .draw(|f| draw(app, f))
                .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(100))
            .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
        {
            continue;
        }

        match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) == KeyOutcome::Quit {
                    break;
                }
                needs_redraw = true;
            }
            Event::Resize(_, _) => needs_redraw = true,
            _ => {}
        }
    }
    Ok(())
}

fn draw(app: &Editor, frame: &mut ratatui::Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
        .split(frame.area());

    draw_header(app, frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    draw_chart(app, frame, body[0]);
    draw_tables(app, frame, body[1]);

    draw_footer(app, frame, chunks[2]);
}

fn draw_header(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let gray = Style::default().fg(Color::Gray);
    let mut lines = vec![Line::from(vec![
        Span::styled("stdcurve", Style::default().fg(Color::Cyan)),
        Span::raw(format!(" - DNS standard curve | beverage: {}", app.inputs.beverage)),
    ])];

    match &app.output.fit {
        Ok(fit) => {
            let quality = match fit.quality() {
                FitQuality::Good => Span::styled("ok", Style::default().fg(Color::Green)),
                other => Span::styled(other.label(), Style::default().fg(Color::Yellow)),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(
                        "{} | R² = {} | n={} | ",
                        fit.equation(),
                        fit.r_squared_display(),
                        fit.n_points
                    ),
                    gray,
                ),
                quality,
            ]));
        }
        Err(err) => lines.push(Line::from(Span::styled(
            format!("{INVALID_FIT_MARKER}: {err}"),
            Style::default().fg(Color::Red),
        ))),
    }

    let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_chart(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let block = Block::default().title("Standard Curve").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    if app.inputs.calibration.is_empty() {
        let msg = Paragraph::new("No calibration standards. Press Tab, then `a` to add one.")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    }

    let series = chart_series(app);
    let (chart_rect, insets) = chart_layout(inner);
    let widget = CurveChart {
        line: &series.line,
        points: &series.points,
        selected: &series.selected,
        x_bounds: series.x_bounds,
        y_bounds: series.y_bounds,
        fmt_x: fmt_axis,
        fmt_y: fmt_axis,
    };

    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
    }
}

fn draw_tables(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let n_unknowns = app.inputs.unknowns.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SETTINGS.len() as u16 + 2),
            Constraint::Min(5),
            Constraint::Length(n_unknowns.saturating_add(3).min(12)),
            Constraint::Length(3),
        ])
        .split(area);

    draw_settings(app, frame, chunks[0]);
    draw_standards(app, frame, chunks[1]);
    draw_unknowns(app, frame, chunks[2]);
    draw_dilution(app, frame, chunks[3]);
}

fn section_block<'a>(app: &Editor, title: impl Into<Line<'a>>, section: Section) -> Block<'a> {
    let style = if app.section == section {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Block::default().title(title).borders(Borders::ALL).border_style(style)
}

fn highlight_style() -> Style {
    Style::default().fg(Color::Black).bg(Color::White)
}

/// Text shown for a cell: the open prompt's buffer when it targets this cell.
fn cell_text(app: &Editor, target: EditTarget, value: String) -> String {
    match &app.edit {
        Some(edit) if edit.target == target => format!("{}_", edit.buffer),
        _ => value,
    }
}

fn draw_settings(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let items: Vec<ListItem> = SETTINGS
        .iter()
        .map(|&s| {
            let value = cell_text(app, EditTarget::Setting(s), app.setting_text(s));
            ListItem::new(format!("{:<24} {value}", s.label()))
        })
        .collect();

    let list = List::new(items)
        .block(section_block(app, "Settings", Section::Settings))
        .highlight_style(highlight_style())
        .highlight_symbol("» ");

    let mut state = ListState::default();
    if app.section == Section::Settings {
        state.select(Some(app.setting));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_standards(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let selected_cell = app.section == Section::Standards;
    let mut rows: Vec<Row> = app
        .inputs
        .calibration
        .points
        .iter()
        .enumerate()
        .map(|(row, p)| {
            let conc = cell_text(
                app,
                EditTarget::Standard { row, column: Column::Left },
                format!("{:.3}", p.concentration),
            );
            let abs = cell_text(
                app,
                EditTarget::Standard { row, column: Column::Right },
                format!("{:.3}", p.absorbance),
            );
            let marker = if app.inputs.range.contains(p.concentration) { "*" } else { "" };
            Row::new(vec![
                column_cell(conc, selected_cell && row == app.standard_row && app.column == Column::Left),
                column_cell(abs, selected_cell && row == app.standard_row && app.column == Column::Right),
                Cell::from(marker),
            ])
        })
        .collect();

    if let Some(edit) = app.edit.as_ref().filter(|e| e.target == EditTarget::NewStandard) {
        rows.push(Row::new(vec![
            Cell::from(format!("new: {}_", edit.buffer)),
            Cell::from(""),
            Cell::from(""),
        ]));
    }

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Length(14), Constraint::Length(4)])
        .header(
            Row::new(vec!["conc (mg/mL)", "abs (AU)", "fit"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(section_block(app, "Standards", Section::Standards));

    let mut state = TableState::default();
    if selected_cell {
        state.select(Some(app.standard_row));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_unknowns(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let selected_cell = app.section == Section::Unknowns;
    let rows: Vec<Row> = app
        .inputs
        .unknowns
        .iter()
        .zip(&app.output.estimates)
        .enumerate()
        .map(|(row, (sample, result))| {
            let label = cell_text(
                app,
                EditTarget::Unknown { row, column: Column::Left },
                sample.label.clone(),
            );
            let abs = cell_text(
                app,
                EditTarget::Unknown { row, column: Column::Right },
                sample
                    .absorbance
                    .map(|a| format!("{a:.3}"))
                    .unwrap_or_else(|| MISSING_MARKER.to_string()),
            );
            Row::new(vec![
                column_cell(label, selected_cell && row == app.unknown_row && app.column == Column::Left),
                column_cell(abs, selected_cell && row == app.unknown_row && app.column == Column::Right),
                Cell::from(result.estimate.to_string()),
            ])
        })
        .collect();

    let title = format!("Unknowns: {}", app.inputs.beverage);
    let table = Table::new(rows, [Constraint::Length(10), Constraint::Length(13), Constraint::Min(10)])
        .header(
            Row::new(vec!["dilution", "abs (AU)", "est. (mg/mL)"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(section_block(app, title, Section::Unknowns));

    let mut state = TableState::default();
    if selected_cell {
        state.select(Some(app.unknown_row));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn column_cell(text: String, highlighted: bool) -> Cell<'static> {
    let cell = Cell::from(text);
    if highlighted {
        cell.style(highlight_style())
    } else {
        cell
    }
}

fn draw_dilution(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let color = match app.output.dilution.level() {
        MessageLevel::Success => Color::Green,
        MessageLevel::Info => Color::Blue,
        MessageLevel::Warning => Color::Yellow,
    };
    let p = Paragraph::new(app.output.dilution.message(app.inputs.beverage.trim()))
        .style(Style::default().fg(color))
        .block(Block::default().title("Final concentration").borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_footer(app: &Editor, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let help = if app.edit.is_some() {
        "type value  Enter apply  Esc cancel"
    } else {
        "Tab section  ↑/↓ row  ←/→ column/nudge  Enter edit  a add  x delete  e export  q quit"
    };
    let line = Line::from(vec![
        Span::styled(help, Style::default().fg(Color::Gray)),
        Span::raw(" | "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

struct ChartSeries {
    line: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    selected: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters.
fn chart_series(app: &Editor) -> ChartSeries {
    let calibration = &app.inputs.calibration;
    let range = &app.inputs.range;

    let points: Vec<(f64, f64)> = calibration
        .points
        .iter()
        .filter(|p| p.concentration.is_finite() && p.absorbance.is_finite())
        .map(|p| (p.concentration, p.absorbance))
        .collect();
    let selected: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|&(c, _)| range.contains(c))
        .collect();

    let (x0, x1) = calibration
        .concentration_domain()
        .filter(|(lo, hi)| hi > lo)
        .unwrap_or((0.0, 1.0));

    let line = match app.output.valid_fit() {
        Some(fit) => {
            let lo = fit.range.start.max(x0);
            let hi = fit.range.end.min(x1);
            let n = 100usize;
            (0..n)
                .map(|i| {
                    let c = lo + (i as f64 / (n as f64 - 1.0)) * (hi - lo);
                    (c, fit.predict(c))
                })
                .collect()
        }
        None => Vec::new(),
    };

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in points.iter().chain(&line) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartSeries {
        line,
        points,
        selected,
        x_bounds: [x0, x1],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn fmt_axis(v: f64) -> String {
    format!("{v:.2}")
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
        left: 7,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
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
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect { x: start, y, width, height: 1 },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.2}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect { x: start, y, width, height: 1 },
        );
    }

    let x_label = Paragraph::new("glucose (mg/mL)")
        .alignment(Alignment::Center)
        .style(style);
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("A (AU)").style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
