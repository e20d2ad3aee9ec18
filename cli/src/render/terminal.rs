use std::io::{self, Stdout};

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};
use ratatui::{Frame, Terminal};

use super::{x_bounds, y_bounds};
use crate::chart::{ChartSink, RenderError};
use crate::history::History;
use crate::layout::{ChartLayout, Panel, Rgb};

/// Keeps the alternate screen up while alive.
///
/// Raw mode stays off so Ctrl-C still reaches the process as a signal.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> io::Result<ScreenGuard> {
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(ScreenGuard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        execute!(io::stdout(), LeaveAlternateScreen, Show).ok();
    }
}

/// Live chart redrawn in place on a terminal.
///
/// Leaving the alternate screen wipes the chart, so `close` prints the last
/// value of every metric to the restored screen.
pub struct TerminalChart<B: Backend> {
    terminal: Terminal<B>,
    guard: Option<ScreenGuard>,
    summary: Option<String>,
}

impl TerminalChart<CrosstermBackend<Stdout>> {
    /// Take over the process terminal until `close` (or drop).
    pub fn stdout() -> Result<Self, RenderError> {
        let guard = ScreenGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(TerminalChart {
            terminal,
            guard: Some(guard),
            summary: None,
        })
    }
}

impl<B: Backend> TerminalChart<B> {
    /// Draw on an already set up terminal, e.g. over a `TestBackend`.
    pub fn new(terminal: Terminal<B>) -> Self {
        TerminalChart {
            terminal,
            guard: None,
            summary: None,
        }
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Final values line for the last drawn history.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

impl<B: Backend> ChartSink for TerminalChart<B> {
    fn draw(&mut self, layout: &ChartLayout, history: &History) -> Result<(), RenderError> {
        self.terminal.draw(|frame| render(frame, layout, history))?;
        self.summary = Some(summary_line(history));
        Ok(())
    }

    fn close(&mut self) -> Result<(), RenderError> {
        if let Some(guard) = self.guard.take() {
            self.terminal.show_cursor()?;
            drop(guard);
            if let Some(summary) = &self.summary {
                println!("{}", summary);
            }
        }
        Ok(())
    }
}

/// `final values: heart_rate=72 steps=-`, `-` for a metric never observed.
fn summary_line(history: &History) -> String {
    let values: Vec<String> = history
        .series()
        .iter()
        .map(|s| match s.samples().filter_map(|sample| sample.value).last() {
            Some(v) => format!("{}={}", s.name(), v),
            None => format!("{}=-", s.name()),
        })
        .collect();
    format!("final values: {}", values.join(" "))
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn render(frame: &mut Frame, layout: &ChartLayout, history: &History) {
    let rows = Layout::vertical(vec![Constraint::Ratio(1, layout.rows as u32); layout.rows])
        .split(frame.area());
    let cells: Vec<Rect> = rows
        .iter()
        .flat_map(|row| {
            Layout::horizontal(vec![Constraint::Ratio(1, layout.cols as u32); layout.cols])
                .split(*row)
                .to_vec()
        })
        .collect();
    let x = x_bounds(history);
    for (panel, cell) in layout.panels.iter().zip(cells) {
        render_panel(frame, cell, panel, history, x);
    }
}

fn render_panel(frame: &mut Frame, area: Rect, panel: &Panel, history: &History, x: (f64, f64)) {
    let points: Vec<Vec<(f64, f64)>> = panel
        .traces
        .iter()
        .map(|t| history.get(t.field).map(|s| s.points()).unwrap_or_default())
        .collect();
    let datasets: Vec<Dataset> = panel
        .traces
        .iter()
        .zip(points.iter())
        .map(|(t, pts)| {
            Dataset::default()
                .name(t.field)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color(t.color)))
                .data(pts)
        })
        .collect();

    // single-trace panels show the latest value in the title
    let title = match panel.traces.as_slice() {
        [only] => match history.get(only.field).and_then(|s| s.points().last().copied()) {
            Some((_, v)) => format!(" {} ({}) ", panel.title, v),
            None => format!(" {} ", panel.title),
        },
        _ => format!(" {} ", panel.title),
    };

    let y = y_bounds(panel, history);
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title("message")
                .bounds([x.0, x.1])
                .labels(vec![
                    Span::raw(format!("{:.0}", x.0)),
                    Span::raw(format!("{:.0}", x.1)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(panel.y_label)
                .bounds([y.0, y.1])
                .labels(vec![
                    Span::raw(format!("{:.0}", y.0)),
                    Span::raw(format!("{:.0}", y.1)),
                ]),
        );
    frame.render_widget(chart, area);
}
