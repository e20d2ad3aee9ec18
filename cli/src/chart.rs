//! The chart updater and the seam to whatever draws it.

use serde_json::Value;
use thiserror::Error;

use crate::history::History;
use crate::layout::ChartLayout;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("terminal io error")]
    Io(#[from] std::io::Error),
    #[error("plotting error: {0}")]
    Plot(String),
}

/// Outcome of feeding one message to the updater.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Recorded { kind: String, index: u64 },
    Ignored { kind: String },
}

/// Something the chart can be drawn on.
pub trait ChartSink {
    /// Redraw everything from `history`. Called after every recorded message.
    fn draw(&mut self, layout: &ChartLayout, history: &History) -> Result<(), RenderError>;

    /// Release the drawing surface.
    fn close(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

impl<S: ChartSink + ?Sized> ChartSink for Box<S> {
    fn draw(&mut self, layout: &ChartLayout, history: &History) -> Result<(), RenderError> {
        (**self).draw(layout, history)
    }

    fn close(&mut self) -> Result<(), RenderError> {
        (**self).close()
    }
}

/// Draws nothing.
#[derive(Debug, Default)]
pub struct NullChart;

impl ChartSink for NullChart {
    fn draw(&mut self, _layout: &ChartLayout, _history: &History) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Owns the layout and the history it feeds.
#[derive(Debug, Clone)]
pub struct ChartUpdater {
    layout: ChartLayout,
    history: History,
}

impl ChartUpdater {
    pub fn new(layout: ChartLayout, retain: Option<usize>) -> ChartUpdater {
        let history = History::new(layout.fields().as_slice(), retain);
        ChartUpdater { layout, history }
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.reset()
    }

    /// Record the fields of `message` if the layout charts its type.
    pub fn update(&mut self, message: &Value) -> Result<Update, UpdateError> {
        let obj = message
            .as_object()
            .ok_or_else(|| UpdateError::NotAnObject(json_type(message)))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        if !self.layout.accepts(&kind) {
            return Ok(Update::Ignored { kind });
        }
        let index = self.history.record(obj);
        Ok(Update::Recorded { kind, index })
    }

    pub fn draw<S: ChartSink + ?Sized>(&self, sink: &mut S) -> Result<(), RenderError> {
        sink.draw(&self.layout, &self.history)
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
