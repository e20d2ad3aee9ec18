//! The tailing loop: wait for a line, chart it, wait again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::chart::{ChartSink, ChartUpdater, RenderError, Update};
use crate::tail::{Tail, TailError};

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error(transparent)]
    Tail(#[from] TailError),
    #[error("could not close chart")]
    Close(#[source] RenderError),
}

pub type ConsumerResult<T> = Result<T, ConsumerError>;

/// What one pass of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing new in the file.
    Idle,
    /// The message was recorded and the chart redrawn.
    Charted { kind: String, index: u64 },
    /// Valid message of a type the chart does not follow.
    Ignored { kind: String },
    /// The line was not usable; already logged.
    Rejected,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub lines: u64,
    pub charted: u64,
    pub ignored: u64,
    pub rejected: u64,
    pub failed_draws: u64,
}

pub struct Consumer<S: ChartSink> {
    tail: Tail,
    updater: ChartUpdater,
    sink: S,
    poll_interval: Duration,
    stats: ConsumerStats,
}

impl<S: ChartSink> Consumer<S> {
    pub fn new(tail: Tail, updater: ChartUpdater, sink: S, poll_interval: Duration) -> Consumer<S> {
        Consumer {
            tail,
            updater,
            sink,
            poll_interval,
            stats: ConsumerStats::default(),
        }
    }

    pub fn updater(&self) -> &ChartUpdater {
        &self.updater
    }

    pub fn tail(&self) -> &Tail {
        &self.tail
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Read at most one line and process it.
    pub fn step(&mut self) -> ConsumerResult<Step> {
        match self.tail.next_line()? {
            Some(line) if !line.trim().is_empty() => Ok(self.process_line(&line)),
            _ => Ok(Step::Idle),
        }
    }

    /// Parse, record and redraw. Failures are logged and reported as
    /// `Step::Rejected`; nothing here stops the loop.
    pub fn process_line(&mut self, line: &str) -> Step {
        self.stats.lines += 1;
        tracing::debug!(raw = line, "raw message");
        let message: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(line, error = %e, "invalid JSON message");
                self.stats.rejected += 1;
                return Step::Rejected;
            }
        };
        match self.updater.update(&message) {
            Ok(Update::Ignored { kind }) => {
                tracing::info!(%kind, "message type not charted");
                self.stats.ignored += 1;
                Step::Ignored { kind }
            }
            Ok(Update::Recorded { kind, index }) => {
                tracing::info!(%kind, index, %message, "message sent to chart");
                if let Err(e) = self.updater.draw(&mut self.sink) {
                    tracing::error!(error = %e, index, "chart redraw failed");
                    self.stats.failed_draws += 1;
                }
                self.stats.charted += 1;
                Step::Charted { kind, index }
            }
            Err(e) => {
                tracing::error!(error = %e, line, "error processing message");
                self.stats.rejected += 1;
                Step::Rejected
            }
        }
    }

    /// Loop until `stop` is raised or reading the file fails. The chart is
    /// closed either way.
    pub fn run(mut self, stop: &AtomicBool) -> ConsumerResult<ConsumerStats> {
        tracing::info!(
            path = %self.tail.path().display(),
            offset = self.tail.offset(),
            layout = self.updater.layout().name,
            "consumer ready, waiting for new messages"
        );
        let outcome = self.pump(stop);
        let closed = self.sink.close();
        match (outcome, closed) {
            (Err(e), closed) => {
                if let Err(c) = closed {
                    tracing::warn!(error = %c, "could not close chart");
                }
                tracing::error!(error = %e, "unexpected error, consumer stopping");
                Err(e)
            }
            (Ok(()), Err(c)) => Err(ConsumerError::Close(c)),
            (Ok(()), Ok(())) => Ok(self.stats),
        }
    }

    fn pump(&mut self, stop: &AtomicBool) -> ConsumerResult<()> {
        while !stop.load(Ordering::Relaxed) {
            if let Step::Idle = self.step()? {
                tracing::trace!("no new messages, waiting");
                thread::sleep(self.poll_interval);
            }
        }
        tracing::info!("consumer interrupted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::NullChart;
    use crate::layout::ChartLayout;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::Arc;

    fn consumer(path: &std::path::Path) -> Consumer<NullChart> {
        Consumer::new(
            Tail::open(path).unwrap(),
            ChartUpdater::new(ChartLayout::vitals(), None),
            NullChart,
            Duration::from_millis(1),
        )
    }

    fn append(path: &std::path::Path, line: &str) {
        let mut f = OpenOptions::new().append(true).open(path).unwrap();
        writeln!(f, "{}", line).unwrap();
    }

    #[test]
    fn bad_line_does_not_stop_processing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut c = consumer(file.path());
        append(file.path(), "not json");
        append(file.path(), r#"{"heart_rate": 72, "type": "heart_rate"}"#);

        assert_eq!(c.step().unwrap(), Step::Rejected);
        assert_eq!(c.updater().history().get("heart_rate").unwrap().len(), 0);
        assert_eq!(
            c.step().unwrap(),
            Step::Charted {
                kind: "heart_rate".into(),
                index: 0
            }
        );
        assert_eq!(c.step().unwrap(), Step::Idle);
        assert_eq!(c.stats().rejected, 1);
        assert_eq!(c.stats().charted, 1);
    }

    #[test]
    fn blank_lines_are_idle() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut c = consumer(file.path());
        append(file.path(), "   ");
        assert_eq!(c.step().unwrap(), Step::Idle);
        assert_eq!(c.stats().lines, 0);
    }

    #[test]
    fn non_object_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut c = consumer(file.path());
        assert_eq!(c.process_line("[72]"), Step::Rejected);
        assert_eq!(c.process_line(r#"{"type":"diet","calories":300}"#), Step::Ignored { kind: "diet".into() });
        assert_eq!(c.updater().history().messages(), 0);
    }

    struct FailingChart {
        closed: Arc<AtomicBool>,
    }

    impl ChartSink for FailingChart {
        fn draw(&mut self, _: &ChartLayout, _: &crate::history::History) -> Result<(), RenderError> {
            Err(RenderError::Plot("boom".into()))
        }

        fn close(&mut self) -> Result<(), RenderError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn draw_failures_are_isolated_and_sink_closed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let mut c = Consumer::new(
            Tail::open(file.path()).unwrap(),
            ChartUpdater::new(ChartLayout::vitals(), None),
            FailingChart {
                closed: closed.clone(),
            },
            Duration::from_millis(1),
        );
        append(file.path(), r#"{"type":"steps","steps":10}"#);
        append(file.path(), r#"{"type":"steps","steps":55}"#);
        assert!(matches!(c.step().unwrap(), Step::Charted { .. }));
        assert!(matches!(c.step().unwrap(), Step::Charted { .. }));
        assert_eq!(c.stats().failed_draws, 2);
        assert_eq!(
            c.updater().history().get("steps").unwrap().observed(),
            vec![10.0, 55.0]
        );

        let stop = AtomicBool::new(true);
        let stats = c.run(&stop).unwrap();
        assert_eq!(stats.charted, 2);
        assert!(closed.load(Ordering::Relaxed));
    }
}
