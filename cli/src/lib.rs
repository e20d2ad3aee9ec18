//! # Biometrics live feed
//!
//! Consumer side of the feed written by [`biometrics_probe`]: a [`Tail`]
//! follows the shared file, each new line goes through the [`ChartUpdater`]
//! and the chart is redrawn on a [`ChartSink`].
//!
//! ```text
//! Probe --append--> data file --Tail--> Consumer --> ChartUpdater --> ChartSink
//! ```

pub mod chart;
pub mod consumer;
pub mod history;
pub mod layout;
pub mod logging;
pub mod render;
pub mod tail;

pub use chart::{ChartSink, ChartUpdater, NullChart, RenderError, Update, UpdateError};
pub use consumer::{Consumer, ConsumerError, ConsumerResult, ConsumerStats, Step};
pub use history::{History, Sample, Series};
pub use layout::ChartLayout;
pub use render::{SvgChart, TerminalChart};
pub use tail::{Tail, TailError, TailResult};

/// Where both commands expect the shared file unless told otherwise.
pub const DEFAULT_DATA_FILE: &str = "data/biometrics_live.json";
