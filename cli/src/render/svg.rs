use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use super::{x_bounds, y_bounds};
use crate::chart::{ChartSink, RenderError};
use crate::history::History;
use crate::layout::{ChartLayout, Panel};

fn plot_err<E: Display>(e: E) -> RenderError {
    RenderError::Plot(e.to_string())
}

/// Rewrites an SVG snapshot of the chart on every update.
///
/// The file is written next to its destination then renamed over it, so a
/// viewer reloading the file never sees half a picture.
pub struct SvgChart {
    path: PathBuf,
    size: (u32, u32),
}

impl SvgChart {
    pub fn new<P: AsRef<Path>>(path: P, size: (u32, u32)) -> SvgChart {
        SvgChart {
            path: path.as_ref().to_path_buf(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for SvgChart {
    fn draw(&mut self, layout: &ChartLayout, history: &History) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("svg.tmp");
        {
            let root = SVGBackend::new(&tmp, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            let x = x_bounds(history);
            let areas = root.split_evenly((layout.rows, layout.cols));
            for (panel, area) in layout.panels.iter().zip(areas.iter()) {
                draw_panel(area, panel, history, x)?;
            }
            root.present().map_err(plot_err)?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    panel: &Panel,
    history: &History,
    x: (f64, f64),
) -> Result<(), RenderError> {
    let y = y_bounds(panel, history);
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("message")
        .y_desc(panel.y_label)
        .draw()
        .map_err(plot_err)?;

    for trace in &panel.traces {
        let series = match history.get(trace.field) {
            Some(s) => s,
            None => continue,
        };
        let color = RGBColor(trace.color.0, trace.color.1, trace.color.2);
        for segment in series.segments() {
            chart
                .draw_series(LineSeries::new(segment, color.stroke_width(2)))
                .map_err(plot_err)?;
        }
        chart
            .draw_series(
                series
                    .points()
                    .into_iter()
                    .map(|p| Circle::new(p, 3, color.filled())),
            )
            .map_err(plot_err)?
            .label(trace.field)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if panel.traces.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }
    Ok(())
}
