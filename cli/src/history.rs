//! Per-metric sample history driving the charts.

use std::collections::VecDeque;

use serde_json::{Map, Value};

/// One observation of a metric. `value` is `None` when the message that
/// produced this sample did not carry the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub index: u64,
    pub value: Option<f64>,
}

/// Ordered samples of one metric, bounded by an optional retention window.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    samples: VecDeque<Sample>,
    retain: Option<usize>,
}

impl Series {
    fn new(name: &str, retain: Option<usize>) -> Series {
        Series {
            name: name.to_string(),
            samples: VecDeque::new(),
            retain,
        }
    }

    fn push(&mut self, sample: Sample) {
        if let Some(cap) = self.retain {
            while self.samples.len() >= cap {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Retained values, placeholders included.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Retained values actually observed, in order.
    pub fn observed(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.value).collect()
    }

    /// `(index, value)` points of observed values.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.value.map(|v| (s.index as f64, v)))
            .collect()
    }

    /// Observed points split into runs with no placeholder in between.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = vec![];
        let mut current = vec![];
        for s in &self.samples {
            match s.value {
                Some(v) => current.push((s.index as f64, v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.back().and_then(|s| s.value)
    }

    /// Smallest and largest observed value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.value)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Series for a fixed set of metrics, kept aligned by message index: every
/// recorded message adds exactly one sample to every series.
#[derive(Debug, Clone)]
pub struct History {
    series: Vec<Series>,
    retain: Option<usize>,
    next_index: u64,
}

impl History {
    /// `retain` bounds every series to its latest samples; `None` keeps them
    /// all.
    pub fn new<S: AsRef<str>>(fields: &[S], retain: Option<usize>) -> History {
        let retain = retain.map(|r| r.max(1));
        let mut series: Vec<Series> = vec![];
        for f in fields {
            if !series.iter().any(|s| s.name == f.as_ref()) {
                series.push(Series::new(f.as_ref(), retain));
            }
        }
        History {
            series,
            retain,
            next_index: 0,
        }
    }

    /// Append one sample per series from `message`, returning the message
    /// index. Missing or non-numeric fields become placeholders.
    pub fn record(&mut self, message: &Map<String, Value>) -> u64 {
        let index = self.next_index;
        for s in &mut self.series {
            let value = message.get(&s.name).and_then(Value::as_f64);
            s.push(Sample { index, value });
        }
        self.next_index += 1;
        index
    }

    pub fn get(&self, field: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == field)
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Messages recorded since creation or the last reset.
    pub fn messages(&self) -> u64 {
        self.next_index
    }

    pub fn retain(&self) -> Option<usize> {
        self.retain
    }

    /// Index range currently retained, as `(first, last)`.
    pub fn index_span(&self) -> Option<(u64, u64)> {
        let first = self.series.iter().filter_map(|s| s.samples.front()).map(|s| s.index).min()?;
        Some((first, self.next_index.saturating_sub(1)))
    }

    pub fn reset(&mut self) {
        for s in &mut self.series {
            s.samples.clear();
        }
        self.next_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn placeholders_keep_series_aligned() {
        let mut h = History::new(&["heart_rate", "steps"], None);
        h.record(&msg(json!({"type": "heart_rate", "heart_rate": 72})));
        h.record(&msg(json!({"type": "steps", "steps": 10})));
        h.record(&msg(json!({"type": "steps", "steps": 55})));

        let hr = h.get("heart_rate").unwrap();
        let steps = h.get("steps").unwrap();
        assert_eq!(hr.values(), vec![Some(72.0), None, None]);
        assert_eq!(steps.values(), vec![None, Some(10.0), Some(55.0)]);
        assert_eq!(steps.observed(), vec![10.0, 55.0]);
        assert_eq!(steps.points(), vec![(1.0, 10.0), (2.0, 55.0)]);
        assert_eq!(h.messages(), 3);
    }

    #[test]
    fn non_numeric_is_placeholder() {
        let mut h = History::new(&["steps"], None);
        h.record(&msg(json!({"steps": "ten"})));
        assert_eq!(h.get("steps").unwrap().values(), vec![None]);
    }

    #[test]
    fn retention_drops_oldest() {
        let mut h = History::new(&["steps"], Some(3));
        for v in 0..5 {
            h.record(&msg(json!({ "steps": v })));
        }
        let s = h.get("steps").unwrap();
        assert_eq!(s.observed(), vec![2.0, 3.0, 4.0]);
        assert_eq!(s.samples().map(|s| s.index).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(h.index_span(), Some((2, 4)));
        assert_eq!(h.messages(), 5);
    }

    #[test]
    fn segments_break_on_gaps() {
        let mut h = History::new(&["steps"], None);
        for v in [json!({"steps": 1}), json!({}), json!({"steps": 2}), json!({"steps": 3}), json!({})] {
            h.record(&msg(v));
        }
        let s = h.get("steps").unwrap();
        assert_eq!(
            s.segments(),
            vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]
        );
        assert_eq!(s.bounds(), Some((1.0, 3.0)));
        assert_eq!(s.last(), None);
    }

    #[test]
    fn reset_starts_over() {
        let mut h = History::new(&["heart_rate", "heart_rate"], Some(10));
        assert_eq!(h.series().len(), 1);
        h.record(&msg(json!({"heart_rate": 80})));
        h.reset();
        assert!(h.get("heart_rate").unwrap().is_empty());
        assert_eq!(h.messages(), 0);
        assert_eq!(h.index_span(), None);
        assert_eq!(h.record(&msg(json!({"heart_rate": 81}))), 0);
    }
}
