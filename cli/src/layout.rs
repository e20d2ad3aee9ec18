//! Which metrics get charted, and how the subplots are arranged.

/// A plain RGB triple, converted by each renderer to its own color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const RED: Rgb = Rgb(214, 39, 40);
pub const BLUE: Rgb = Rgb(31, 119, 180);
pub const ORANGE: Rgb = Rgb(255, 127, 14);
pub const GREEN: Rgb = Rgb(44, 160, 44);
pub const PURPLE: Rgb = Rgb(148, 103, 189);
pub const BROWN: Rgb = Rgb(140, 86, 75);

/// One line of a subplot: the record field it follows.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub field: &'static str,
    pub color: Rgb,
}

/// One subplot.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: &'static str,
    pub y_label: &'static str,
    pub traces: Vec<Trace>,
}

/// A fixed grid of panels plus the record types that feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub name: &'static str,
    pub rows: usize,
    pub cols: usize,
    pub kinds: Vec<&'static str>,
    pub panels: Vec<Panel>,
}

fn trace(field: &'static str, color: Rgb) -> Trace {
    Trace { field, color }
}

impl ChartLayout {
    /// Heart rate and steps side by side. Other record types are ignored.
    pub fn vitals() -> ChartLayout {
        ChartLayout {
            name: "vitals",
            rows: 1,
            cols: 2,
            kinds: vec!["heart_rate", "steps"],
            panels: vec![
                Panel {
                    title: "Heart Rate",
                    y_label: "BPM",
                    traces: vec![trace("heart_rate", RED)],
                },
                Panel {
                    title: "Steps",
                    y_label: "Steps",
                    traces: vec![trace("steps", BLUE)],
                },
            ],
        }
    }

    /// Every record type, on a 2x2 grid.
    pub fn full() -> ChartLayout {
        ChartLayout {
            name: "full",
            rows: 2,
            cols: 2,
            kinds: vec!["heart_rate", "steps", "diet", "exercise"],
            panels: vec![
                Panel {
                    title: "Heart Rate",
                    y_label: "BPM",
                    traces: vec![trace("heart_rate", RED)],
                },
                Panel {
                    title: "Steps",
                    y_label: "Steps",
                    traces: vec![trace("steps", BLUE)],
                },
                Panel {
                    title: "Diet",
                    y_label: "kcal / g",
                    traces: vec![
                        trace("calories", ORANGE),
                        trace("carbs", GREEN),
                        trace("protein", PURPLE),
                        trace("fat", BROWN),
                    ],
                },
                Panel {
                    title: "Exercise",
                    y_label: "min / mi",
                    traces: vec![
                        trace("exercise_duration", GREEN),
                        trace("exercise_distance", PURPLE),
                    ],
                },
            ],
        }
    }

    /// Every field charted, in panel order, without duplicates.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = vec![];
        for t in self.panels.iter().flat_map(|p| p.traces.iter()) {
            if !fields.contains(&t.field) {
                fields.push(t.field);
            }
        }
        fields
    }

    pub fn accepts(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| *k == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grids_fit_their_panels() {
        for layout in [ChartLayout::vitals(), ChartLayout::full()] {
            assert!(layout.panels.len() <= layout.rows * layout.cols, "{}", layout.name);
        }
    }

    #[test]
    fn vitals_filters_kinds() {
        let l = ChartLayout::vitals();
        assert_eq!(l.fields(), vec!["heart_rate", "steps"]);
        assert!(l.accepts("steps"));
        assert!(!l.accepts("diet"));
        assert!(!l.accepts("unknown"));
    }

    #[test]
    fn full_tracks_every_generated_field() {
        let l = ChartLayout::full();
        assert_eq!(l.fields().len(), 8);
        assert!(l.accepts("exercise"));
    }
}
