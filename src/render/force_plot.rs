//! Static force-plot layout.
//!
//! Features that push the output up are stacked to the left of f(x), ending
//! at it; features that push it down are stacked to the right, starting at
//! it. Within each side the largest magnitude sits closest to f(x). The
//! left edge of the red stack minus the blue stack width is the base value.

use crate::domain::Attribution;

/// Which way a feature moves the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Raises the risk (drawn red).
    Higher,
    /// Lowers the risk (drawn blue).
    Lower,
}

/// One feature bar, in output units.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: String,
    pub value: f64,
    pub contribution: f64,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    #[must_use]
    pub fn push(&self) -> Push {
        if self.contribution > 0.0 {
            Push::Higher
        } else {
            Push::Lower
        }
    }

    /// `"Name = value (+0.31)"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} = {} ({:+.2})", self.name, self.value, self.contribution)
    }
}

/// Layout of one explained prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcePlot {
    pub base_value: f64,
    pub output_value: f64,
    /// Positive contributions, largest first (nearest f(x)).
    pub higher: Vec<Segment>,
    /// Negative contributions, largest magnitude first (nearest f(x)).
    pub lower: Vec<Segment>,
    /// Features with exactly zero contribution.
    pub neutral: Vec<String>,
    axis: (f64, f64),
}

impl ForcePlot {
    #[must_use]
    pub fn from_attribution(attribution: &Attribution) -> Self {
        let output_value = attribution.output_value();

        let mut higher: Vec<_> = attribution
            .features
            .iter()
            .filter(|f| f.contribution > 0.0)
            .collect();
        let mut lower: Vec<_> = attribution
            .features
            .iter()
            .filter(|f| f.contribution < 0.0)
            .collect();
        let neutral = attribution
            .features
            .iter()
            .filter(|f| f.contribution == 0.0)
            .map(|f| f.name.clone())
            .collect();

        // Stable sort keeps column order among equal magnitudes.
        higher.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        lower.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

        let mut edge = output_value;
        let higher: Vec<Segment> = higher
            .into_iter()
            .map(|f| {
                let end = edge;
                edge -= f.contribution;
                Segment {
                    name: f.name.clone(),
                    value: f.value,
                    contribution: f.contribution,
                    start: edge,
                    end,
                }
            })
            .collect();
        let left = edge;

        let mut edge = output_value;
        let lower: Vec<Segment> = lower
            .into_iter()
            .map(|f| {
                let start = edge;
                edge -= f.contribution;
                Segment {
                    name: f.name.clone(),
                    value: f.value,
                    contribution: f.contribution,
                    start,
                    end: edge,
                }
            })
            .collect();
        let right = edge;

        let lo = left.min(attribution.base_value).min(output_value);
        let hi = right.max(attribution.base_value).max(output_value);
        let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };

        Self {
            base_value: attribution.base_value,
            output_value,
            higher,
            lower,
            neutral,
            axis: (lo - pad, hi + pad),
        }
    }

    /// Displayed range of the output axis.
    #[must_use]
    pub fn axis(&self) -> (f64, f64) {
        self.axis
    }

    /// Map an output value to a column in `0..width`.
    #[must_use]
    pub fn column(&self, value: f64, width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        let (lo, hi) = self.axis;
        let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        let max = f64::from(width - 1);
        // t·max is within [0, width - 1]
        (t * max).round() as u16
    }

    /// Segment covering column `col`, if any.
    #[must_use]
    pub fn segment_at(&self, col: u16, width: u16) -> Option<&Segment> {
        self.segments().find(|s| {
            let a = self.column(s.start.min(s.end), width);
            let b = self.column(s.start.max(s.end), width);
            (a..b.max(a + 1)).contains(&col)
        })
    }

    /// All bars, red stack then blue stack.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.higher.iter().chain(self.lower.iter())
    }
}
