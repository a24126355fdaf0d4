//! Presentation-independent layout of prediction output.

mod force_plot;

pub use force_plot::{ForcePlot, Push, Segment};
