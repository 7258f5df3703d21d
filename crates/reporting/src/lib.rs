//! Campaign reporting: display formatters, tabular export, and headline
//! highlights built on top of an analytics result bundle.

pub mod export;
pub mod format;
pub mod highlights;

pub use export::{export_bundle, ReportTable};
pub use format::{format_currency, format_number, format_percentage, MetricFormat};
pub use highlights::ReportHighlights;
