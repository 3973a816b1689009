mod pipeline;
mod reporter;

pub use pipeline::{
    CalibrationOutcome, Pipeline, annotate, calibrate_table, read_table, write_table,
};

pub use reporter::{
    CalibrationSummary, SweepEntry, format_classification_report, format_confusion,
    format_margin_sweep, print_report,
};
