use thiserror::Error;

/// Structural failures the pipeline surfaces to the caller.
///
/// Numeric edge cases (nonpositive fuel, missing predecessor days, dates
/// present in only one source) degrade to nulls instead of raising.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{source_name} data is missing required column '{column}'")]
    MissingColumn {
        source_name: &'static str,
        column: String,
    },

    #[error("{source_name} data contains no usable rows")]
    EmptyInput { source_name: &'static str },

    #[error(
        "cannot train cleaning model on {rows} days ({positives} warning, {negatives} clear); \
         need at least {min_rows} days and both outcomes present"
    )]
    InsufficientTraining {
        rows: usize,
        positives: usize,
        negatives: usize,
        min_rows: usize,
    },
}
