use thiserror::Error;
use uuid::Uuid;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Error type covering the different failure cases that can occur while the
/// manager reads, reconciles, or rewrites the shared spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Wrapper for IO failures such as reading response bodies.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the spreadsheet or map backend cannot be reached.
    #[error("backend connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Raised when the exported sheet cannot be parsed as delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a backend call answers with a non-success status.
    #[error("backend rejected the request to '{endpoint}' with status {status}")]
    Backend { endpoint: String, status: u16 },

    /// Raised when fewer than the required number of signature key columns
    /// exist on both sides of a reconciliation.
    #[error(
        "only {available} matchable key column(s) shared between the selection \
         and the sheet, at least {required} required"
    )]
    InsufficientKeys { available: usize, required: usize },

    /// Raised when a mutating operation matches no remote row, which would
    /// otherwise turn into a silent no-op write.
    #[error(
        "no rows on sheet '{sheet}' matched the selection; \
         local signatures {local_sample:?}, remote signatures {remote_sample:?}"
    )]
    NoMatch {
        sheet: String,
        local_sample: Vec<String>,
        remote_sample: Vec<String>,
    },

    /// Raised when an operation is invoked with an empty selection.
    #[error("no rows selected")]
    EmptySelection,

    /// Raised when a selection id does not resolve to a loaded row.
    #[error("selected row {0} is not part of the loaded sheet")]
    UnknownRow(Uuid),

    /// Raised when a row ordinal lies outside the loaded sheet.
    #[error("row {0} is out of range")]
    RowOutOfRange(usize),

    /// Raised when a restore is requested from a sheet that is not a closed
    /// archive.
    #[error("sheet '{0}' is not a closed archive")]
    NotClosed(String),

    /// Raised when a new listing is aimed at an archive or briefing sheet.
    #[error("new listings can only be added to an active sheet, not '{0}'")]
    NotActive(String),

    /// Raised when a new-entry field is not of the form `column=value`.
    #[error("invalid field '{0}', expected column=value")]
    InvalidField(String),

    /// Raised when the geocoder returns no result for an address.
    #[error("no coordinates found for address '{0}'")]
    Geocode(String),

    /// Raised when required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
