use thiserror::Error;

pub type ReaderResult<T> = std::result::Result<T, ReaderError>;

/// Errors a metric read can end with. None of them are retried or cached.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReaderError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with status >= 400. Credential rejections land here
    /// too; the body is the only way to tell them apart.
    #[error("{body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Upstream day kept changing; gave up after {attempts} attempts")]
    DayRolloverLimit { attempts: u32 },
}

/// Outcome of one window fetch that did not produce data.
#[derive(Debug)]
pub(crate) enum FetchError {
    /// The upstream's calendar day changed mid-read. Never leaves `ChReader`.
    DayRolledOver,
    Reader(ReaderError),
}

impl From<ReaderError> for FetchError {
    fn from(err: ReaderError) -> Self {
        FetchError::Reader(err)
    }
}
