use thiserror::Error;

pub type RepricerResult<T> = Result<T, RepricerError>;

#[derive(Error, Debug)]
pub enum RepricerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to patch: no modified records")]
    NothingToPatch,

    #[error("Patch request failed: {0}")]
    PatchRequest(String),

    #[error("Job submit failed: {0}")]
    JobSubmit(String),

    #[error("A price-search job is already active for this session")]
    JobActive,

    #[error("Status poll failed: {0}")]
    PollTransport(String),

    #[error("Price-search job failed: {0}")]
    JobTerminal(String),

    #[error("Price-search job did not finish within the poll budget")]
    JobTimeout,

    #[error("Price-search job was cancelled")]
    JobCancelled,

    #[error("Workbook write error: {0}")]
    WorkbookWrite(String),
}
