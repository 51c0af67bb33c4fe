#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    Pipeline(String),
    Timeout(u64),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Pipeline(message) => write!(f, "{}", message),
            ScanError::Timeout(timeout_ms) => write!(f, "Timeout after {}ms", timeout_ms),
        }
    }
}

impl std::error::Error for ScanError {}

#[derive(Debug)]
pub enum PipelineError {
    NoUri,
    UnsupportedUri(String),
    Lofty(lofty::error::LoftyError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::NoUri => write!(f, "No URI set"),
            PipelineError::UnsupportedUri(uri) => write!(f, "Unsupported URI: {}", uri),
            PipelineError::Lofty(err) => write!(f, "could not read tags: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<lofty::error::LoftyError> for PipelineError {
    fn from(err: lofty::error::LoftyError) -> Self {
        PipelineError::Lofty(err)
    }
}

/// Decodes error text handed over by a pipeline. Invalid sequences are
/// replaced so the caller always gets a message.
pub fn locale_decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
