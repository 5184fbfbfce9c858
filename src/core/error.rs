use thiserror::Error;

/// Errors that can occur while processing one document.
///
/// None of these abort the process: the pipeline converts every error into a
/// structured failure record before it reaches the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The OCR collaborator produced no text at all.
    #[error("No text could be extracted from image")]
    EmptyTranscript,

    /// The transcript input could not be read or decoded.
    #[error("transcript error: {0}")]
    Transcript(String),

    /// Every inference endpoint failed or no response parsed.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// A registry lookup failed at the transport level.
    #[error("registry error: {0}")]
    Registry(String),

    /// Anything unexpected in the top-level pipeline.
    #[error("processing failed: {0}")]
    Processing(String),
}

impl ExtractionError {
    /// Short classification tag used in failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyTranscript => "empty_transcript",
            Self::Transcript(_) => "transcript",
            Self::InferenceUnavailable(_) => "inference_unavailable",
            Self::Registry(_) => "registry",
            Self::Processing(_) => "processing",
        }
    }
}
