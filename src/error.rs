use miette::Diagnostic;
use thiserror::Error;

pub type SubtitleResult<T> = Result<T, SubtitleError>;

#[derive(Clone, Debug, Error, Diagnostic, PartialEq)]
pub enum SubtitleError {
    #[error("script source '{name}' unreadable: {reason}")]
    #[diagnostic(
        code("subtitle.source_unreadable"),
        help("check that the script asset exists and is valid UTF-8")
    )]
    SourceUnreadable { name: String, reason: String },
    #[error("no more speech after index {index}")]
    #[diagnostic(code("subtitle.sequence_exhausted"))]
    SequenceExhausted { index: usize },
    #[error("no speech available")]
    #[diagnostic(
        code("subtitle.empty_sequence"),
        help("assign a script source or compile one before starting playback")
    )]
    EmptySequence,
    #[error("speech {index} has neither a duration nor an audio clip")]
    #[diagnostic(
        code("subtitle.missing_dwell"),
        help("set an explicit duration, attach audio, or configure a fixed dwell fallback")
    )]
    MissingDwellInput { index: usize },
    #[error("line {line} does not exist")]
    #[diagnostic(code("subtitle.unknown_line"))]
    UnknownLine { line: usize },
    #[error("serialization error: {0}")]
    #[diagnostic(code("subtitle.serialization"))]
    Serialization(String),
    #[error("invalid configuration: {0}")]
    #[diagnostic(code("subtitle.invalid_config"))]
    InvalidConfig(String),
}
