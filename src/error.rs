use thiserror::Error;

/// Errors surfaced by the event source and the flattening pass.
///
/// Detection never returns these: a fault during `locate_path` or
/// `detect_record_path` just ends the scan.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("XML stream error: {0}")]
    Stream(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document ended inside <{0}>")]
    UnexpectedEof(String),

    #[error("record path is empty")]
    EmptyRecordPath,
}

pub type Result<T> = std::result::Result<T, ImportError>;
