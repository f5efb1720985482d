use crate::observer::Phase;
use thiserror::Error;

/// Reasons a DAG file can be rejected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CorruptDagError {
    #[error("bad magic bytes")]
    BadMagic,
    #[error("unsupported DAG file version {major}.{revision}")]
    BadVersion { major: u32, revision: u32 },
    #[error("section sizes do not match epoch {epoch}")]
    BadSizes { epoch: u64 },
    #[error("file too short")]
    ShortFile,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} cancelled")]
    Cancelled(Phase),
    #[error("corrupt DAG file: {0}")]
    CorruptDag(#[from] CorruptDagError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
