use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("End of block data")]
    EndOfData,

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(String),

    #[error("Invalid scan state: {0}")]
    InvalidScanState(String),

    #[error("Scan already visited all {0} positions")]
    ScanExhausted(usize),

    #[error("Run-length stream has odd length {0}")]
    OddSymbolStream(usize),

    #[error("Invalid run count {count} at symbol {position}")]
    InvalidRunCount { position: usize, count: i64 },

    #[error("Run counts sum to {actual}, expected {expected}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl CodecError {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData)
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
