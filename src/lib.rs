pub mod block;
pub mod compression;
pub mod config;
pub mod error;
pub mod format;

pub use block::Block;
pub use compression::{
    BlockCodec, IdctStrategy, RunLengthState, RunLengthSymbol, ScanOrder, ScanState,
    StreamingEncoder, Zigzag,
};
pub use config::PipelineConfig;
pub use error::{CodecError, CodecResult};
pub use format::{BlockReader, BlockWriter, SampleFormat};

pub const VERSION: &str = "0.3.0";

/// Header of an encoded symbol file.
pub const MAGIC: &[u8; 4] = b"DCTB";
