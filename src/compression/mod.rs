pub mod dct;
pub mod engine;
pub mod quantizer;
pub mod rle;
pub mod scan;

pub use dct::{
    dct_1d, dct_2d, dct_blocks, idct_1d, idct_2d, idct_2d_raw, idct_blocks, round_samples,
    IdctStrategy,
};
pub use engine::{BlockCodec, StreamingEncoder};
pub use quantizer::{LevelShift, QuantizationTable};
pub use rle::{
    decode_block, decode_symbols, encode_block_streaming, encode_symbols, run_length_decode,
    run_length_decode_exact, run_length_encode, RunLengthState, RunLengthSymbol, RunStatus,
};
pub use scan::{
    scan_block, scan_table, unscan_block, Coord, ScanCursor, ScanOrder, ScanStage, ScanState,
    Zigzag,
};
