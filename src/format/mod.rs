pub mod stream;

pub use stream::{read_symbols, write_symbols, BlockReader, BlockWriter, SampleFormat};
