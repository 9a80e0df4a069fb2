use crate::block::{sample_count, Block};
use crate::compression::rle::RunLengthSymbol;
use crate::error::{CodecError, CodecResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// On-disk representation of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// One unsigned byte per sample (raw pixel levels).
    #[default]
    U8,
    /// Little-endian `f32` per sample (transform coefficients).
    F32Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::F32Le => 4,
        }
    }
}

/// Reads consecutive fixed-size blocks from a raw sample stream.
pub struct BlockReader<R: Read> {
    reader: R,
    size: usize,
    samples: usize,
    format: SampleFormat,
    blocks_read: usize,
}

impl<R: Read> BlockReader<R> {
    pub fn new(reader: R, size: usize, format: SampleFormat) -> CodecResult<Self> {
        let samples = sample_count(size)?;
        if samples.checked_mul(format.bytes_per_sample()).is_none() {
            return Err(CodecError::InvalidBlockSize(format!(
                "{}x{} block is too large to buffer",
                size, size
            )));
        }
        Ok(Self {
            reader,
            size,
            samples,
            format,
            blocks_read: 0,
        })
    }

    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    /// Next block, or [`CodecError::EndOfData`] once the stream is exhausted.
    ///
    /// A short final block is padded with zero samples.
    pub fn read_block(&mut self) -> CodecResult<Block<f64>> {
        let samples = self.samples;
        let mut buf = vec![0u8; samples * self.format.bytes_per_sample()];
        let filled = fill(&mut self.reader, &mut buf)?;
        if filled == 0 {
            return Err(CodecError::EndOfData);
        }
        if filled < buf.len() {
            warn!(
                "block {} is short ({} of {} bytes), padding with zeros",
                self.blocks_read,
                filled,
                buf.len()
            );
            buf[filled..].fill(0);
        }

        let data = match self.format {
            SampleFormat::U8 => buf.iter().map(|&b| b as f64).collect(),
            SampleFormat::F32Le => {
                let mut floats = vec![0.0f32; samples];
                buf.as_slice().read_f32_into::<LittleEndian>(&mut floats)?;
                floats.into_iter().map(|f| f as f64).collect()
            }
        };
        self.blocks_read += 1;
        Block::from_vec(self.size, data)
    }

    pub fn blocks(self) -> Blocks<R> {
        Blocks { reader: self }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Iterator over the blocks of a stream; stops at end of data.
pub struct Blocks<R: Read> {
    reader: BlockReader<R>,
}

impl<R: Read> Iterator for Blocks<R> {
    type Item = CodecResult<Block<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_block() {
            Err(CodecError::EndOfData) => None,
            other => Some(other),
        }
    }
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub struct BlockWriter<W: Write> {
    writer: W,
    size: usize,
    format: SampleFormat,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(writer: W, size: usize, format: SampleFormat) -> Self {
        Self {
            writer,
            size,
            format,
        }
    }

    /// Writes one block. `U8` output is rounded and clamped to `0..=255`.
    pub fn write_block(&mut self, block: &Block<f64>) -> CodecResult<()> {
        if block.size() != self.size {
            return Err(CodecError::InvalidBlockSize(format!(
                "writer expects {}x{} blocks, got {}x{}",
                self.size,
                self.size,
                block.size(),
                block.size()
            )));
        }
        match self.format {
            SampleFormat::U8 => {
                let bytes: Vec<u8> = block
                    .iter()
                    .map(|&v| v.round().clamp(0.0, 255.0) as u8)
                    .collect();
                self.writer.write_all(&bytes)?;
            }
            SampleFormat::F32Le => {
                for &v in block.iter() {
                    self.writer.write_f32::<LittleEndian>(v as f32)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> CodecResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Writes one symbol record: `u32` symbol count, then `(u32 count, i32 value)` pairs.
pub fn write_symbols<W: Write>(writer: &mut W, symbols: &[RunLengthSymbol]) -> CodecResult<()> {
    let len = u32::try_from(symbols.len()).map_err(|_| {
        CodecError::NumericOverflow(format!("{} symbols do not fit one record", symbols.len()))
    })?;
    writer.write_u32::<LittleEndian>(len)?;
    for s in symbols {
        writer.write_u32::<LittleEndian>(s.count)?;
        writer.write_i32::<LittleEndian>(s.value)?;
    }
    Ok(())
}

/// Reads one symbol record written by [`write_symbols`].
///
/// A stream that ends cleanly before the record header yields
/// [`CodecError::EndOfData`]; a truncated record is an I/O error.
pub fn read_symbols<R: Read>(reader: &mut R) -> CodecResult<Vec<RunLengthSymbol>> {
    let len = match reader.read_u32::<LittleEndian>() {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(CodecError::EndOfData),
        Err(e) => return Err(e.into()),
    };
    let mut symbols = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        let count = reader.read_u32::<LittleEndian>()?;
        let value = reader.read_i32::<LittleEndian>()?;
        symbols.push(RunLengthSymbol::new(count, value));
    }
    Ok(symbols)
}
