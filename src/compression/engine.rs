use super::dct::{dct_2d, idct_2d};
use super::quantizer::{LevelShift, QuantizationTable};
use super::rle::{
    decode_block, decode_symbols, encode_block_streaming, encode_symbols, RunLengthState,
    RunLengthSymbol,
};
use super::scan::{scan_block, unscan_block, ScanOrder, Zigzag};
use crate::block::{sample_count, Block};
use crate::config::PipelineConfig;
use crate::error::{CodecError, CodecResult};
use log::{debug, trace};
use rayon::prelude::*;

/// Runs blocks through level shift, DCT, quantization, coefficient scan and
/// run-length coding, and back.
///
/// The scan order defaults to [`Zigzag`]; [`BlockCodec::with_order`] plugs in
/// any other [`ScanOrder`].
#[derive(Debug, Clone)]
pub struct BlockCodec<O = Zigzag> {
    config: PipelineConfig,
    shift: LevelShift,
    quant: Option<QuantizationTable>,
    order: O,
}

impl BlockCodec {
    pub fn new(config: PipelineConfig) -> CodecResult<Self> {
        Self::with_order(config, Zigzag)
    }
}

impl<O: ScanOrder + Sync> BlockCodec<O> {
    pub fn with_order(config: PipelineConfig, order: O) -> CodecResult<Self> {
        config.validate()?;
        let shift = LevelShift::new(config.level_shift);
        let quant = config.quant_table();
        Ok(Self {
            config,
            shift,
            quant,
            order,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn order(&self) -> &O {
        &self.order
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    fn check(&self, block: &Block<f64>) -> CodecResult<()> {
        if block.size() != self.block_size() {
            return Err(CodecError::InvalidBlockSize(format!(
                "codec configured for {}x{}, got {}x{}",
                self.block_size(),
                self.block_size(),
                block.size(),
                block.size()
            )));
        }
        Ok(())
    }

    /// Spatial block to integer coefficients in natural order.
    pub fn forward(&self, block: &Block<f64>) -> CodecResult<Block<i32>> {
        self.check(block)?;
        let mut work = block.clone();
        self.shift.normalize(&mut work);
        dct_2d(&mut work)?;
        match &self.quant {
            Some(table) => table.quantize(&work),
            None => work.round_to_i32(),
        }
    }

    /// Integer coefficients in natural order back to rounded samples.
    pub fn inverse(&self, coeffs: &Block<i32>) -> CodecResult<Block<f64>> {
        let mut work = match &self.quant {
            Some(table) => table.dequantize(coeffs)?,
            None => coeffs.to_f64()?,
        };
        idct_2d(&mut work, self.config.strategy)?;
        self.shift.denormalize(&mut work);
        Ok(work)
    }

    pub fn encode_block(&self, block: &Block<f64>) -> CodecResult<Vec<RunLengthSymbol>> {
        let coeffs = self.forward(block)?;
        let scanned = scan_block(&coeffs, &self.order)?;
        let symbols = encode_symbols(&scanned);
        trace!("encoded block into {} symbols", symbols.len());
        Ok(symbols)
    }

    pub fn decode_block(&self, symbols: &[RunLengthSymbol]) -> CodecResult<Block<f64>> {
        let coeffs = decode_block(symbols, self.block_size(), &self.order)?;
        self.inverse(&coeffs)
    }

    /// Encodes independent blocks in parallel; output order matches input.
    pub fn encode_blocks(&self, blocks: &[Block<f64>]) -> CodecResult<Vec<Vec<RunLengthSymbol>>> {
        debug!(
            "encoding {} blocks of {}x{}",
            blocks.len(),
            self.block_size(),
            self.block_size()
        );
        blocks.par_iter().map(|b| self.encode_block(b)).collect()
    }

    pub fn decode_blocks(&self, encoded: &[Vec<RunLengthSymbol>]) -> CodecResult<Vec<Block<f64>>> {
        debug!("decoding {} blocks", encoded.len());
        encoded.par_iter().map(|s| self.decode_block(s)).collect()
    }

    pub fn streaming(&self) -> StreamingEncoder<'_, O> {
        StreamingEncoder {
            codec: self,
            rle: RunLengthState::new(),
            blocks: 0,
        }
    }

    /// Decodes the output of a [`StreamingEncoder`] that covered `block_count` blocks.
    pub fn decode_stream(
        &self,
        symbols: &[RunLengthSymbol],
        block_count: usize,
    ) -> CodecResult<Vec<Block<f64>>> {
        let per_block = sample_count(self.block_size())?;
        let total = per_block.checked_mul(block_count).ok_or_else(|| {
            CodecError::NumericOverflow(format!(
                "{} blocks of {} samples overflow usize",
                block_count, per_block
            ))
        })?;
        let values = decode_symbols(symbols, total)?;
        values
            .chunks_exact(per_block)
            .map(|chunk| {
                let coeffs = unscan_block(chunk, self.block_size(), &self.order)?;
                self.inverse(&coeffs)
            })
            .collect()
    }
}

/// Encodes a sequence of blocks with one run-length state, so a run of equal
/// coefficients may continue from one block into the next.
///
/// The state is single-writer: blocks must be pushed in order from one thread.
pub struct StreamingEncoder<'a, O = Zigzag> {
    codec: &'a BlockCodec<O>,
    rle: RunLengthState,
    blocks: usize,
}

impl<O: ScanOrder + Sync> StreamingEncoder<'_, O> {
    pub fn push_block(&mut self, block: &Block<f64>) -> CodecResult<Vec<RunLengthSymbol>> {
        let coeffs = self.codec.forward(block)?;
        let order = &self.codec.order;
        let scan = order.start(coeffs.size())?;
        let (symbols, _, rle) = encode_block_streaming(&coeffs, order, scan, self.rle)?;
        self.rle = rle;
        self.blocks += 1;
        Ok(symbols)
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn values_consumed(&self) -> usize {
        self.rle.index
    }

    /// Closes the open run and returns it.
    pub fn finish(self) -> Option<RunLengthSymbol> {
        let (_, last) = self.rle.finish();
        debug!(
            "streaming encoder finished after {} blocks, {} values",
            self.blocks, self.rle.index
        );
        last
    }
}
