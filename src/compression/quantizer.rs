use crate::block::Block;
use crate::error::{CodecError, CodecResult};

pub const JPEG_LUMINANCE_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

pub const DEFAULT_LEVEL_SHIFT: f64 = 128.0;

/// Centers samples around zero before the forward transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelShift {
    pub offset: f64,
}

impl Default for LevelShift {
    fn default() -> Self {
        Self {
            offset: DEFAULT_LEVEL_SHIFT,
        }
    }
}

impl LevelShift {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    pub fn normalize(&self, block: &mut Block<f64>) {
        for v in block.as_mut_slice() {
            *v -= self.offset;
        }
    }

    pub fn denormalize(&self, block: &mut Block<f64>) {
        for v in block.as_mut_slice() {
            *v += self.offset;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationTable {
    pub table: [u16; 64],
}

impl QuantizationTable {
    pub const SIZE: usize = 8;

    /// IJG quality scaling of the standard luminance table.
    pub fn for_quality(quality: u8) -> Self {
        let quality = quality.clamp(1, 100) as u32;
        let scale = if quality < 50 {
            5000 / quality
        } else {
            200 - quality * 2
        };

        let mut table = [0u16; 64];
        for (q, &base) in table.iter_mut().zip(JPEG_LUMINANCE_QUANT.iter()) {
            let val = (base as u32 * scale + 50) / 100;
            *q = val.clamp(1, 255) as u16;
        }

        Self { table }
    }

    pub fn flat() -> Self {
        Self { table: [1u16; 64] }
    }

    fn check(block_size: usize) -> CodecResult<()> {
        if block_size != Self::SIZE {
            return Err(CodecError::InvalidBlockSize(format!(
                "quantization tables are {}x{}, block is {}x{}",
                Self::SIZE,
                Self::SIZE,
                block_size,
                block_size
            )));
        }
        Ok(())
    }

    /// Divides each coefficient by its table entry and rounds.
    pub fn quantize(&self, coeffs: &Block<f64>) -> CodecResult<Block<i32>> {
        Self::check(coeffs.size())?;
        let mut scaled = coeffs.clone();
        for (v, &q) in scaled.as_mut_slice().iter_mut().zip(self.table.iter()) {
            *v /= q as f64;
        }
        scaled.round_to_i32()
    }

    pub fn dequantize(&self, levels: &Block<i32>) -> CodecResult<Block<f64>> {
        Self::check(levels.size())?;
        let mut out = levels.to_f64()?;
        for (v, &q) in out.as_mut_slice().iter_mut().zip(self.table.iter()) {
            *v *= q as f64;
        }
        Ok(out)
    }
}
