use crate::error::{CodecError, CodecResult};
use num_traits::{NumCast, ToPrimitive, Zero};

/// Square N×N matrix of samples stored row-major.
///
/// Every constructor checks `rows == columns == size` and `size > 0`, so the
/// transform and scan code never needs a separately passed size.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy + Zero> Block<T> {
    pub fn new(size: usize) -> CodecResult<Self> {
        let samples = sample_count(size)?;
        Ok(Self {
            size,
            data: vec![T::zero(); samples],
        })
    }
}

impl<T: Copy> Block<T> {
    pub fn from_vec(size: usize, data: Vec<T>) -> CodecResult<Self> {
        let samples = sample_count(size)?;
        if data.len() != samples {
            return Err(CodecError::InvalidBlockSize(format!(
                "expected {} samples for a {}x{} block, got {}",
                samples,
                size,
                size,
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> CodecResult<Self> {
        let size = rows.len();
        let mut data = Vec::with_capacity(sample_count(size)?);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(CodecError::InvalidBlockSize(format!(
                    "row {} has {} columns, block has {} rows",
                    r,
                    row.len(),
                    size
                )));
            }
            data.extend(row);
        }
        Ok(Self { size, data })
    }

    pub fn filled(size: usize, value: T) -> CodecResult<Self> {
        let samples = sample_count(size)?;
        Ok(Self {
            size,
            data: vec![value; samples],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of samples, always `size * size`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.size + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let n = self.size;
        &mut self.data[row * n..(row + 1) * n]
    }

    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.size).map(|r| self.get(r, col)).collect()
    }

    pub fn set_column(&mut self, col: usize, values: &[T]) {
        for (r, &v) in values.iter().enumerate().take(self.size) {
            self.set(r, col, v);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn map<U, F: FnMut(T) -> U>(&self, f: F) -> Block<U> {
        Block {
            size: self.size,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// In-place transpose: element (r, c) moves to (c, r).
    pub fn transpose(&mut self) {
        let n = self.size;
        for r in 0..n {
            for c in (r + 1)..n {
                self.data.swap(r * n + c, c * n + r);
            }
        }
    }
}

impl<T: Copy + ToPrimitive> Block<T> {
    pub fn to_f64(&self) -> CodecResult<Block<f64>> {
        let data = self
            .data
            .iter()
            .map(|&v| {
                v.to_f64().ok_or_else(|| {
                    CodecError::NumericOverflow("sample not representable as f64".into())
                })
            })
            .collect::<CodecResult<Vec<f64>>>()?;
        Ok(Block {
            size: self.size,
            data,
        })
    }
}

impl Block<f64> {
    /// Rounds every sample half away from zero and narrows to `i32`.
    pub fn round_to_i32(&self) -> CodecResult<Block<i32>> {
        let data = self
            .data
            .iter()
            .map(|&v| {
                <i32 as NumCast>::from(v.round()).ok_or_else(|| {
                    CodecError::NumericOverflow(format!("{} does not fit in i32", v))
                })
            })
            .collect::<CodecResult<Vec<i32>>>()?;
        Ok(Block {
            size: self.size,
            data,
        })
    }

    pub fn max_abs_diff(&self, other: &Block<f64>) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// Number of samples in a `size`×`size` block.
///
/// Rejects zero and any size whose square does not fit in `usize`.
pub fn sample_count(size: usize) -> CodecResult<usize> {
    if size == 0 {
        return Err(CodecError::InvalidBlockSize(
            "block size must be positive".into(),
        ));
    }
    size.checked_mul(size).ok_or_else(|| {
        CodecError::InvalidBlockSize(format!("{}x{} block is too large", size, size))
    })
}
