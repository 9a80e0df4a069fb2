use crate::block::Block;
use crate::error::{CodecError, CodecResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Basis scaling factor for frequency `u` of an `n`-point transform.
fn cu(u: usize, n: usize) -> f64 {
    if u == 0 {
        (1.0 / n as f64).sqrt()
    } else {
        (2.0 / n as f64).sqrt()
    }
}

fn basis(x: usize, u: usize, n: usize) -> f64 {
    (PI * ((2 * x + 1) * u) as f64 / (2 * n) as f64).cos()
}

fn check_len(values: &[f64]) -> CodecResult<()> {
    if values.is_empty() {
        return Err(CodecError::InvalidBlockSize(
            "transform needs at least one sample".into(),
        ));
    }
    Ok(())
}

/// Forward 1D DCT-II with orthonormal scaling, in place.
pub fn dct_1d(values: &mut [f64]) -> CodecResult<()> {
    check_len(values)?;
    let n = values.len();
    let mut out = vec![0.0f64; n];
    for (u, coeff) in out.iter_mut().enumerate() {
        let sum: f64 = values
            .iter()
            .enumerate()
            .map(|(x, &v)| v * basis(x, u, n))
            .sum();
        *coeff = cu(u, n) * sum;
    }
    values.copy_from_slice(&out);
    Ok(())
}

/// Inverse of [`dct_1d`], in place. The result is not rounded.
pub fn idct_1d(values: &mut [f64]) -> CodecResult<()> {
    check_len(values)?;
    let n = values.len();
    let mut out = vec![0.0f64; n];
    for (x, sample) in out.iter_mut().enumerate() {
        *sample = values
            .iter()
            .enumerate()
            .map(|(u, &c)| cu(u, n) * c * basis(x, u, n))
            .sum();
    }
    values.copy_from_slice(&out);
    Ok(())
}

pub fn round_samples(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = v.round();
    }
}

/// Forward 2D DCT: every row, then every column.
pub fn dct_2d(block: &mut Block<f64>) -> CodecResult<()> {
    let n = block.size();
    for r in 0..n {
        dct_1d(block.row_mut(r))?;
    }
    for c in 0..n {
        let mut column = block.column(c);
        dct_1d(&mut column)?;
        block.set_column(c, &column);
    }
    Ok(())
}

/// How the 2D inverse transform walks the block.
///
/// Both produce the same samples up to floating point noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdctStrategy {
    /// Columns first, then rows.
    #[default]
    Direct,
    /// Transpose + row pass, twice. Only ever touches contiguous rows.
    TransposeDoublePass,
}

impl IdctStrategy {
    pub fn apply(self, block: &mut Block<f64>) -> CodecResult<()> {
        match self {
            Self::Direct => idct_direct(block),
            Self::TransposeDoublePass => idct_transposed(block),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::TransposeDoublePass => "transpose-double-pass",
        }
    }
}

fn idct_direct(block: &mut Block<f64>) -> CodecResult<()> {
    let n = block.size();
    for c in 0..n {
        let mut column = block.column(c);
        idct_1d(&mut column)?;
        block.set_column(c, &column);
    }
    for r in 0..n {
        idct_1d(block.row_mut(r))?;
    }
    Ok(())
}

fn idct_transposed(block: &mut Block<f64>) -> CodecResult<()> {
    let n = block.size();
    for _ in 0..2 {
        block.transpose();
        for r in 0..n {
            idct_1d(block.row_mut(r))?;
        }
    }
    Ok(())
}

/// Inverse 2D DCT without the final rounding step.
pub fn idct_2d_raw(block: &mut Block<f64>, strategy: IdctStrategy) -> CodecResult<()> {
    strategy.apply(block)
}

/// Inverse 2D DCT, rounded to the nearest integer sample.
pub fn idct_2d(block: &mut Block<f64>, strategy: IdctStrategy) -> CodecResult<()> {
    strategy.apply(block)?;
    round_samples(block.as_mut_slice());
    Ok(())
}

pub fn dct_blocks(blocks: &mut [Block<f64>]) -> CodecResult<()> {
    blocks.par_iter_mut().try_for_each(dct_2d)
}

pub fn idct_blocks(blocks: &mut [Block<f64>], strategy: IdctStrategy) -> CodecResult<()> {
    blocks
        .par_iter_mut()
        .try_for_each(|block| idct_2d(block, strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gradient_rows(n: usize) -> Block<f64> {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|_| (1..=n).map(|v| v as f64).collect())
            .collect();
        Block::from_rows(rows).unwrap()
    }

    fn sample_8x8() -> Block<f64> {
        let rows: Vec<Vec<f64>> = vec![
            vec![10., 22., 53., 44., 81., 53., 35., 102.],
            vec![35., 43., 11., 48., 0., 110., 120., 90.],
            vec![12., 68., 35., 44., 5., 64., 79., 88.],
            vec![11., 24., 35., 74., 59., 65., 47., 88.],
            vec![71., 52., 83., 54., 59., 61., 78., 88.],
            vec![31., 29., 73., 44., 51., 46., 7., 8.],
            vec![12., 23., 36., 48., 50., 16., 78., 98.],
            vec![17., 92., 33., 74., 95., 96., 97., 81.],
        ];
        Block::from_rows(rows).unwrap()
    }

    #[test]
    fn test_dct_1d_three_samples() {
        let mut values = [1.0, 2.0, 3.0];
        dct_1d(&mut values).unwrap();
        assert_abs_diff_eq!(values[0], 3.464, epsilon = 0.001);
        assert_abs_diff_eq!(values[1], -1.414, epsilon = 0.001);
        assert_abs_diff_eq!(values[2], 0.0, epsilon = 0.001);

        idct_1d(&mut values).unwrap();
        round_samples(&mut values);
        assert_eq!(values, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_dct_1d_eight_samples() {
        let mut values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        dct_1d(&mut values).unwrap();
        let expected = [12.727, -6.442, 0.0, -0.673, 0.0, -0.200, 0.0, -0.050];
        for (got, want) in values.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 0.001);
        }

        idct_1d(&mut values).unwrap();
        round_samples(&mut values);
        assert_eq!(values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut empty: [f64; 0] = [];
        assert!(dct_1d(&mut empty).is_err());
        assert!(idct_1d(&mut empty).is_err());
    }

    #[test]
    fn test_dct_2d_three_by_three() {
        let mut block = gradient_rows(3);
        dct_2d(&mut block).unwrap();

        assert_abs_diff_eq!(block.get(0, 0), 6.0, epsilon = 0.001);
        assert_abs_diff_eq!(block.get(0, 1), -2.449, epsilon = 0.001);
        for r in 0..3 {
            for c in 0..3 {
                if (r, c) != (0, 0) && (r, c) != (0, 1) {
                    assert_abs_diff_eq!(block.get(r, c), 0.0, epsilon = 0.001);
                }
            }
        }

        idct_2d(&mut block, IdctStrategy::Direct).unwrap();
        assert_eq!(block, gradient_rows(3));
    }

    #[test]
    fn test_roundtrip_both_strategies() {
        for strategy in [IdctStrategy::Direct, IdctStrategy::TransposeDoublePass] {
            for original in [gradient_rows(8), sample_8x8()] {
                let mut block = original.clone();
                dct_2d(&mut block).unwrap();
                idct_2d(&mut block, strategy).unwrap();
                assert_eq!(block, original, "strategy {}", strategy.name());
            }
        }
    }

    #[test]
    fn test_strategies_agree_before_rounding() {
        let mut coeffs = sample_8x8();
        dct_2d(&mut coeffs).unwrap();

        let mut direct = coeffs.clone();
        let mut transposed = coeffs;
        idct_2d_raw(&mut direct, IdctStrategy::Direct).unwrap();
        idct_2d_raw(&mut transposed, IdctStrategy::TransposeDoublePass).unwrap();

        assert!(direct.max_abs_diff(&transposed) < 1e-9);
    }

    #[test]
    fn test_random_blocks_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0xdc7);
        for n in 1..=16 {
            for _ in 0..8 {
                let samples: Vec<f64> = (0..n * n)
                    .map(|_| rng.gen_range(-255..=255) as f64)
                    .collect();
                let original = Block::from_vec(n, samples).unwrap();

                let mut coeffs = original.clone();
                dct_2d(&mut coeffs).unwrap();
                for strategy in [IdctStrategy::Direct, IdctStrategy::TransposeDoublePass] {
                    let mut block = coeffs.clone();
                    idct_2d(&mut block, strategy).unwrap();
                    assert_eq!(block, original, "size {} strategy {}", n, strategy.name());
                }
            }
        }
    }

    #[test]
    fn test_scaling_follows_block_size() {
        // DC of a constant block equals value * n under orthonormal scaling
        for n in [1usize, 2, 4, 5, 8, 16] {
            let mut block = Block::filled(n, 3.0).unwrap();
            dct_2d(&mut block).unwrap();
            assert_abs_diff_eq!(block.get(0, 0), 3.0 * n as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_batch_matches_single() {
        let mut batch = vec![sample_8x8(), gradient_rows(8), sample_8x8()];
        dct_blocks(&mut batch).unwrap();

        let mut single = sample_8x8();
        dct_2d(&mut single).unwrap();
        assert_eq!(batch[0], single);

        idct_blocks(&mut batch, IdctStrategy::TransposeDoublePass).unwrap();
        assert_eq!(batch[1], gradient_rows(8));
        assert_eq!(batch[2], sample_8x8());
    }
}
