use super::scan::{ScanCursor, ScanOrder, ScanState};
use crate::block::{sample_count, Block};
use crate::error::{CodecError, CodecResult};

/// `value` repeated `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengthSymbol {
    pub count: u32,
    pub value: i32,
}

impl RunLengthSymbol {
    pub fn new(count: u32, value: i32) -> Self {
        Self { count, value }
    }
}

/// Groups `values` into maximal runs.
///
/// A run longer than `u32::MAX` continues as a second symbol with the same value.
pub fn encode_symbols(values: &[i32]) -> Vec<RunLengthSymbol> {
    let mut symbols: Vec<RunLengthSymbol> = Vec::new();
    for &value in values {
        match symbols.last_mut() {
            Some(run) if run.value == value && run.count < u32::MAX => run.count += 1,
            _ => symbols.push(RunLengthSymbol::new(1, value)),
        }
    }
    symbols
}

/// Flat form: `count, value, count, value, ...`.
pub fn run_length_encode(values: &[i32]) -> CodecResult<Vec<i32>> {
    flatten(&encode_symbols(values))
}

/// Fails with [`CodecError::NumericOverflow`] if a count does not fit the flat
/// form's `i32` slot.
pub fn flatten(symbols: &[RunLengthSymbol]) -> CodecResult<Vec<i32>> {
    let mut out = Vec::with_capacity(symbols.len() * 2);
    for s in symbols {
        let count = i32::try_from(s.count).map_err(|_| {
            CodecError::NumericOverflow(format!("run of {} does not fit a flat count", s.count))
        })?;
        out.push(count);
        out.push(s.value);
    }
    Ok(out)
}

/// Parses a flat `count, value` stream back into symbols.
pub fn parse_symbols(flat: &[i32]) -> CodecResult<Vec<RunLengthSymbol>> {
    if flat.len() % 2 != 0 {
        return Err(CodecError::OddSymbolStream(flat.len()));
    }
    flat.chunks_exact(2)
        .enumerate()
        .map(|(position, pair)| {
            let count = pair[0];
            if count < 1 {
                return Err(CodecError::InvalidRunCount {
                    position,
                    count: count as i64,
                });
            }
            Ok(RunLengthSymbol::new(count as u32, pair[1]))
        })
        .collect()
}

pub fn run_length_decode(flat: &[i32]) -> CodecResult<Vec<i32>> {
    let symbols = parse_symbols(flat)?;
    Ok(expand(&symbols))
}

/// Like [`run_length_decode`] but also requires the runs to cover exactly
/// `expected_len` values.
pub fn run_length_decode_exact(flat: &[i32], expected_len: usize) -> CodecResult<Vec<i32>> {
    let symbols = parse_symbols(flat)?;
    decode_symbols(&symbols, expected_len)
}

pub fn decode_symbols(symbols: &[RunLengthSymbol], expected_len: usize) -> CodecResult<Vec<i32>> {
    let mut total = 0usize;
    for (position, s) in symbols.iter().enumerate() {
        if s.count == 0 {
            return Err(CodecError::InvalidRunCount { position, count: 0 });
        }
        total = total
            .checked_add(s.count as usize)
            .ok_or_else(|| CodecError::NumericOverflow("run counts overflow usize".into()))?;
    }
    if total != expected_len {
        return Err(CodecError::CountMismatch {
            expected: expected_len,
            actual: total,
        });
    }
    Ok(expand(symbols))
}

fn expand(symbols: &[RunLengthSymbol]) -> Vec<i32> {
    let mut out = Vec::with_capacity(symbols.iter().map(|s| s.count as usize).sum());
    for s in symbols {
        out.extend(std::iter::repeat(s.value).take(s.count as usize));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// No open run; the next value starts a new symbol.
    #[default]
    Ready,
    /// A run is open and may still grow.
    MidRun(RunLengthSymbol),
}

/// Encoder progress that can be carried between calls.
///
/// `index` counts every value consumed since the state was created, so it
/// keeps growing across block boundaries when the caller does not reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunLengthState {
    pub index: usize,
    pub status: RunStatus,
}

impl RunLengthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one value. Returns the run closed by it, if any.
    ///
    /// A run that would exceed `u32::MAX` is closed and a new one opened.
    pub fn push(self, value: i32) -> (Self, Option<RunLengthSymbol>) {
        let index = self.index.saturating_add(1);
        match self.status {
            RunStatus::MidRun(run) if run.value == value => match run.count.checked_add(1) {
                Some(count) => (
                    Self {
                        index,
                        status: RunStatus::MidRun(RunLengthSymbol::new(count, value)),
                    },
                    None,
                ),
                None => (
                    Self {
                        index,
                        status: RunStatus::MidRun(RunLengthSymbol::new(1, value)),
                    },
                    Some(run),
                ),
            },
            RunStatus::MidRun(run) => (
                Self {
                    index,
                    status: RunStatus::MidRun(RunLengthSymbol::new(1, value)),
                },
                Some(run),
            ),
            RunStatus::Ready => (
                Self {
                    index,
                    status: RunStatus::MidRun(RunLengthSymbol::new(1, value)),
                },
                None,
            ),
        }
    }

    /// Closes the open run, if any.
    pub fn finish(self) -> (Self, Option<RunLengthSymbol>) {
        let closed = match self.status {
            RunStatus::MidRun(run) => Some(run),
            RunStatus::Ready => None,
        };
        (
            Self {
                index: self.index,
                status: RunStatus::Ready,
            },
            closed,
        )
    }

    pub fn push_all(self, values: &[i32], out: &mut Vec<RunLengthSymbol>) -> Self {
        values.iter().fold(self, |state, &v| {
            let (next, closed) = state.push(v);
            out.extend(closed);
            next
        })
    }
}

/// Scans `block` and feeds every coefficient through the run-length state.
///
/// Both states are taken by value and returned, so the open run at the end of
/// this block continues into the next one unless the caller calls
/// [`RunLengthState::finish`]. `scan` must be a fresh or partially advanced
/// state for a traversal of `block.size()`.
pub fn encode_block_streaming<O: ScanOrder + ?Sized>(
    block: &Block<i32>,
    order: &O,
    scan: ScanState,
    rle: RunLengthState,
) -> CodecResult<(Vec<RunLengthSymbol>, ScanState, RunLengthState)> {
    if scan.size != block.size() {
        return Err(CodecError::InvalidScanState(format!(
            "scan state for {}x{} used on a {}x{} block",
            scan.size,
            scan.size,
            block.size(),
            block.size()
        )));
    }
    let mut symbols = Vec::new();
    let mut rle = rle;
    let mut cursor = ScanCursor::resume(order, scan);
    for coord in cursor.by_ref() {
        let c = coord?;
        let (next, closed) = rle.push(block.get(c.row, c.col));
        symbols.extend(closed);
        rle = next;
    }
    Ok((symbols, cursor.state(), rle))
}

/// Expands `symbols` and places the values back in scan order.
pub fn decode_block<O: ScanOrder + ?Sized>(
    symbols: &[RunLengthSymbol],
    size: usize,
    order: &O,
) -> CodecResult<Block<i32>> {
    let values = decode_symbols(symbols, sample_count(size)?)?;
    super::scan::unscan_block(&values, size, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::scan::{scan_block, Zigzag};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn coefficient_block() -> Block<i32> {
        Block::from_rows(vec![
            vec![160, 44, 20, 80, 24, 0, 0, 0],
            vec![36, 108, 14, 38, 26, 0, 0, 0],
            vec![-98, -65, 16, -48, -40, 0, 0, 0],
            vec![-42, -85, 0, -29, 0, 0, 0, 0],
            vec![-36, 22, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 5, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0, 0, 0, 1],
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_repeated_values() {
        let input = [5, 5, 66, 21, 1, 0, 0, 0, 0, 2];
        let encoded = run_length_encode(&input).unwrap();
        assert_eq!(encoded, vec![2, 5, 1, 66, 1, 21, 1, 1, 4, 0, 1, 2]);
        assert_eq!(run_length_decode(&encoded).unwrap(), input.to_vec());
    }

    #[test]
    fn test_encode_without_repeats() {
        let input = [5, 3, 66, 21, 1, 4, 6, 7, 8, 2];
        let encoded = run_length_encode(&input).unwrap();
        assert_eq!(encoded.len(), 20);
        for pair in encoded.chunks(2) {
            assert_eq!(pair[0], 1);
        }
        let values: Vec<i32> = encoded.chunks(2).map(|p| p[1]).collect();
        assert_eq!(values, input.to_vec());
    }

    #[test]
    fn test_zero_is_not_special() {
        let encoded = run_length_encode(&[5, 3, 0, 21, 5, 4, 0, 7, 8, 2]).unwrap();
        assert_eq!(encoded[4..6], [1, 0]);
        assert_eq!(encoded[12..14], [1, 0]);
    }

    #[test]
    fn test_decode_flat_stream() {
        let decoded = run_length_decode(&[2, 5, 1, 66, 1, 21, 1, 1, 4, 0, 1, 2]).unwrap();
        assert_eq!(decoded, vec![5, 5, 66, 21, 1, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(run_length_encode(&[7]).unwrap(), vec![1, 7]);
        assert!(run_length_encode(&[]).unwrap().is_empty());
        assert!(run_length_decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_long_run_is_not_capped() {
        let input = vec![3; 100_000];
        assert_eq!(run_length_encode(&input).unwrap(), vec![100_000, 3]);
    }

    #[test]
    fn test_counts_beyond_flat_range() {
        let fits = [RunLengthSymbol::new(i32::MAX as u32, 4)];
        assert_eq!(flatten(&fits).unwrap(), vec![i32::MAX, 4]);

        let too_long = [RunLengthSymbol::new(u32::MAX, 0)];
        assert!(matches!(
            flatten(&too_long),
            Err(CodecError::NumericOverflow(_))
        ));
        assert!(matches!(
            decode_symbols(&too_long, 3),
            Err(CodecError::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_streaming_run_splits_at_count_limit() {
        let full = RunLengthState {
            index: 7,
            status: RunStatus::MidRun(RunLengthSymbol::new(u32::MAX, 0)),
        };
        let (next, closed) = full.push(0);
        assert_eq!(closed, Some(RunLengthSymbol::new(u32::MAX, 0)));
        assert_eq!(next.status, RunStatus::MidRun(RunLengthSymbol::new(1, 0)));
        assert_eq!(next.index, 8);
    }

    #[test]
    fn test_random_sequences_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let len: usize = rng.gen_range(0..300);
            // Small alphabet so runs of every length show up.
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(-2..=2)).collect();

            let symbols = encode_symbols(&values);
            assert!(symbols.windows(2).all(|w| w[0].value != w[1].value));
            assert!(symbols.iter().all(|s| s.count >= 1));

            let flat = run_length_encode(&values).unwrap();
            assert_eq!(run_length_decode(&flat).unwrap(), values);
            assert_eq!(run_length_decode_exact(&flat, values.len()).unwrap(), values);

            let mut streamed = Vec::new();
            let mut state = RunLengthState::new();
            for chunk in values.chunks(rng.gen_range(1..=17)) {
                state = state.push_all(chunk, &mut streamed);
            }
            streamed.extend(state.finish().1);
            assert_eq!(streamed, symbols);
        }
    }

    #[test]
    fn test_decode_block_rejects_oversized() {
        let huge = 1usize << (usize::BITS / 2);
        assert!(matches!(
            decode_block(&[], huge, &Zigzag),
            Err(CodecError::InvalidBlockSize(_))
        ));
    }

    #[test]
    fn test_malformed_streams() {
        assert!(matches!(
            run_length_decode(&[2, 5, 1]),
            Err(CodecError::OddSymbolStream(3))
        ));
        assert!(matches!(
            run_length_decode(&[2, 5, 0, 9]),
            Err(CodecError::InvalidRunCount { position: 1, .. })
        ));
        assert!(matches!(
            run_length_decode(&[-1, 5]),
            Err(CodecError::InvalidRunCount { position: 0, .. })
        ));
        assert!(matches!(
            run_length_decode_exact(&[2, 5, 1, 6], 4),
            Err(CodecError::CountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_streaming_matches_batch() {
        let input = [9, 9, 9, 1, 0, 0, 0, 0, 4, 4];
        let mut symbols = Vec::new();
        let mut state = RunLengthState::new();
        for chunk in input.chunks(3) {
            state = state.push_all(chunk, &mut symbols);
        }
        let (state, last) = state.finish();
        symbols.extend(last);

        assert_eq!(symbols, encode_symbols(&input));
        assert_eq!(state.index, input.len());
        assert_eq!(state.status, RunStatus::Ready);
    }

    #[test]
    fn test_finish_on_fresh_state() {
        let (state, closed) = RunLengthState::new().finish();
        assert!(closed.is_none());
        assert_eq!(state.index, 0);
    }

    #[test]
    fn test_block_streaming_encode() {
        let block = coefficient_block();
        let scan = Zigzag.start(8).unwrap();
        let (mut symbols, scan, rle) =
            encode_block_streaming(&block, &Zigzag, scan, RunLengthState::new()).unwrap();
        assert!(scan.is_finished());
        assert_eq!(rle.index, 64);

        // Trailing 1 at (7, 7) is still open.
        assert_eq!(rle.status, RunStatus::MidRun(RunLengthSymbol::new(1, 1)));
        let (_, last) = rle.finish();
        symbols.extend(last);

        let scanned = scan_block(&block, &Zigzag).unwrap();
        assert_eq!(symbols, encode_symbols(&scanned));
        assert_eq!(decode_block(&symbols, 8, &Zigzag).unwrap(), block);
    }

    #[test]
    fn test_runs_span_blocks() {
        let zeros = Block::new(4).unwrap();
        let scan = Zigzag.start(4).unwrap();
        let (first, _, rle) =
            encode_block_streaming(&zeros, &Zigzag, scan, RunLengthState::new()).unwrap();
        assert!(first.is_empty());

        let scan = Zigzag.start(4).unwrap();
        let (second, _, rle) = encode_block_streaming(&zeros, &Zigzag, scan, rle).unwrap();
        assert!(second.is_empty());

        let (_, last) = rle.finish();
        assert_eq!(last, Some(RunLengthSymbol::new(32, 0)));
    }

    #[test]
    fn test_scan_size_mismatch() {
        let block = coefficient_block();
        let scan = Zigzag.start(4).unwrap();
        assert!(encode_block_streaming(&block, &Zigzag, scan, RunLengthState::new()).is_err());
    }
}
