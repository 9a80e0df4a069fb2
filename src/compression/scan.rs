//! Resumable zigzag traversal of a square block.
//!
//! The traversal is a step function over an explicit [`ScanState`]: each call
//! to [`ScanOrder::step`] takes the current state by value, returns the
//! coordinate to visit and the state for the next call. Nothing is stored
//! between calls, so a caller can drive one block to completion or keep the
//! state around while interleaving other work.

use crate::block::{sample_count, Block};
use crate::error::{CodecError, CodecResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn index(&self, size: usize) -> usize {
        self.row * size + self.col
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Moving toward the top-right edge (row decreasing, column increasing).
    UpRight,
    /// Moving toward the bottom-left edge (row increasing, column decreasing).
    DownLeft,
    Finished,
}

/// Position of an in-progress traversal.
///
/// `row`/`col` is the next coordinate to be emitted and `emitted` counts the
/// coordinates already produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanState {
    pub size: usize,
    pub row: usize,
    pub col: usize,
    pub stage: ScanStage,
    pub emitted: usize,
}

impl ScanState {
    pub fn is_finished(&self) -> bool {
        self.stage == ScanStage::Finished
    }

    pub fn remaining(&self) -> usize {
        self.size
            .checked_mul(self.size)
            .map_or(0, |total| total.saturating_sub(self.emitted))
    }

    /// Checks the state can take another step and returns the block's sample count.
    pub fn validate(&self) -> CodecResult<usize> {
        if self.size == 0 {
            return Err(CodecError::InvalidScanState("size is zero".into()));
        }
        let total = self.size.checked_mul(self.size).ok_or_else(|| {
            CodecError::InvalidScanState(format!("size {} is too large", self.size))
        })?;
        if self.is_finished() || self.emitted >= total {
            return Err(CodecError::ScanExhausted(total));
        }
        if self.row >= self.size || self.col >= self.size {
            return Err(CodecError::InvalidScanState(format!(
                "position ({}, {}) outside {}x{} block",
                self.row, self.col, self.size, self.size
            )));
        }
        Ok(total)
    }
}

/// Phase logic of a block traversal.
///
/// Callers only see `start` and `step`, so the ordering can be replaced
/// without touching anything that consumes coordinates.
pub trait ScanOrder {
    fn start(&self, size: usize) -> CodecResult<ScanState>;

    fn step(&self, state: ScanState) -> CodecResult<(Coord, ScanState)>;
}

/// Standard diagonal zigzag, low to high frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zigzag;

impl ScanOrder for Zigzag {
    fn start(&self, size: usize) -> CodecResult<ScanState> {
        sample_count(size)?;
        Ok(ScanState {
            size,
            row: 0,
            col: 0,
            stage: ScanStage::UpRight,
            emitted: 0,
        })
    }

    fn step(&self, state: ScanState) -> CodecResult<(Coord, ScanState)> {
        let total = state.validate()?;
        let coord = Coord::new(state.row, state.col);
        let last = state.size - 1;
        let emitted = state.emitted + 1;

        if emitted == total {
            let next = ScanState {
                stage: ScanStage::Finished,
                emitted,
                ..state
            };
            return Ok((coord, next));
        }

        let (row, col, stage) = match state.stage {
            ScanStage::UpRight => {
                if state.col == last {
                    (state.row + 1, state.col, ScanStage::DownLeft)
                } else if state.row == 0 {
                    (state.row, state.col + 1, ScanStage::DownLeft)
                } else {
                    (state.row - 1, state.col + 1, ScanStage::UpRight)
                }
            }
            ScanStage::DownLeft => {
                if state.row == last {
                    (state.row, state.col + 1, ScanStage::UpRight)
                } else if state.col == 0 {
                    (state.row + 1, state.col, ScanStage::UpRight)
                } else {
                    (state.row + 1, state.col - 1, ScanStage::DownLeft)
                }
            }
            ScanStage::Finished => unreachable!("validated above"),
        };

        let next = ScanState {
            size: state.size,
            row,
            col,
            stage,
            emitted,
        };
        Ok((coord, next))
    }
}

/// Iterator over the coordinates of a traversal, resumable through [`ScanCursor::state`].
pub struct ScanCursor<'a, O: ScanOrder + ?Sized> {
    order: &'a O,
    state: ScanState,
}

impl<'a, O: ScanOrder + ?Sized> ScanCursor<'a, O> {
    pub fn new(order: &'a O, size: usize) -> CodecResult<Self> {
        let state = order.start(size)?;
        Ok(Self { order, state })
    }

    pub fn resume(order: &'a O, state: ScanState) -> Self {
        Self { order, state }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }
}

impl<O: ScanOrder + ?Sized> Iterator for ScanCursor<'_, O> {
    type Item = CodecResult<Coord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_finished() {
            return None;
        }
        match self.order.step(self.state) {
            Ok((coord, next)) => {
                self.state = next;
                Some(Ok(coord))
            }
            Err(e) => {
                self.state.stage = ScanStage::Finished;
                Some(Err(e))
            }
        }
    }
}

/// Row-major index of every scan position, in scan order.
pub fn scan_table<O: ScanOrder + ?Sized>(order: &O, size: usize) -> CodecResult<Vec<usize>> {
    ScanCursor::new(order, size)?
        .map(|coord| coord.map(|c| c.index(size)))
        .collect()
}

pub fn scan_block<T: Copy, O: ScanOrder + ?Sized>(
    block: &Block<T>,
    order: &O,
) -> CodecResult<Vec<T>> {
    let mut out = Vec::with_capacity(block.len());
    for coord in ScanCursor::new(order, block.size())? {
        let c = coord?;
        out.push(block.get(c.row, c.col));
    }
    Ok(out)
}

pub fn unscan_block<T: Copy + Default, O: ScanOrder + ?Sized>(
    sequence: &[T],
    size: usize,
    order: &O,
) -> CodecResult<Block<T>> {
    if sequence.len() != sample_count(size)? {
        return Err(CodecError::InvalidBlockSize(format!(
            "sequence of {} values cannot fill a {}x{} block",
            sequence.len(),
            size,
            size
        )));
    }
    let mut block = Block::filled(size, T::default())?;
    for (coord, &value) in ScanCursor::new(order, size)?.zip(sequence.iter()) {
        let c = coord?;
        block.set(c.row, c.col, value);
    }
    Ok(block)
}
