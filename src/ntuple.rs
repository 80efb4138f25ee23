//! N-tuple value network over board afterstates.
//!
//! Each [`PatternTable`] owns one pattern (a fixed, ordered set of board
//! cells), the 8 symmetric views of that pattern, and a dense `f32` table of
//! size `16^K` indexed by the packed nibble ranks of the viewed cells. A
//! [`TupleNetwork`] is an ordered, fixed collection of tables whose estimate
//! is the sum of the table estimates.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::{Index, IndexMut};
use std::path::Path;

use crate::engine::Board;

/// The 8 symmetries of the square: identity, three clockwise rotations, and
/// their mirror images.
pub const SYMMETRIES: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum WeightError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("table {index}: expected {expected} cells, file has {found}")]
    SizeMismatch { index: usize, expected: u64, found: u64 },
    #[error("file ends before table {index} is complete")]
    Truncated { index: usize },
    #[error("trailing bytes after the last table")]
    TrailingData,
}

fn rotate_cw(idx: usize) -> usize {
    let (row, col) = (idx / 4, idx % 4);
    col * 4 + (3 - row)
}

fn mirror(idx: usize) -> usize {
    let (row, col) = (idx / 4, idx % 4);
    row * 4 + (3 - col)
}

/// Image of cell `idx` under symmetry `iso` (0..8): mirror for the upper
/// half, then `iso % 4` clockwise rotations.
fn transform(idx: usize, iso: usize) -> usize {
    let mut out = idx;
    if iso >= 4 {
        out = mirror(out);
    }
    for _ in 0..(iso % 4) {
        out = rotate_cw(out);
    }
    out
}

/// One dense lookup table over a fixed pattern of board cells, expanded into
/// its 8 symmetric views at construction.
pub struct PatternTable {
    pattern: Vec<usize>,
    views: Vec<Vec<usize>>,
    values: Vec<f32>,
}

impl PatternTable {
    /// Build a zero-initialized table for `pattern`.
    ///
    /// Panics when the pattern is empty, longer than 8 cells, or names a
    /// cell outside the board; configuration parsing rejects such patterns
    /// before they reach here.
    pub fn new(pattern: &[usize]) -> Self {
        assert!(
            !pattern.is_empty() && pattern.len() <= 8,
            "pattern length must be in 1..=8"
        );
        assert!(pattern.iter().all(|&c| c < 16), "pattern cells must be in 0..16");
        let views = (0..SYMMETRIES)
            .map(|iso| pattern.iter().map(|&cell| transform(cell, iso)).collect())
            .collect();
        let values = vec![0.0; 1 << (pattern.len() * 4)];
        PatternTable { pattern: pattern.to_vec(), views, values }
    }

    /// The base pattern this table is indexed by.
    pub fn pattern(&self) -> &[usize] {
        &self.pattern
    }

    /// Number of table cells (`16^K`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn index(view: &[usize], board: &Board) -> usize {
        view.iter()
            .enumerate()
            .fold(0, |ix, (i, &cell)| ix | (board.rank(cell) as usize) << (i * 4))
    }

    /// Sum of the table entries addressed by all 8 views of `board`.
    pub fn estimate(&self, board: &Board) -> f32 {
        self.views
            .iter()
            .map(|view| self.values[Self::index(view, board)])
            .sum()
    }

    /// Add the full `delta` (not `delta / 8`) to the entry addressed by
    /// each of the 8 views and return the sum of the post-update entries.
    /// One observed transition trains all its symmetric equivalents.
    pub fn update(&mut self, board: &Board, delta: f32) -> f32 {
        let mut sum = 0.0;
        for view in &self.views {
            let ix = Self::index(view, board);
            self.values[ix] += delta;
            sum += self.values[ix];
        }
        sum
    }
}

impl Index<usize> for PatternTable {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.values[i]
    }
}

impl IndexMut<usize> for PatternTable {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.values[i]
    }
}

/// The four 6-cell patterns the trainer uses by default: two horizontal
/// 2x3 blocks and the top two rows split into overlapping halves.
pub fn default_patterns() -> Vec<Vec<usize>> {
    vec![
        vec![0, 1, 2, 3, 4, 5],
        vec![4, 5, 6, 7, 8, 9],
        vec![0, 1, 2, 4, 5, 6],
        vec![4, 5, 6, 8, 9, 10],
    ]
}

/// An ordered, fixed-composition collection of pattern tables.
pub struct TupleNetwork {
    tables: Vec<PatternTable>,
}

impl TupleNetwork {
    pub fn new(patterns: &[Vec<usize>]) -> Self {
        assert!(!patterns.is_empty(), "a network needs at least one pattern");
        TupleNetwork { tables: patterns.iter().map(|p| PatternTable::new(p)).collect() }
    }

    pub fn tables(&self) -> &[PatternTable] {
        &self.tables
    }

    pub fn table_mut(&mut self, i: usize) -> &mut PatternTable {
        &mut self.tables[i]
    }

    /// Value estimate for `board`: the sum over all tables.
    pub fn estimate(&self, board: &Board) -> f32 {
        self.tables.iter().map(|table| table.estimate(board)).sum()
    }

    /// Split `delta` evenly across the tables, apply it to each, and return
    /// the summed post-update value of `board`.
    pub fn update(&mut self, board: &Board, delta: f32) -> f32 {
        let split = delta / self.tables.len() as f32;
        self.tables.iter_mut().map(|table| table.update(board, split)).sum()
    }

    /// Write every table in construction order: `[u64 cell count]` followed
    /// by that many `f32` entries, all little-endian, no header or checksum.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), WeightError> {
        let mut out = BufWriter::new(File::create(path)?);
        for table in &self.tables {
            out.write_all(&(table.values.len() as u64).to_le_bytes())?;
            for &v in &table.values {
                out.write_all(&v.to_le_bytes())?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Read tables in construction order, in the exact layout written by
    /// [`Self::save_to_path`]. Each record's cell count must match the
    /// constructed table it binds to; mismatch, truncation and trailing
    /// bytes are all rejected.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), WeightError> {
        let mut input = BufReader::new(File::open(path)?);
        for (index, table) in self.tables.iter_mut().enumerate() {
            let mut header = [0u8; 8];
            read_exact_or_truncated(&mut input, &mut header, index)?;
            let found = u64::from_le_bytes(header);
            if found != table.values.len() as u64 {
                return Err(WeightError::SizeMismatch {
                    index,
                    expected: table.values.len() as u64,
                    found,
                });
            }
            let mut bytes = vec![0u8; table.values.len() * 4];
            read_exact_or_truncated(&mut input, &mut bytes, index)?;
            for (slot, chunk) in table.values.iter_mut().zip(bytes.chunks_exact(4)) {
                *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
        }
        let mut probe = [0u8; 1];
        match input.read(&mut probe)? {
            0 => Ok(()),
            _ => Err(WeightError::TrailingData),
        }
    }
}

fn read_exact_or_truncated<R: Read>(
    input: &mut R,
    buf: &mut [u8],
    index: usize,
) -> Result<(), WeightError> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WeightError::Truncated { index }
        } else {
            WeightError::Io(e)
        }
    })
}
