//! Compress a sorted identifier sequence into runs of consecutive integers.
//!
//! The input is expected in ascending order. Only adjacent duplicates are
//! removed and nothing is sorted, so an unsorted file yields more (and
//! possibly overlapping) blocks than its distinct values would suggest.

use crate::extract::extract_number;
use crate::model::{Row, SerialBlock};

/// Incremental grouper: feed numbers in file order, then call [`finish`](Self::finish)
#[derive(Debug, Default)]
pub struct BlockBuilder {
    blocks: Vec<SerialBlock>,
    open: Option<SerialBlock>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: u64) {
        match self.open.as_mut() {
            // Repeat of the last kept value
            Some(block) if block.end == value => {}
            Some(block) if block.end.checked_add(1) == Some(value) => block.extend(),
            Some(block) => {
                let closed = *block;
                self.blocks.push(closed);
                self.open = Some(SerialBlock::single(value));
            }
            None => self.open = Some(SerialBlock::single(value)),
        }
    }

    /// Flush the open block and return every block in input order
    pub fn finish(mut self) -> Vec<SerialBlock> {
        if let Some(block) = self.open.take() {
            self.blocks.push(block);
        }
        self.blocks
    }
}

/// Group a number sequence into serial blocks
pub fn group_numbers<I>(numbers: I) -> Vec<SerialBlock>
where
    I: IntoIterator<Item = u64>,
{
    let mut builder = BlockBuilder::new();
    for value in numbers {
        builder.push(value);
    }
    builder.finish()
}

/// Extract the identifier of every row and group the ones that have one
pub fn group_into_serial_blocks(rows: &[Row]) -> Vec<SerialBlock> {
    group_numbers(rows.iter().filter_map(extract_number))
}

/// Every identifier covered by `blocks`, in block order
pub fn expand_blocks(blocks: &[SerialBlock]) -> impl Iterator<Item = u64> + '_ {
    blocks.iter().flat_map(SerialBlock::values)
}

/// Count rows with and without an identifier: `(with, without)`
pub fn count_identifiers(rows: &[Row]) -> (usize, usize) {
    let with = rows.iter().filter(|row| extract_number(row).is_some()).count();
    (with, rows.len() - with)
}
