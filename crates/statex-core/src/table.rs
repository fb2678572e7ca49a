//! Table sources: recover table rows from page text.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::{RawDocument, TableBlock};

lazy_static! {
    static ref CELL_GAP: Regex = Regex::new(r" {2,}|\t+").unwrap();
}

/// Trait for table providers.
pub trait TableSource: Send + Sync {
    /// Tables found in a document, in page order.
    fn tables(&self, doc: &RawDocument) -> Vec<TableBlock>;
}

/// Reads tables from column-aligned text.
///
/// Cells are separated by runs of two or more spaces (or tabs). Consecutive
/// lines with at least `min_cells` cells form one block; any other line
/// closes the block.
#[derive(Debug, Clone)]
pub struct GapTableSource {
    min_cells: usize,
}

impl GapTableSource {
    pub fn new(min_cells: usize) -> Self {
        Self {
            min_cells: min_cells.max(2),
        }
    }

    /// Cells of one raw line.
    pub fn cells(line: &str) -> Vec<String> {
        CELL_GAP
            .split(line.trim())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for GapTableSource {
    fn default() -> Self {
        Self::new(3)
    }
}

impl TableSource for GapTableSource {
    fn tables(&self, doc: &RawDocument) -> Vec<TableBlock> {
        let mut blocks = Vec::new();

        for page in &doc.pages {
            let mut current = TableBlock::new(page.number);
            for line in page.text.lines() {
                let cells = Self::cells(line);
                if cells.len() >= self.min_cells {
                    current = current.with_row(cells);
                } else if !current.is_empty() {
                    blocks.push(std::mem::replace(&mut current, TableBlock::new(page.number)));
                }
            }
            if !current.is_empty() {
                blocks.push(current);
            }
        }

        debug!("Found {} table block(s) in {}", blocks.len(), doc.source);
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cells_split_on_wide_gaps() {
        assert_eq!(
            GapTableSource::cells("  INE040A01034   HDFC BANK LTD\tFinal Dividend  "),
            vec!["INE040A01034", "HDFC BANK LTD", "Final Dividend"]
        );
    }

    #[test]
    fn test_blocks_break_on_prose() {
        let page = "Corporate Benefits
ISIN          Scrip Name      Nature
INE040A01034  HDFC BANK LTD   Final Dividend
This is a note.
INE002A01018  RELIANCE        Bonus";
        let doc = RawDocument::from_pages("div.pdf", [page, "A  B  C"]);
        let blocks = GapTableSource::default().tables(&doc);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].rows.len(), 2);
        assert_eq!(blocks[1].rows[0][2], "Bonus");
        assert_eq!(blocks[2].page, 2);
    }

    #[test]
    fn test_min_cells() {
        let doc = RawDocument::from_pages("a.pdf", ["one  two"]);
        assert!(GapTableSource::new(3).tables(&doc).is_empty());
        assert_eq!(GapTableSource::new(2).tables(&doc).len(), 1);
    }
}
