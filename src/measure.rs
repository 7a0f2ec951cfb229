//! Measured geometry for a table, produced by the text measurement pass.
//!
//! Rows line up with `TableBlock::rows` by position. Accessors never panic on
//! short inputs: a row or cell that was not measured reads as zero height.

use crate::error::TableBreakError;
use crate::types::Pt;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMeasure {
    #[serde(default)]
    pub line_height: Pt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphMeasure {
    #[serde(default)]
    pub lines: Vec<LineMeasure>,
    #[serde(default)]
    pub total_height: Pt,
}

impl ParagraphMeasure {
    pub fn from_line_heights(heights: &[Pt]) -> Self {
        Self {
            lines: heights
                .iter()
                .map(|h| LineMeasure { line_height: *h })
                .collect(),
            total_height: heights.iter().sum(),
        }
    }

}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMeasure {
    #[serde(default)]
    pub width: Pt,
    #[serde(default)]
    pub height: Pt,
    #[serde(default)]
    pub paragraph: ParagraphMeasure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowMeasure {
    #[serde(default)]
    pub height: Pt,
    #[serde(default)]
    pub cells: Vec<CellMeasure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeasure {
    #[serde(default)]
    pub rows: Vec<RowMeasure>,
    #[serde(default)]
    pub column_widths: Vec<Pt>,
    #[serde(default)]
    pub total_width: Pt,
    #[serde(default)]
    pub total_height: Pt,
}

impl TableMeasure {
    /// Measure with one single-line cell per column for every row.
    pub fn from_row_heights(heights: &[Pt], column_widths: &[Pt]) -> Self {
        let rows = heights
            .iter()
            .map(|height| RowMeasure {
                height: *height,
                cells: column_widths
                    .iter()
                    .map(|width| CellMeasure {
                        width: *width,
                        height: *height,
                        paragraph: ParagraphMeasure::from_line_heights(&[*height]),
                    })
                    .collect(),
            })
            .collect();
        Self {
            rows,
            column_widths: column_widths.to_vec(),
            total_width: column_widths.iter().sum(),
            total_height: heights.iter().sum(),
        }
    }

    pub fn uniform(row_count: usize, row_height: Pt, column_widths: &[Pt]) -> Self {
        Self::from_row_heights(&vec![row_height; row_count], column_widths)
    }

    pub fn from_json(json: &str) -> Result<Self, TableBreakError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn row_height(&self, index: usize) -> Pt {
        self.rows.get(index).map(|row| row.height).unwrap_or(Pt::ZERO)
    }

    pub fn row_cells(&self, index: usize) -> &[CellMeasure] {
        self.rows
            .get(index)
            .map(|row| row.cells.as_slice())
            .unwrap_or(&[])
    }

    pub fn sum_row_heights(&self, rows: Range<usize>) -> Pt {
        rows.map(|index| self.row_height(index)).sum()
    }
}
