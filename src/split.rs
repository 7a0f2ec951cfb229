//! Decides where a table fragment ends given the space left in a column.

use crate::block::TableBlock;
use crate::fragment::PartialRow;
use crate::measure::{CellMeasure, TableMeasure};
use crate::types::Pt;

#[derive(Debug, Clone, Copy)]
pub struct SplitRequest<'a> {
    pub block: &'a TableBlock,
    pub measure: &'a TableMeasure,
    pub start_row: usize,
    /// Space left for body rows, repeated headers already subtracted.
    pub available: Pt,
    /// Usable height of a whole column; rows taller than this can never fit.
    pub column_height: Pt,
    /// Lines of `start_row` already placed in an earlier fragment.
    pub pending: Option<&'a PartialRow>,
    pub line_splitting: bool,
    /// Place something even if nothing fits (empty column).
    pub force_progress: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPoint {
    /// Exclusive end row. A partially placed row is counted.
    pub end_row: usize,
    /// Height of the body rows placed, partial parts included.
    pub height: Pt,
    pub partial_row: Option<PartialRow>,
    /// Content was placed although it overflows the available space.
    pub forced: bool,
}

impl SplitPoint {
    fn empty(start_row: usize) -> Self {
        Self {
            end_row: start_row,
            height: Pt::ZERO,
            partial_row: None,
            forced: false,
        }
    }

    pub fn placed_nothing(&self, start_row: usize) -> bool {
        self.end_row <= start_row && self.partial_row.is_none()
    }
}

pub fn find_split_point(req: &SplitRequest<'_>) -> SplitPoint {
    let row_count = req.block.rows.len();
    let mut used = Pt::ZERO;
    let mut row = req.start_row;
    let mut leading: Option<PartialRow> = None;
    let mut forced = false;

    if let Some(pending) = req.pending.filter(|p| p.row_index == req.start_row) {
        if row >= row_count {
            return SplitPoint::empty(req.start_row);
        }
        let cells = req.measure.row_cells(row);
        let Some((to_lines, height)) = place_lines(
            cells,
            &pending.to_line_by_cell,
            req.available,
            req.force_progress,
        ) else {
            return SplitPoint::empty(req.start_row);
        };
        forced = height > req.available;
        let part = PartialRow {
            row_index: row,
            is_first_part: false,
            is_last_part: all_lines_placed(cells, &to_lines),
            from_line_by_cell: pending.to_line_by_cell.clone(),
            to_line_by_cell: to_lines,
            partial_height: height,
        };
        if !part.is_last_part {
            return SplitPoint {
                end_row: row + 1,
                height,
                partial_row: Some(part),
                forced,
            };
        }
        used += height;
        row += 1;
        leading = Some(part);
    }

    while row < row_count {
        let height = req.measure.row_height(row);
        if used + height <= req.available {
            used += height;
            row += 1;
            continue;
        }

        let splittable = !req.block.rows[row].cant_split();
        if req.line_splitting && splittable && leading.is_none() && height > req.column_height {
            let cells = req.measure.row_cells(row);
            let from = vec![0; cells.len()];
            let force = req.force_progress && row == req.start_row;
            if let Some((to_lines, part_height)) =
                place_lines(cells, &from, req.available - used, force)
            {
                let part = PartialRow {
                    row_index: row,
                    is_first_part: true,
                    is_last_part: all_lines_placed(cells, &to_lines),
                    from_line_by_cell: from,
                    to_line_by_cell: to_lines,
                    partial_height: part_height,
                };
                return SplitPoint {
                    end_row: row + 1,
                    height: used + part_height,
                    partial_row: Some(part),
                    forced: used + part_height > req.available,
                };
            }
        }
        break;
    }

    if row == req.start_row && leading.is_none() && req.force_progress && row < row_count {
        // Nothing fits an empty column; place the row whole and let it overflow.
        return SplitPoint {
            end_row: row + 1,
            height: req.measure.row_height(row),
            partial_row: None,
            forced: true,
        };
    }

    SplitPoint {
        end_row: row,
        height: used,
        partial_row: leading,
        forced,
    }
}

/// Takes lines from each cell, starting at `from`, while they fit `budget`.
/// Returns the new per-cell line offsets and the tallest cell's placed height,
/// or `None` when no cell advanced.
fn place_lines(
    cells: &[CellMeasure],
    from: &[usize],
    budget: Pt,
    force: bool,
) -> Option<(Vec<usize>, Pt)> {
    let mut to_lines = Vec::with_capacity(cells.len());
    let mut tallest = Pt::ZERO;
    let mut progressed = false;
    for (index, cell) in cells.iter().enumerate() {
        let lines = &cell.paragraph.lines;
        let start = from.get(index).copied().unwrap_or(0).min(lines.len());
        let mut end = start;
        let mut height = Pt::ZERO;
        while end < lines.len() && height + lines[end].line_height <= budget {
            height += lines[end].line_height;
            end += 1;
        }
        if force && end == start && start < lines.len() {
            height += lines[start].line_height;
            end += 1;
        }
        progressed |= end > start;
        tallest = tallest.max(height);
        to_lines.push(end);
    }
    progressed.then_some((to_lines, tallest))
}

fn all_lines_placed(cells: &[CellMeasure], to_lines: &[usize]) -> bool {
    cells
        .iter()
        .zip(to_lines)
        .all(|(cell, to)| *to >= cell.paragraph.lines.len())
}
