//! Carves one table into page/column fragments.
//!
//! The layout pass only talks to the page-composition system through
//! [`PageCursor`]: it reads the space left in the current column, appends
//! fragments to the current page and asks the cursor to move on when rows
//! remain. It never advances speculatively.

use crate::block::TableBlock;
use crate::boundaries::{ColumnWidthLimits, compute_column_boundaries_with};
use crate::cursor::PageCursor;
use crate::debug::{DebugLogger, PageBreakEvent};
use crate::fragment::{
    ColumnBoundary, CoordinateSystem, Fragment, FragmentKind, FragmentMetadata, PartialRow,
    TableFragment,
};
use crate::header::{RepeatContext, count_header_rows, resolve_repeat_header_count};
use crate::measure::TableMeasure;
use crate::split::{SplitRequest, find_split_point};
use crate::types::Pt;

fn table_debug_enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("TABLEBREAK_TABLE_DEBUG")
            .ok()
            .map(|v| {
                let v = v.trim();
                v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
            })
            .unwrap_or(false)
    })
}

/// Lays out `block` with the default column width limits and row-granularity
/// splitting.
pub fn layout_table_block<C: PageCursor + ?Sized>(
    block: &TableBlock,
    measure: &TableMeasure,
    column_width: Pt,
    cursor: &mut C,
) {
    TableLayouter::default().layout(block, measure, column_width, cursor);
}

#[derive(Default)]
pub(crate) struct TableLayouter<'a> {
    pub limits: ColumnWidthLimits,
    pub line_splitting: bool,
    pub debug: Option<&'a DebugLogger>,
}

impl TableLayouter<'_> {
    /// Returns the number of fragments appended.
    pub fn layout<C: PageCursor + ?Sized>(
        &self,
        block: &TableBlock,
        measure: &TableMeasure,
        column_width: Pt,
        cursor: &mut C,
    ) -> usize {
        let boundaries = compute_column_boundaries_with(&measure.column_widths, self.limits);
        let width = if measure.total_width.is_positive() {
            measure.total_width
        } else {
            column_width.max(Pt::ZERO)
        };
        let shape = FragmentShape {
            block_id: &block.id,
            width,
            boundaries: &boundaries,
        };

        if block.is_floating() {
            self.place_floating(block, measure, &shape, cursor);
            return 1;
        }

        let header_count = count_header_rows(&block.rows);
        let header_height = measure.sum_row_heights(0..header_count);

        self.preflight(block, measure, cursor);

        let row_count = block.rows.len();
        if row_count == 0 {
            let (column_index, cursor_y, page_number) = {
                let state = cursor.ensure_page();
                (state.column_index, state.cursor_y, state.page.number)
            };
            let fragment = shape.fragment(FragmentPlacement {
                from_row: 0,
                to_row: 0,
                x: cursor.column_x(column_index),
                y: cursor_y,
                height: Pt::ZERO,
                repeat_header_count: 0,
                continues_on_next: false,
                continues_from_prev: false,
                partial_row: None,
            });
            self.push(cursor, fragment, page_number, true);
            return 1;
        }

        let mut next_row = 0usize;
        let mut pending: Option<PartialRow> = None;
        let mut emitted = 0usize;
        let mut stalled = false;
        loop {
            let (column_index, cursor_y, available, column_height, has_content, page_number) = {
                let state = cursor.ensure_page();
                (
                    state.column_index,
                    state.cursor_y,
                    state.available_height(),
                    state.column_height(),
                    state.has_content(),
                    state.page.number,
                )
            };

            let repeat_header_count = resolve_repeat_header_count(RepeatContext {
                header_count,
                header_height,
                column_height,
                next_row,
                is_first_fragment: emitted == 0,
            });
            let repeat_height = if repeat_header_count > 0 {
                header_height
            } else {
                Pt::ZERO
            };

            let split = find_split_point(&SplitRequest {
                block,
                measure,
                start_row: next_row,
                available: available - repeat_height,
                column_height,
                pending: pending.as_ref(),
                line_splitting: self.line_splitting,
                force_progress: !has_content || stalled,
            });

            if split.placed_nothing(next_row) {
                self.log_break(&block.id, "no_row_fits", page_number, column_index, next_row);
                cursor.advance_column();
                stalled = true;
                continue;
            }
            stalled = false;

            if let Some(debug) = self.debug {
                if split.forced {
                    debug.increment("table.row.forced", 1);
                }
                if repeat_header_count > 0 {
                    debug.increment("table.header.repeated", 1);
                } else if emitted > 0 && header_count > 0 && next_row >= header_count {
                    debug.increment("table.header.dropped", 1);
                }
            }

            let (following_row, following_pending) = match &split.partial_row {
                Some(part) if !part.is_last_part => (part.row_index, Some(part.clone())),
                _ => (split.end_row, None),
            };
            let done = following_row >= row_count && following_pending.is_none();

            let fragment = shape.fragment(FragmentPlacement {
                from_row: next_row,
                to_row: split.end_row,
                x: cursor.column_x(column_index),
                y: cursor_y,
                height: repeat_height + split.height,
                repeat_header_count,
                continues_on_next: !done,
                continues_from_prev: emitted > 0,
                partial_row: split.partial_row,
            });
            self.push(cursor, fragment, page_number, true);
            emitted += 1;
            next_row = following_row;
            pending = following_pending;

            if done {
                break;
            }
            self.log_break(&block.id, "rows_remaining", page_number, column_index, next_row);
            cursor.advance_column();
        }
        emitted
    }

    fn preflight<C: PageCursor + ?Sized>(
        &self,
        block: &TableBlock,
        measure: &TableMeasure,
        cursor: &mut C,
    ) {
        let state = cursor.ensure_page();
        if !state.has_fragments() {
            // A page without fragments is always used, even if the table overflows it.
            return;
        }
        let available = state.available_height();
        let first_row_blocked = block.rows.first().is_some_and(|row| row.cant_split())
            && measure.row_height(0) > available;
        let reason = if available <= Pt::ZERO {
            "preflight_no_space"
        } else if first_row_blocked {
            "preflight_cant_split"
        } else {
            return;
        };
        let (page_number, column_index) = (state.page.number, state.column_index);
        self.log_break(&block.id, reason, page_number, column_index, 0);
        cursor.advance_column();
    }

    /// Floating tables are overlays: one fragment at the cursor, never split,
    /// and the flow cursor stays where it was.
    fn place_floating<C: PageCursor + ?Sized>(
        &self,
        block: &TableBlock,
        measure: &TableMeasure,
        shape: &FragmentShape<'_>,
        cursor: &mut C,
    ) {
        let (column_index, cursor_y, page_number) = {
            let state = cursor.ensure_page();
            (state.column_index, state.cursor_y, state.page.number)
        };
        let row_count = block.rows.len();
        let fragment = shape.fragment(FragmentPlacement {
            from_row: 0,
            to_row: row_count,
            x: cursor.column_x(column_index),
            y: cursor_y,
            height: measure.sum_row_heights(0..row_count),
            repeat_header_count: 0,
            continues_on_next: false,
            continues_from_prev: false,
            partial_row: None,
        });
        self.push(cursor, fragment, page_number, false);
    }

    fn push<C: PageCursor + ?Sized>(
        &self,
        cursor: &mut C,
        fragment: TableFragment,
        page_number: usize,
        in_flow: bool,
    ) {
        if let Some(debug) = self.debug {
            debug.log_fragment(&fragment, page_number);
        }
        if table_debug_enabled() {
            eprintln!(
                "[table.debug.split] id={} page={} rows={}..{} repeat_header={} y_pt={:.3} height_pt={:.3} continues_on_next={} partial={}",
                fragment.block_id,
                page_number,
                fragment.from_row,
                fragment.to_row,
                fragment.repeat_header_count,
                fragment.y.to_f32(),
                fragment.height.to_f32(),
                fragment.continues_on_next,
                fragment.partial_row.is_some(),
            );
        }
        let state = cursor.ensure_page();
        if in_flow {
            state.cursor_y += fragment.height;
        }
        state.page.fragments.push(Fragment::Table(fragment));
    }

    fn log_break(
        &self,
        block_id: &str,
        reason: &str,
        page_number: usize,
        column_index: usize,
        next_row: usize,
    ) {
        if let Some(debug) = self.debug {
            debug.log_page_break(PageBreakEvent {
                block_id,
                reason,
                page_number,
                column_index,
                next_row,
            });
        }
    }
}

/// Parts of a fragment shared by every slice of one table.
struct FragmentShape<'a> {
    block_id: &'a str,
    width: Pt,
    boundaries: &'a [ColumnBoundary],
}

struct FragmentPlacement {
    from_row: usize,
    to_row: usize,
    x: Pt,
    y: Pt,
    height: Pt,
    repeat_header_count: usize,
    continues_on_next: bool,
    continues_from_prev: bool,
    partial_row: Option<PartialRow>,
}

impl FragmentShape<'_> {
    fn fragment(&self, placement: FragmentPlacement) -> TableFragment {
        TableFragment {
            kind: FragmentKind::Table,
            block_id: self.block_id.to_string(),
            from_row: placement.from_row,
            to_row: placement.to_row,
            x: placement.x,
            y: placement.y,
            width: self.width,
            height: placement.height,
            repeat_header_count: placement.repeat_header_count,
            continues_on_next: placement.continues_on_next,
            continues_from_prev: placement.continues_from_prev,
            partial_row: placement.partial_row,
            metadata: FragmentMetadata {
                column_boundaries: self.boundaries.to_vec(),
                coordinate_system: CoordinateSystem::Fragment,
            },
        }
    }
}
