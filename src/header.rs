use crate::block::TableRow;
use crate::types::Pt;

/// Number of contiguous leading rows marked to repeat as a header.
pub fn count_header_rows(rows: &[TableRow]) -> usize {
    rows.iter().take_while(|row| row.is_header()).count()
}

#[derive(Debug, Clone, Copy)]
pub struct RepeatContext {
    pub header_count: usize,
    pub header_height: Pt,
    /// Usable height of a whole column, not what is left in the current one.
    pub column_height: Pt,
    /// First row not yet placed.
    pub next_row: usize,
    pub is_first_fragment: bool,
}

/// Header rows to prepend to the next fragment of a table.
pub fn resolve_repeat_header_count(ctx: RepeatContext) -> usize {
    if ctx.is_first_fragment || ctx.header_count == 0 {
        return 0;
    }
    // The header block itself is still being laid out as body rows.
    if ctx.next_row < ctx.header_count {
        return 0;
    }
    if ctx.header_height > ctx.column_height {
        return 0;
    }
    ctx.header_count
}
