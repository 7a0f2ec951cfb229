use crate::error::TableBreakError;
use crate::types::Pt;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Table,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// Offsets are relative to the fragment's own origin.
    #[default]
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnBoundary {
    pub index: usize,
    pub x: Pt,
    pub width: Pt,
    pub min_width: Pt,
    pub resizable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    pub column_boundaries: Vec<ColumnBoundary>,
    pub coordinate_system: CoordinateSystem,
}

/// Lines of an over-tall row placed in one fragment. Line offsets are per cell,
/// half-open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRow {
    pub row_index: usize,
    pub from_line_by_cell: Vec<usize>,
    pub to_line_by_cell: Vec<usize>,
    pub is_first_part: bool,
    pub is_last_part: bool,
    pub partial_height: Pt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFragment {
    pub kind: FragmentKind,
    pub block_id: String,
    pub from_row: usize,
    pub to_row: usize,
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
    pub repeat_header_count: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub continues_on_next: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub continues_from_prev: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_row: Option<PartialRow>,
    pub metadata: FragmentMetadata,
}

impl TableFragment {
    pub fn row_range(&self) -> std::ops::Range<usize> {
        self.from_row..self.to_row
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, TableBreakError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Measured content that is not a table, placed by the reference composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFragment {
    pub kind: FragmentKind,
    pub block_id: String,
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Table(TableFragment),
    Block(BlockFragment),
}

impl Fragment {
    pub fn block_id(&self) -> &str {
        match self {
            Fragment::Table(fragment) => &fragment.block_id,
            Fragment::Block(fragment) => &fragment.block_id,
        }
    }

    pub fn as_table(&self) -> Option<&TableFragment> {
        match self {
            Fragment::Table(fragment) => Some(fragment),
            Fragment::Block(_) => None,
        }
    }

    pub fn bottom(&self) -> Pt {
        match self {
            Fragment::Table(fragment) => fragment.y + fragment.height,
            Fragment::Block(fragment) => fragment.y + fragment.height,
        }
    }
}
