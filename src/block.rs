//! Logical table input: rows, cells and the attributes that steer pagination.

use crate::error::TableBreakError;
use crate::measure::TableMeasure;
use crate::types::Pt;
use serde::{Deserialize, Serialize};

/// Opaque reference to a cell's paragraph content. Layout echoes it and never
/// looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowAttrs {
    pub repeat_header: bool,
    pub cant_split: bool,
}

impl RowAttrs {
    pub fn header() -> Self {
        Self {
            repeat_header: true,
            cant_split: false,
        }
    }

    pub fn cant_split() -> Self {
        Self {
            repeat_header: false,
            cant_split: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub paragraph: ContentRef,
}

impl TableCell {
    pub fn new(paragraph: impl Into<String>) -> Self {
        Self {
            paragraph: ContentRef(paragraph.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub id: String,
    #[serde(default)]
    pub cells: Vec<TableCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<RowAttrs>,
}

impl TableRow {
    pub fn new(id: impl Into<String>, cells: Vec<TableCell>) -> Self {
        Self {
            id: id.into(),
            cells,
            attrs: None,
        }
    }

    pub fn with_attrs(mut self, attrs: RowAttrs) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Row attributes, defaulting to a plain splittable body row.
    pub fn attrs(&self) -> RowAttrs {
        self.attrs.unwrap_or_default()
    }

    pub fn is_header(&self) -> bool {
        self.attrs().repeat_header
    }

    pub fn cant_split(&self) -> bool {
        self.attrs().cant_split
    }
}

/// Positioning of a table that is anchored outside the normal flow. Only its
/// presence matters to pagination; the fields ride along for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingTableProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Pt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Pt>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating_table_properties: Option<FloatingTableProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub id: String,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub attrs: TableAttrs,
}

impl TableBlock {
    pub fn new(id: impl Into<String>, rows: Vec<TableRow>) -> Self {
        Self {
            id: id.into(),
            rows,
            attrs: TableAttrs::default(),
        }
    }

    pub fn floating(mut self, properties: FloatingTableProperties) -> Self {
        self.attrs.floating_table_properties = Some(properties);
        self
    }

    pub fn is_floating(&self) -> bool {
        self.attrs.floating_table_properties.is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn from_json(json: &str) -> Result<Self, TableBreakError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Strict check for callers that want to reject mismatched inputs instead of
    /// letting layout degrade missing geometry to zero height.
    pub fn check_measure(&self, measure: &TableMeasure) -> Result<(), TableBreakError> {
        if self.rows.len() != measure.rows.len() {
            return Err(TableBreakError::MeasureMismatch {
                block_id: self.id.clone(),
                block_rows: self.rows.len(),
                measure_rows: measure.rows.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attrs_default_to_splittable_body_row() {
        let row = TableRow::new("r0", vec![TableCell::new("p0")]);
        assert!(!row.is_header());
        assert!(!row.cant_split());
    }

    #[test]
    fn parses_editor_json_shape() {
        let block = TableBlock::from_json(
            r#"{
                "id": "tbl-1",
                "rows": [
                    {"id": "r0", "cells": [{"paragraph": "p-0"}], "attrs": {"repeatHeader": true}},
                    {"id": "r1", "cells": [{"paragraph": "p-1"}], "attrs": {"cantSplit": true}},
                    {"id": "r2", "cells": []}
                ],
                "attrs": {"floatingTableProperties": {"horizontalAnchor": "page"}}
            }"#,
        )
        .expect("parse block");
        assert_eq!(block.row_count(), 3);
        assert!(block.rows[0].is_header());
        assert!(block.rows[1].cant_split());
        assert_eq!(block.rows[2].attrs(), RowAttrs::default());
        assert!(block.is_floating());
        assert_eq!(block.rows[0].cells[0].paragraph, ContentRef("p-0".to_string()));
    }

    #[test]
    fn check_measure_rejects_row_count_mismatch() {
        let block = TableBlock::new("t", vec![TableRow::default(), TableRow::default()]);
        let measure = TableMeasure::uniform(1, Pt::from_i32(10), &[Pt::from_i32(100)]);
        let err = block.check_measure(&measure).expect_err("mismatch");
        assert!(err.to_string().contains("2 rows"));
        assert!(matches!(err, TableBreakError::MeasureMismatch { measure_rows: 1, .. }));
    }
}
