mod block;
mod boundaries;
mod cursor;
mod debug;
mod doc_template;
mod error;
mod fragment;
mod frame;
mod header;
mod measure;
mod metrics;
mod page_template;
mod perf;
mod split;
mod table_layout;
mod types;

pub use block::{
    ContentRef, FloatingTableProperties, RowAttrs, TableAttrs, TableBlock, TableCell, TableRow,
};
pub use boundaries::{
    ColumnWidthLimits, DEFAULT_MAX_COLUMN_WIDTH, DEFAULT_MIN_COLUMN_WIDTH, column_boundary,
    compute_column_boundaries, compute_column_boundaries_with,
};
pub use cursor::{Page, PageCursor, PageState};
pub use doc_template::{ComposedDocument, DocTemplate, FlowCursor, StoryItem};
pub use error::TableBreakError;
pub use fragment::{
    BlockFragment, ColumnBoundary, CoordinateSystem, Fragment, FragmentKind, FragmentMetadata,
    PartialRow, TableFragment,
};
pub use frame::Frame;
pub use header::{RepeatContext, count_header_rows, resolve_repeat_header_count};
pub use measure::{CellMeasure, LineMeasure, ParagraphMeasure, RowMeasure, TableMeasure};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use page_template::PageTemplate;
pub use split::{SplitPoint, SplitRequest, find_split_point};
pub use table_layout::layout_table_block;
pub use types::{Pt, Rect, Size};

use debug::DebugLogger;
use perf::PerfLogger;
use std::sync::Arc;
use table_layout::TableLayouter;

/// Configured table pagination engine.
#[derive(Clone, Default)]
pub struct TableBreak {
    limits: ColumnWidthLimits,
    line_splitting: bool,
    debug: Option<Arc<DebugLogger>>,
    perf: Option<Arc<PerfLogger>>,
}

#[derive(Clone, Default)]
pub struct TableBreakBuilder {
    limits: ColumnWidthLimits,
    line_splitting: bool,
    debug_path: Option<std::path::PathBuf>,
    perf_path: Option<std::path::PathBuf>,
}

impl TableBreak {
    pub fn builder() -> TableBreakBuilder {
        TableBreakBuilder::new()
    }

    pub fn column_width_limits(&self) -> ColumnWidthLimits {
        self.limits
    }

    pub fn line_splitting(&self) -> bool {
        self.line_splitting
    }

    fn layouter(&self) -> TableLayouter<'_> {
        TableLayouter {
            limits: self.limits,
            line_splitting: self.line_splitting,
            debug: self.debug.as_deref(),
        }
    }

    /// Lays out one table against a caller-owned cursor.
    pub fn layout_table_block<C: PageCursor + ?Sized>(
        &self,
        block: &TableBlock,
        measure: &TableMeasure,
        column_width: Pt,
        cursor: &mut C,
    ) {
        let emitted = {
            let _span = self.perf.as_deref().map(|perf| perf.span("layout.table", None));
            self.layouter().layout(block, measure, column_width, cursor)
        };
        if let Some(perf) = self.perf.as_deref() {
            perf.log_counts(
                "layout.table",
                None,
                &[
                    ("rows", block.rows.len() as u64),
                    ("fragments", emitted as u64),
                ],
            );
        }
    }

    pub fn compose(&self, doc: &DocTemplate) -> Result<ComposedDocument, TableBreakError> {
        doc.compose(&self.layouter(), self.perf.as_deref(), None)
    }

    // Documents are independent: compose in parallel, return in input order.
    pub fn compose_many(
        &self,
        docs: &[DocTemplate],
    ) -> Result<Vec<ComposedDocument>, TableBreakError> {
        use rayon::prelude::*;

        let layouter = self.layouter();
        let perf = self.perf.as_deref();
        docs.par_iter()
            .enumerate()
            .map(|(idx, doc)| doc.compose(&layouter, perf, Some(idx)))
            .collect()
    }

    pub fn flush_logs(&self) {
        if let Some(debug) = self.debug.as_deref() {
            debug.flush();
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.flush();
        }
    }
}

impl TableBreakBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Floor and ceiling applied to each column's `minWidth`.
    pub fn column_width_limits(mut self, min: Pt, max: Pt) -> Self {
        self.limits = ColumnWidthLimits { min, max };
        self
    }

    /// Divide over-tall rows at line boundaries instead of placing them whole.
    pub fn line_splitting(mut self, enabled: bool) -> Self {
        self.line_splitting = enabled;
        self
    }

    pub fn debug_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn perf_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.perf_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<TableBreak, TableBreakError> {
        if !self.limits.min.is_positive() {
            return Err(TableBreakError::InvalidConfiguration(
                "column_width_limits requires min > 0".to_string(),
            ));
        }
        if self.limits.min > self.limits.max {
            return Err(TableBreakError::InvalidConfiguration(
                "column_width_limits requires min <= max".to_string(),
            ));
        }
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        let perf = if let Some(path) = self.perf_path {
            Some(Arc::new(PerfLogger::new(path)?))
        } else {
            None
        };
        Ok(TableBreak {
            limits: self.limits,
            line_splitting: self.line_splitting,
            debug,
            perf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_log_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "tablebreak_lib_{tag}_{}_{}.jsonl",
            std::process::id(),
            nanos
        ))
    }

    fn single_column(height: f32) -> PageTemplate {
        PageTemplate::new("Page1", Size::letter())
            .with_frame(Rect::new(36.0, 36.0, 540.0, height))
    }

    fn table(id: &str, heights: &[i32], headers: usize) -> (TableBlock, TableMeasure) {
        let rows = (0..heights.len())
            .map(|i| {
                let row = TableRow::new(format!("{id}-r{i}"), vec![TableCell::new(format!("p{i}"))]);
                if i < headers {
                    row.with_attrs(RowAttrs::header())
                } else {
                    row
                }
            })
            .collect();
        let heights: Vec<Pt> = heights.iter().map(|h| Pt::from_i32(*h)).collect();
        let widths = [Pt::from_i32(300), Pt::from_i32(-10)];
        (
            TableBlock::new(id, rows),
            TableMeasure::from_row_heights(&heights, &widths),
        )
    }

    fn doc_with_table(height: f32, id: &str, rows: &[i32], headers: usize) -> DocTemplate {
        let mut doc = DocTemplate::new(vec![single_column(height)]);
        let (block, measure) = table(id, rows, headers);
        doc.add_table(block, measure).expect("add table");
        doc
    }

    #[test]
    fn builder_rejects_non_positive_min_width() {
        let err = match TableBreak::builder()
            .column_width_limits(Pt::ZERO, Pt::from_i32(100))
            .build()
        {
            Ok(_) => panic!("zero min width should be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, TableBreakError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("min > 0"));
    }

    #[test]
    fn builder_rejects_inverted_limits() {
        let err = match TableBreak::builder()
            .column_width_limits(Pt::from_i32(300), Pt::from_i32(100))
            .build()
        {
            Ok(_) => panic!("min above max should be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, TableBreakError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("min <= max"));
    }

    #[test]
    fn default_engine_uses_standard_limits() {
        let engine = TableBreak::default();
        assert_eq!(engine.column_width_limits(), ColumnWidthLimits::default());
        assert!(!engine.line_splitting());
        let built = TableBreak::builder().build().expect("build");
        assert_eq!(built.column_width_limits(), engine.column_width_limits());
    }

    #[test]
    fn configured_limits_reach_fragment_metadata() {
        let engine = TableBreak::builder()
            .column_width_limits(Pt::from_i32(10), Pt::from_i32(50))
            .build()
            .expect("build");
        let composed = engine
            .compose(&doc_with_table(100.0, "t", &[20, 20], 0))
            .expect("compose");
        let (_, fragment) = composed.table_fragments("t").next().expect("fragment");
        let mins: Vec<Pt> = fragment
            .metadata
            .column_boundaries
            .iter()
            .map(|b| b.min_width)
            .collect();
        assert_eq!(mins, vec![Pt::from_i32(50), Pt::from_i32(10)]);
    }

    #[test]
    fn engine_method_matches_free_function() {
        let templates = vec![single_column(100.0)];
        let (block, measure) = table("t", &[30; 7], 1);

        let mut by_engine = FlowCursor::new(&templates).expect("cursor");
        TableBreak::default().layout_table_block(
            &block,
            &measure,
            Pt::from_i32(540),
            &mut by_engine,
        );
        let mut by_function = FlowCursor::new(&templates).expect("cursor");
        layout_table_block(&block, &measure, Pt::from_i32(540), &mut by_function);

        let (engine_pages, _) = by_engine.finish();
        let (function_pages, _) = by_function.finish();
        assert_eq!(engine_pages, function_pages);
        assert_eq!(engine_pages.len(), 3);
        let second = engine_pages[1].table_fragments().next().expect("fragment");
        assert_eq!(second.repeat_header_count, 1);
        assert_eq!(second.row_range(), 3..5);
    }

    #[test]
    fn line_splitting_is_opt_in() {
        let mut heights = vec![30];
        heights.push(0);
        let (block, mut measure) = table("t", &heights, 0);
        let lines = vec![Pt::from_i32(20); 8];
        let paragraph = ParagraphMeasure::from_line_heights(&lines);
        measure.rows[1] = RowMeasure {
            height: paragraph.total_height,
            cells: vec![CellMeasure {
                width: Pt::from_i32(300),
                height: paragraph.total_height,
                paragraph,
            }],
        };
        let mut doc = DocTemplate::new(vec![single_column(100.0)]);
        doc.add_table(block, measure).expect("add table");

        let whole = TableBreak::default().compose(&doc).expect("compose");
        assert!(whole.table_fragments("t").all(|(_, f)| f.partial_row.is_none()));

        let engine = TableBreak::builder()
            .line_splitting(true)
            .build()
            .expect("build");
        let split = engine.compose(&doc).expect("compose");
        let parts: Vec<(usize, usize)> = split
            .table_fragments("t")
            .filter_map(|(_, f)| f.partial_row.as_ref())
            .map(|p| (p.from_line_by_cell[0], p.to_line_by_cell[0]))
            .collect();
        assert_eq!(parts, vec![(0, 3), (3, 8)]);
    }

    #[test]
    fn debug_log_records_breaks_and_header_repeats() {
        let path = temp_log_path("debug");
        let engine = TableBreak::builder()
            .debug_log(&path)
            .build()
            .expect("build");
        engine
            .compose(&doc_with_table(100.0, "t", &[25; 10], 2))
            .expect("compose");
        engine.flush_logs();

        let text = std::fs::read_to_string(&path).expect("read debug log");
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect();
        assert!(lines.iter().any(|l| l["type"] == "table.fragment"));
        assert!(
            lines
                .iter()
                .any(|l| l["type"] == "table.page_break" && l["reason"] == "rows_remaining")
        );
        let summary = lines
            .iter()
            .find(|l| l["type"] == "debug.summary")
            .expect("summary line");
        assert!(summary["counts"]["table.header.repeated"].as_u64().unwrap_or(0) >= 1);
        assert_eq!(summary["counts"]["table.page_break.column_exhausted"], 3);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn perf_log_records_layout_spans() {
        let path = temp_log_path("perf");
        let engine = TableBreak::builder()
            .perf_log(&path)
            .build()
            .expect("build");
        engine
            .compose(&doc_with_table(100.0, "t", &[25; 10], 0))
            .expect("compose");
        engine.flush_logs();
        let text = std::fs::read_to_string(&path).expect("read perf log");
        assert!(text.contains("\"name\":\"layout.table\""));
        assert!(text.contains("\"name\":\"compose.document\""));
        assert!(text.contains("\"fragments\":3"));
        drop(engine);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_file_name(format!(
            "{}_hot.log",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
        )));
    }

    #[test]
    fn compose_many_keeps_input_order() {
        let docs: Vec<DocTemplate> = (1..=6)
            .map(|n| doc_with_table(100.0, &format!("t{n}"), &vec![25; n * 3], 0))
            .collect();
        let engine = TableBreak::default();
        let composed = engine.compose_many(&docs).expect("compose many");
        assert_eq!(composed.len(), docs.len());
        for (idx, (doc, result)) in docs.iter().zip(&composed).enumerate() {
            let id = format!("t{}", idx + 1);
            assert!(result.table_fragments(&id).next().is_some());
            let single = engine.compose(doc).expect("compose");
            assert_eq!(
                single.fingerprint().expect("fingerprint"),
                result.fingerprint().expect("fingerprint")
            );
        }
    }

    #[test]
    fn compose_many_reports_the_first_failure() {
        let docs = vec![
            doc_with_table(100.0, "ok", &[25; 3], 0),
            DocTemplate::new(Vec::new()),
        ];
        let err = match TableBreak::default().compose_many(&docs) {
            Ok(_) => panic!("missing template should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, TableBreakError::MissingPageTemplate));
    }

    #[test]
    fn tables_load_from_json() {
        let block = TableBlock::from_json(
            r#"{"id":"tbl","rows":[
                {"id":"h","cells":[{"paragraph":"p0"}],"attrs":{"repeatHeader":true}},
                {"id":"b","cells":[{"paragraph":"p1"}]}
            ]}"#,
        )
        .expect("parse block");
        let measure = TableMeasure::from_json(
            r#"{"rows":[{"height":40},{"height":40}],"columnWidths":[200],"totalWidth":200}"#,
        )
        .expect("parse measure");
        let mut doc = DocTemplate::new(vec![single_column(60.0)]);
        doc.add_table(block, measure).expect("add table");
        let composed = TableBreak::default().compose(&doc).expect("compose");
        let ranges: Vec<_> = composed
            .table_fragments("tbl")
            .map(|(_, f)| (f.row_range(), f.repeat_header_count))
            .collect();
        // The single header row is laid out once; the body row follows on page 2
        // with the header repeated above it.
        assert_eq!(ranges, vec![(0..1, 0), (1..2, 1)]);
    }
}
