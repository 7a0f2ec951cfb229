use crate::block::TableBlock;
use crate::cursor::{Page, PageCursor, PageState};
use crate::debug::{DebugLogger, PageBreakEvent};
use crate::error::TableBreakError;
use crate::fragment::{BlockFragment, Fragment, FragmentKind, TableFragment};
use crate::frame::Frame;
use crate::measure::TableMeasure;
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::{PageTemplate, select_template};
use crate::perf::PerfLogger;
use crate::table_layout::TableLayouter;
use crate::types::{Pt, Size};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum StoryItem {
    Table {
        block: TableBlock,
        measure: TableMeasure,
    },
    /// Already measured content that is not a table.
    Block { id: String, height: Pt },
    PageBreak,
}

#[derive(Debug, Clone, Default)]
pub struct DocTemplate {
    page_templates: Vec<PageTemplate>,
    story: Vec<StoryItem>,
}

impl DocTemplate {
    pub fn new(page_templates: Vec<PageTemplate>) -> Self {
        Self {
            page_templates,
            story: Vec::new(),
        }
    }

    pub fn add_table(
        &mut self,
        block: TableBlock,
        measure: TableMeasure,
    ) -> Result<(), TableBreakError> {
        block.check_measure(&measure)?;
        self.story.push(StoryItem::Table { block, measure });
        Ok(())
    }

    pub fn add_block(&mut self, id: impl Into<String>, height: Pt) {
        self.story.push(StoryItem::Block {
            id: id.into(),
            height: height.max(Pt::ZERO),
        });
    }

    pub fn add_page_break(&mut self) {
        self.story.push(StoryItem::PageBreak);
    }

    pub(crate) fn compose(
        &self,
        layouter: &TableLayouter<'_>,
        perf: Option<&PerfLogger>,
        doc_id: Option<usize>,
    ) -> Result<ComposedDocument, TableBreakError> {
        let _span = perf.map(|perf| perf.span("compose.document", doc_id));
        let start = Instant::now();
        let mut cursor = FlowCursor::new(&self.page_templates)?.with_debug(layouter.debug);
        let page_size = cursor.first_template.page_size;
        let mut table_count = 0usize;
        let mut block_count = 0usize;

        for item in &self.story {
            match item {
                StoryItem::Table { block, measure } => {
                    cursor.current_block.clone_from(&block.id);
                    let column_width = cursor.column_width();
                    let emitted = {
                        let _span = perf.map(|perf| perf.span("layout.table", doc_id));
                        layouter.layout(block, measure, column_width, &mut cursor)
                    };
                    if let Some(perf) = perf {
                        perf.log_counts(
                            "layout.table",
                            doc_id,
                            &[
                                ("rows", block.rows.len() as u64),
                                ("fragments", emitted as u64),
                            ],
                        );
                    }
                    table_count += 1;
                }
                StoryItem::Block { id, height } => {
                    cursor.place_block(id, *height);
                    block_count += 1;
                }
                StoryItem::PageBreak => cursor.break_page(),
            }
        }

        let (pages, page_metrics) = cursor.finish();
        if let Some(debug) = layouter.debug {
            debug.emit_summary("compose");
            debug.flush();
        }
        Ok(ComposedDocument {
            page_size,
            pages,
            metrics: DocumentMetrics {
                pages: page_metrics,
                total_layout_ms: start.elapsed().as_secs_f64() * 1000.0,
                table_count,
                block_count,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedDocument {
    pub page_size: Size,
    pub pages: Vec<Page>,
    #[serde(skip)]
    pub metrics: DocumentMetrics,
}

impl ComposedDocument {
    pub fn to_json(&self) -> Result<String, TableBreakError> {
        Ok(serde_json::to_string(self)?)
    }

    /// SHA-256 over the page fragments only; timing metrics are excluded.
    pub fn fingerprint(&self) -> Result<String, TableBreakError> {
        let value = serde_json::to_value(&self.pages)?;
        Ok(tablebreak_layout_contract::layout_fingerprint_sha256(&value))
    }

    pub fn table_fragments<'a>(
        &'a self,
        block_id: &'a str,
    ) -> impl Iterator<Item = (usize, &'a TableFragment)> + 'a {
        self.pages.iter().flat_map(move |page| {
            page.table_fragments()
                .filter(move |fragment| fragment.block_id == block_id)
                .map(move |fragment| (page.number, fragment))
        })
    }
}

/// Page cursor over a list of page templates. Page `n` uses template
/// `min(n - 1, len - 1)`; each frame of a template is one column.
pub struct FlowCursor<'a> {
    templates: &'a [PageTemplate],
    first_template: &'a PageTemplate,
    first_frame: Frame,
    state: Option<PageState>,
    pages: Vec<Page>,
    page_metrics: Vec<PageMetrics>,
    page_start: Instant,
    current_block: String,
    debug: Option<&'a DebugLogger>,
}

impl<'a> FlowCursor<'a> {
    pub fn new(templates: &'a [PageTemplate]) -> Result<Self, TableBreakError> {
        if templates.iter().any(|template| template.frames().is_empty()) {
            return Err(TableBreakError::MissingPageTemplate);
        }
        let first_template = templates
            .first()
            .ok_or(TableBreakError::MissingPageTemplate)?;
        let first_frame = *first_template
            .frame(0)
            .ok_or(TableBreakError::MissingPageTemplate)?;
        Ok(Self {
            templates,
            first_template,
            first_frame,
            state: None,
            pages: Vec::new(),
            page_metrics: Vec::new(),
            page_start: Instant::now(),
            current_block: String::new(),
            debug: None,
        })
    }

    pub(crate) fn with_debug(mut self, debug: Option<&'a DebugLogger>) -> Self {
        self.debug = debug;
        self
    }

    fn template(&self, page_number: usize) -> &'a PageTemplate {
        select_template(self.templates, page_number).unwrap_or(self.first_template)
    }

    fn frame(&self, page_number: usize, column_index: usize) -> Frame {
        self.template(page_number)
            .frame(column_index)
            .copied()
            .unwrap_or(self.first_frame)
    }

    fn current_position(&self) -> (usize, usize) {
        self.state
            .as_ref()
            .map(|state| (state.page.number, state.column_index))
            .unwrap_or((1, 0))
    }

    pub fn column_width(&self) -> Pt {
        let (page_number, column_index) = self.current_position();
        self.frame(page_number, column_index).width()
    }

    fn open_page(&mut self, number: usize) -> PageState {
        self.page_start = Instant::now();
        self.frame(number, 0).open(Page::new(number), 0)
    }

    fn finish_page(&mut self, state: PageState) {
        let fragment_count = state.page.fragments.len();
        let table_fragment_count = state.page.table_fragments().count();
        self.page_metrics.push(PageMetrics {
            page_number: state.page.number,
            layout_ms: self.page_start.elapsed().as_secs_f64() * 1000.0,
            fragment_count,
            table_fragment_count,
        });
        self.pages.push(state.page);
    }

    fn log_break(&self, reason: &str, page_number: usize, column_index: usize) {
        if let Some(debug) = self.debug {
            debug.log_page_break(PageBreakEvent {
                block_id: &self.current_block,
                reason,
                page_number,
                column_index,
                next_row: 0,
            });
        }
    }

    /// Places opaque content of a known height. Unlike a table start, a block
    /// only looks at its own column: it moves on when it does not fit below
    /// content already in the column, and overflows a column it starts at the
    /// top of, even if earlier columns of the page hold fragments.
    pub fn place_block(&mut self, id: &str, height: Pt) {
        id.clone_into(&mut self.current_block);
        let height = height.max(Pt::ZERO);
        let (page_number, column_index, cursor_y) = {
            let state = self.ensure_page();
            (state.page.number, state.column_index, state.cursor_y)
        };
        let frame = self.frame(page_number, column_index);
        if !frame.is_empty(cursor_y) && height > frame.remaining_height(cursor_y) {
            self.log_break("block_overflow", page_number, column_index);
            self.advance_column();
        }
        let (page_number, column_index) = self.current_position();
        let frame = self.frame(page_number, column_index);
        let state = self.ensure_page();
        state.page.fragments.push(Fragment::Block(BlockFragment {
            kind: FragmentKind::Block,
            block_id: id.to_string(),
            x: frame.x(),
            y: state.cursor_y,
            width: frame.width(),
            height,
        }));
        state.cursor_y += height;
    }

    /// Starts a new page unless nothing has been placed on the current one.
    pub fn break_page(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if state.page.fragments.is_empty() && state.column_index == 0 {
            self.state = Some(state);
            return;
        }
        let number = state.page.number;
        self.log_break("page_break", number, state.column_index);
        self.finish_page(state);
        let next = self.open_page(number + 1);
        self.state = Some(next);
    }

    /// Closes the last page. A trailing page with no fragments is dropped,
    /// but a document always has at least one page.
    pub fn finish(mut self) -> (Vec<Page>, Vec<PageMetrics>) {
        if let Some(state) = self.state.take() {
            if !state.page.fragments.is_empty() || self.pages.is_empty() {
                self.finish_page(state);
            }
        }
        if self.pages.is_empty() {
            let state = self.open_page(1);
            self.finish_page(state);
        }
        (self.pages, self.page_metrics)
    }
}

impl PageCursor for FlowCursor<'_> {
    fn ensure_page(&mut self) -> &mut PageState {
        let state = match self.state.take() {
            Some(state) => state,
            None => self.open_page(1),
        };
        self.state.insert(state)
    }

    fn advance_column(&mut self) -> &mut PageState {
        let current = match self.state.take() {
            Some(state) => state,
            None => self.open_page(1),
        };
        let number = current.page.number;
        let next_column = current.column_index + 1;
        let next = if next_column < self.template(number).frames().len() {
            self.frame(number, next_column).open(current.page, next_column)
        } else {
            self.log_break("column_exhausted", number, current.column_index);
            self.finish_page(current);
            self.open_page(number + 1)
        };
        self.state.insert(next)
    }

    fn column_x(&self, column_index: usize) -> Pt {
        let (page_number, _) = self.current_position();
        self.frame(page_number, column_index).x()
    }
}
