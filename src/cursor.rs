use crate::fragment::{Fragment, TableFragment};
use crate::types::Pt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub number: usize,
    pub fragments: Vec<Fragment>,
}

impl Page {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            fragments: Vec::new(),
        }
    }

    pub fn table_fragments(&self) -> impl Iterator<Item = &TableFragment> {
        self.fragments.iter().filter_map(Fragment::as_table)
    }
}

/// Position of the composition pass inside the current column.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page: Page,
    pub column_index: usize,
    pub cursor_y: Pt,
    pub content_top: Pt,
    pub content_bottom: Pt,
}

impl PageState {
    pub fn new(page: Page, column_index: usize, content_top: Pt, content_bottom: Pt) -> Self {
        Self {
            page,
            column_index,
            cursor_y: content_top,
            content_top,
            content_bottom,
        }
    }

    pub fn available_height(&self) -> Pt {
        self.content_bottom - self.cursor_y
    }

    pub fn column_height(&self) -> Pt {
        (self.content_bottom - self.content_top).max(Pt::ZERO)
    }

    /// The page holds at least one fragment, in any column, overlays included.
    pub fn has_fragments(&self) -> bool {
        !self.page.fragments.is_empty()
    }

    /// Something already sits above the cursor in this column. A fresh column
    /// on a page whose earlier columns are filled counts as empty, and so does
    /// a column holding only overlays. Decides whether a row that fits nowhere
    /// may be forced into the column.
    pub fn has_content(&self) -> bool {
        !self.page.fragments.is_empty() && self.cursor_y > self.content_top
    }
}

/// Page and column bookkeeping owned by the page-composition pass.
///
/// `advance_column` has an observable effect (it may start a new page), so
/// layout calls it only when it commits to moving on.
pub trait PageCursor {
    fn ensure_page(&mut self) -> &mut PageState;

    fn advance_column(&mut self) -> &mut PageState;

    fn column_x(&self, column_index: usize) -> Pt;
}
