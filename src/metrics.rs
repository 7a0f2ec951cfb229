#[derive(Debug, Clone, Default)]
pub struct PageMetrics {
    pub page_number: usize,
    pub layout_ms: f64,
    pub fragment_count: usize,
    pub table_fragment_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub total_layout_ms: f64,
    pub table_count: usize,
    pub block_count: usize,
}

impl DocumentMetrics {
    pub fn fragment_count(&self) -> usize {
        self.pages.iter().map(|page| page.fragment_count).sum()
    }

    pub fn table_fragment_count(&self) -> usize {
        self.pages.iter().map(|page| page.table_fragment_count).sum()
    }
}
