use crate::frame::Frame;
use crate::types::{Pt, Rect, Size};

#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    frames: Vec<Frame>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            frames: Vec::new(),
        }
    }

    pub fn with_frame(mut self, rect: Rect) -> Self {
        self.frames.push(Frame::new(rect));
        self
    }

    /// Splits `content` into `count` equal columns separated by `gap`.
    pub fn with_columns(mut self, content: Rect, count: usize, gap: Pt) -> Self {
        let count = count.max(1);
        let gaps = gap.max(Pt::ZERO) * (count as i32 - 1);
        let width = ((content.width - gaps) / count as i32).max(Pt::ZERO);
        for index in 0..count {
            let x = content.x + (width + gap.max(Pt::ZERO)) * index as i32;
            self.frames.push(Frame::new(Rect {
                x,
                y: content.y,
                width,
                height: content.height,
            }));
        }
        self
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }
}

/// Template for page `page_number` (1-based). The last template repeats.
pub(crate) fn select_template(
    page_templates: &[PageTemplate],
    page_number: usize,
) -> Option<&PageTemplate> {
    let idx = page_number.saturating_sub(1);
    let idx = idx.min(page_templates.len().checked_sub(1)?);
    page_templates.get(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_share_the_content_width() {
        let template = PageTemplate::new("TwoColumn", Size::letter()).with_columns(
            Rect::new(36.0, 36.0, 540.0, 720.0),
            2,
            Pt::from_i32(20),
        );
        let frames = template.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].width(), Pt::from_i32(260));
        assert_eq!(frames[1].x(), Pt::from_i32(316));
        let column = frames[1].open(crate::cursor::Page::new(1), 1);
        assert_eq!(column.column_height(), Pt::from_i32(720));
    }

    #[test]
    fn zero_columns_means_one() {
        let template = PageTemplate::new("Single", Size::a4()).with_columns(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            Pt::from_i32(10),
        );
        assert_eq!(template.frames().len(), 1);
        assert_eq!(template.frames()[0].width(), Pt::from_i32(100));
    }

    #[test]
    fn last_template_repeats() {
        let templates = vec![
            PageTemplate::new("First", Size::a4()),
            PageTemplate::new("Rest", Size::a4()),
        ];
        let name = |n| select_template(&templates, n).map(|t| t.name.as_str());
        assert_eq!(name(1), Some("First"));
        assert_eq!(name(2), Some("Rest"));
        assert_eq!(name(9), Some("Rest"));
        assert!(select_template(&[], 1).is_none());
    }
}
