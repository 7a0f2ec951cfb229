use crate::cursor::{Page, PageState};
use crate::types::{Pt, Rect};

/// One column region of a page template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    rect: Rect,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: Rect {
                x: rect.x,
                y: rect.y,
                width: rect.width.max(Pt::ZERO),
                height: rect.height.max(Pt::ZERO),
            },
        }
    }

    pub fn x(&self) -> Pt {
        self.rect.x
    }

    pub fn width(&self) -> Pt {
        self.rect.width
    }

    /// Starts filling this frame of `page` from its top edge.
    pub fn open(&self, page: Page, column_index: usize) -> PageState {
        PageState::new(page, column_index, self.rect.y, self.rect.bottom())
    }

    pub fn remaining_height(&self, cursor_y: Pt) -> Pt {
        (self.rect.bottom() - cursor_y).max(Pt::ZERO)
    }

    pub fn is_empty(&self, cursor_y: Pt) -> bool {
        cursor_y <= self.rect.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opened_frame_spans_its_rect() {
        let frame = Frame::new(Rect::new(36.0, 36.0, 200.0, 500.0));
        let state = frame.open(Page::new(3), 1);
        assert_eq!(state.cursor_y, Pt::from_i32(36));
        assert_eq!(state.content_bottom, Pt::from_i32(536));
        assert_eq!(state.column_index, 1);
        assert_eq!(state.available_height(), Pt::from_i32(500));
        assert!(frame.is_empty(state.cursor_y));
        assert_eq!(frame.remaining_height(Pt::from_i32(600)), Pt::ZERO);
    }

    #[test]
    fn negative_extent_is_clamped() {
        let frame = Frame::new(Rect::new(0.0, 0.0, -5.0, -1.0));
        assert_eq!(frame.width(), Pt::ZERO);
        assert_eq!(frame.open(Page::new(1), 0).column_height(), Pt::ZERO);
    }
}
