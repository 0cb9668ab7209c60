use super::markup::{ATTR_ERROR, ATTR_MESSAGE, ATTR_SUGGESTIONS, MARKER_CLASS};
use super::surface::{PointerTarget, ScrollPosition};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// The error currently under the pointer, and where its tooltip goes.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverState {
    pub word: String,
    pub suggestions: Vec<String>,
    pub message: String,
    pub position: Position,
}

impl HoverState {
    /// Decode a hovered marker element. Returns `None` for anything that is
    /// not a marker.
    pub fn from_target(
        target: &PointerTarget,
        page_scroll: ScrollPosition,
        tooltip_offset: f64,
    ) -> Option<Self> {
        if !target.has_class(MARKER_CLASS) {
            return None;
        }

        let word = target.attribute(ATTR_ERROR)?.to_string();
        let suggestions = target
            .attribute(ATTR_SUGGESTIONS)
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let message = target.attribute(ATTR_MESSAGE).unwrap_or_default().to_string();

        let position = Position {
            x: target.bounds.left + page_scroll.left,
            y: target.bounds.bottom + page_scroll.top + tooltip_offset,
        };

        Some(Self {
            word,
            suggestions,
            message,
            position,
        })
    }
}
