// Adapters between the widget and whatever toolkit hosts it.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollPosition {
    pub top: f64,
    pub left: f64,
}

/// Bounding box of a rendered element, in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// An editable text field the widget can take control of.
pub trait EditableSurface {
    fn value(&self) -> &str;
    fn set_value(&mut self, value: &str);
    fn scroll(&self) -> ScrollPosition;
    fn class_name(&self) -> &str;
    fn set_class_name(&mut self, class_name: String);
}

/// The layer drawn over the field that carries highlight markup.
pub trait OverlayLayer {
    fn set_markup(&mut self, markup: String);
    fn set_scroll(&mut self, scroll: ScrollPosition);
}

/// Element under the pointer, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerTarget {
    pub class_name: String,
    pub attributes: Vec<(String, String)>,
    pub bounds: Rect,
}

impl PointerTarget {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }
}

/// In-memory text field, used by the terminal front end and in tests.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    value: String,
    class_name: String,
    scroll: ScrollPosition,
}

impl TextField {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn scroll_to(&mut self, scroll: ScrollPosition) {
        self.scroll = scroll;
    }
}

impl EditableSurface for TextField {
    fn value(&self) -> &str {
        &self.value
    }

    fn set_value(&mut self, value: &str) {
        value.clone_into(&mut self.value);
    }

    fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn set_class_name(&mut self, class_name: String) {
        self.class_name = class_name;
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayBuffer {
    pub markup: String,
    pub scroll: ScrollPosition,
}

impl OverlayLayer for OverlayBuffer {
    fn set_markup(&mut self, markup: String) {
        self.markup = markup;
    }

    fn set_scroll(&mut self, scroll: ScrollPosition) {
        self.scroll = scroll;
    }
}
