//! The grammar overlay widget.
//!
//! [`Rectifier`] wraps an editable field, owns its text, keeps a highlight
//! overlay in sync with the latest grammar check and applies suggestions picked
//! from the hover tooltip.

pub mod hover;
pub mod markup;
pub mod surface;

use crate::debounce::{CheckEvent, CheckScheduler, Ticket};
use crate::text::{byte_span, splice};
use crate::{Config, ErrorDescriptor};
use hover::HoverState;
use std::fmt;
use surface::{EditableSurface, OverlayLayer, PointerTarget, Rect, ScrollPosition};

/// What the widget shows below the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Checking,
    Clean,
    Found(usize),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Checking => write!(f, "Checking..."),
            Status::Clean => write!(f, "No grammar errors!"),
            Status::Found(1) => write!(f, "Found 1 error"),
            Status::Found(n) => write!(f, "Found {} errors", n),
        }
    }
}

pub struct Rectifier<S, O, C> {
    surface: S,
    overlay: O,
    scheduler: C,
    text: String,
    errors: Vec<ErrorDescriptor>,
    hover: Option<HoverState>,
    loading: bool,
    revision: Ticket,
    // Ticket of the newest request known to be in flight or answered
    last_issued: Ticket,
    tooltip_offset: f64,
}

impl<S, O, C> Rectifier<S, O, C>
where
    S: EditableSurface,
    O: OverlayLayer,
    C: CheckScheduler,
{
    pub fn new(mut surface: S, overlay: O, scheduler: C, config: &Config) -> Self {
        let class_name = format!("{} {}", surface.class_name(), config.input_class);
        surface.set_class_name(class_name.trim_start().to_string());
        surface.set_value("");

        let mut rectifier = Self {
            surface,
            overlay,
            scheduler,
            text: String::new(),
            errors: Vec::new(),
            hover: None,
            loading: false,
            revision: 0,
            last_issued: 0,
            tooltip_offset: config.tooltip_offset,
        };
        rectifier.refresh_overlay();
        rectifier
    }

    /// Change notification from the field.
    pub fn on_input(&mut self, text: impl Into<String>) {
        self.set_text(text.into());
    }

    /// Feed back progress from the scheduler.
    ///
    /// The result of the most recently issued request is applied even if the
    /// text has been edited since; anything older than that is dropped.
    /// Returns `true` when the error set was replaced.
    pub fn handle_check_event(&mut self, event: CheckEvent) -> bool {
        let ticket = event.ticket();
        if ticket < self.last_issued {
            log::debug!(
                "discarding check event for revision {} (latest issued {})",
                ticket,
                self.last_issued
            );
            return false;
        }
        self.last_issued = ticket;

        match event {
            CheckEvent::Started { .. } => {
                self.loading = true;
                false
            }
            CheckEvent::Finished { result, .. } => {
                self.loading = false;
                match result {
                    Ok(errors) => self.errors = errors,
                    Err(e) => {
                        log::warn!("Grammar check failed: {}", e);
                        self.errors.clear();
                    }
                }
                self.refresh_overlay();
                true
            }
        }
    }

    /// Pointer moved over the overlay; `target` is the element under it.
    pub fn on_pointer_move(&mut self, target: Option<&PointerTarget>, page_scroll: ScrollPosition) {
        self.hover = target
            .and_then(|target| HoverState::from_target(target, page_scroll, self.tooltip_offset));
    }

    pub fn on_pointer_leave(&mut self) {
        self.hover = None;
    }

    pub fn on_scroll(&mut self) {
        self.overlay.set_scroll(self.surface.scroll());
    }

    /// Replace the hovered error with `suggestion`.
    ///
    /// The recorded span is used when it still holds the flagged text;
    /// otherwise the first occurrence of the flagged text is replaced. If the
    /// text is gone entirely nothing changes. The tooltip closes either way.
    ///
    /// Errors are matched by their flagged text only, so when several share
    /// the same `bad` text the first one whose span still reads it is
    /// replaced, not necessarily the one under the pointer.
    pub fn apply_suggestion(&mut self, suggestion: &str) {
        let Some(hover) = self.hover.take() else {
            return;
        };

        let recorded = self
            .errors
            .iter()
            .filter(|e| e.bad == hover.word)
            .map(|e| byte_span(&self.text, e.offset, e.length))
            .find(|range| self.text[range.clone()] == hover.word);

        let range = recorded.or_else(|| {
            self.text
                .find(&hover.word)
                .map(|start| start..start + hover.word.len())
        });

        match range {
            Some(range) => {
                let text = splice(&self.text, range, suggestion);
                self.set_text(text);
            }
            None => log::debug!("'{}' no longer in text, suggestion ignored", hover.word),
        }
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
        self.surface.set_value(&self.text);
        self.revision += 1;

        if self.text.is_empty() {
            self.scheduler.cancel();
            // Nothing issued before this point may land on the empty text
            self.last_issued = self.revision;
            self.errors.clear();
            self.loading = false;
        } else {
            self.scheduler.schedule(self.revision, self.text.clone());
        }
        self.refresh_overlay();
    }

    fn refresh_overlay(&mut self) {
        self.overlay.set_markup(self.markup());
    }

    pub fn markup(&self) -> String {
        markup::render(&self.text, &self.errors)
    }

    pub fn status(&self) -> Status {
        if self.loading {
            Status::Checking
        } else if self.text.is_empty() {
            Status::Idle
        } else if self.errors.is_empty() {
            Status::Clean
        } else {
            Status::Found(self.errors.len())
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn errors(&self) -> &[ErrorDescriptor] {
        &self.errors
    }

    pub fn hover(&self) -> Option<&HoverState> {
        self.hover.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn revision(&self) -> Ticket {
        self.revision
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }
}

/// Pointer target for the marker element rendered for `error`.
pub fn marker_target(error: &ErrorDescriptor, bounds: Rect) -> PointerTarget {
    PointerTarget {
        class_name: markup::MARKER_CLASS.to_string(),
        attributes: markup::marker_attributes(error),
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::surface::{OverlayBuffer, TextField};
    use super::*;
    use crate::client::ClientError;
    use reqwest::StatusCode;

    #[derive(Debug, Default)]
    struct RecordingScheduler {
        scheduled: Vec<(Ticket, String)>,
        cancels: usize,
    }

    impl CheckScheduler for RecordingScheduler {
        fn schedule(&mut self, ticket: Ticket, text: String) {
            self.scheduled.push((ticket, text));
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    type TestRectifier = Rectifier<TextField, OverlayBuffer, RecordingScheduler>;

    fn rectifier() -> TestRectifier {
        Rectifier::new(
            TextField::new("notes"),
            OverlayBuffer::default(),
            RecordingScheduler::default(),
            &Config::default(),
        )
    }

    fn an_error(offset: usize) -> ErrorDescriptor {
        ErrorDescriptor {
            bad: "an error".to_string(),
            message: "Consider rephrasing".to_string(),
            suggestions: vec!["a mistake".to_string(), "a slip".to_string()],
            offset,
            length: 8,
        }
    }

    fn finish(r: &mut TestRectifier, errors: Vec<ErrorDescriptor>) {
        let ticket = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket });
        r.handle_check_event(CheckEvent::Finished {
            ticket,
            result: Ok(errors),
        });
    }

    fn hover(r: &mut TestRectifier, error: &ErrorDescriptor) {
        let target = marker_target(error, Rect::default());
        r.on_pointer_move(Some(&target), ScrollPosition::default());
    }

    #[test]
    fn test_wraps_surface() {
        let r = rectifier();
        assert_eq!(r.surface().class_name(), "notes text-input");
        assert_eq!(r.surface().value(), "");
        assert_eq!(r.status(), Status::Idle);
    }

    #[test]
    fn test_input_is_mirrored_and_scheduled() {
        let mut r = rectifier();
        r.on_input("T");
        r.on_input("Th");

        assert_eq!(r.text(), "Th");
        assert_eq!(r.surface().value(), "Th");
        assert_eq!(
            r.scheduler.scheduled,
            vec![(1, "T".to_string()), (2, "Th".to_string())]
        );
    }

    #[test]
    fn test_empty_text_never_schedules() {
        let mut r = rectifier();
        r.on_input("");

        assert!(r.scheduler.scheduled.is_empty());
        assert_eq!(r.scheduler.cancels, 1);
        assert!(r.errors().is_empty());
    }

    #[test]
    fn test_clearing_text_drops_errors_immediately() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        finish(&mut r, vec![an_error(8)]);
        assert_eq!(r.status(), Status::Found(1));

        r.on_input("");
        assert!(r.errors().is_empty());
        assert_eq!(r.overlay().markup, "");
        assert_eq!(r.status(), Status::Idle);
    }

    #[test]
    fn test_results_are_rendered() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        let ticket = r.revision();

        r.handle_check_event(CheckEvent::Started { ticket });
        assert!(r.is_loading());
        assert_eq!(r.status().to_string(), "Checking...");

        r.handle_check_event(CheckEvent::Finished {
            ticket,
            result: Ok(vec![an_error(8)]),
        });
        assert!(!r.is_loading());
        assert_eq!(r.status().to_string(), "Found 1 error");

        let found = markup::markers(&r.overlay().markup);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "an error");
        assert_eq!(found[0].suggestions, "a mistake,a slip");
    }

    #[test]
    fn test_failed_check_soft_fails() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        finish(&mut r, vec![an_error(8)]);

        r.on_input("This is an error!");
        let ticket = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket });
        r.handle_check_event(CheckEvent::Finished {
            ticket,
            result: Err(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        });

        assert!(!r.is_loading());
        assert!(r.errors().is_empty());
        assert_eq!(r.status(), Status::Clean);
        assert_eq!(r.overlay().markup, "This is an error!");
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        let first = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket: first });

        r.on_input("This is an error. And another error.");
        let second = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket: second });
        r.handle_check_event(CheckEvent::Finished {
            ticket: second,
            result: Ok(vec![an_error(8), {
                let mut e = an_error(0);
                e.bad = "another error".to_string();
                e.offset = 22;
                e.length = 13;
                e
            }]),
        });

        // The first request resolves last
        r.handle_check_event(CheckEvent::Finished {
            ticket: first,
            result: Ok(Vec::new()),
        });

        assert_eq!(r.errors().len(), 2);
        assert_eq!(r.status(), Status::Found(2));
    }

    #[test]
    fn test_latest_issued_result_applies_while_edit_is_pending() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        finish(&mut r, vec![an_error(8)]);

        r.on_input("Oh, this is an error, an error.");
        let ticket = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket });

        // Typing goes on, its check not issued yet
        r.on_input("Oh, this is an error, an error. More");
        let applied = r.handle_check_event(CheckEvent::Finished {
            ticket,
            result: Ok(vec![an_error(12), an_error(22)]),
        });

        assert!(applied);
        assert!(!r.is_loading());
        let offsets: Vec<_> = r.errors().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![12, 22]);
        assert_eq!(r.status(), Status::Found(2));
    }

    #[test]
    fn test_older_result_ignored_once_newer_request_issued() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        let first = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket: first });

        r.on_input("This is an error. More");
        let second = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket: second });

        let applied = r.handle_check_event(CheckEvent::Finished {
            ticket: first,
            result: Ok(vec![an_error(8)]),
        });

        assert!(!applied);
        assert!(r.errors().is_empty());
        // The newer request is still in flight
        assert!(r.is_loading());

        r.handle_check_event(CheckEvent::Finished {
            ticket: second,
            result: Ok(Vec::new()),
        });
        assert!(!r.is_loading());
        assert_eq!(r.status(), Status::Clean);
    }

    #[test]
    fn test_result_issued_before_clearing_is_ignored() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        let ticket = r.revision();
        r.handle_check_event(CheckEvent::Started { ticket });
        r.on_input("");

        let applied = r.handle_check_event(CheckEvent::Finished {
            ticket,
            result: Ok(vec![an_error(8)]),
        });

        assert!(!applied);
        assert!(r.errors().is_empty());
        assert!(!r.is_loading());
        assert_eq!(r.status(), Status::Idle);
    }

    #[test]
    fn test_hover_and_leave() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        finish(&mut r, vec![an_error(8)]);

        let target = marker_target(
            &r.errors()[0].clone(),
            Rect {
                left: 56.0,
                top: 0.0,
                right: 110.0,
                bottom: 18.0,
            },
        );
        r.on_pointer_move(
            Some(&target),
            ScrollPosition {
                top: 20.0,
                left: 0.0,
            },
        );

        let hovered = r.hover().unwrap();
        assert_eq!(hovered.word, "an error");
        assert_eq!(hovered.suggestions, vec!["a mistake", "a slip"]);
        assert_eq!(hovered.position.x, 56.0);
        assert_eq!(hovered.position.y, 43.0);

        let plain = PointerTarget {
            class_name: "highlight-overlay".to_string(),
            ..Default::default()
        };
        r.on_pointer_move(Some(&plain), ScrollPosition::default());
        assert!(r.hover().is_none());

        hover(&mut r, &an_error(8));
        r.on_pointer_leave();
        assert!(r.hover().is_none());
    }

    #[test]
    fn test_apply_suggestion_at_recorded_span() {
        let mut r = rectifier();
        r.on_input("An error here and an error there.");
        let error = ErrorDescriptor {
            bad: "an error".to_string(),
            message: "Consider rephrasing".to_string(),
            suggestions: vec!["a mistake".to_string()],
            offset: 18,
            length: 8,
        };
        finish(&mut r, vec![error.clone()]);

        hover(&mut r, &error);
        r.apply_suggestion("a mistake");

        assert_eq!(r.text(), "An error here and a mistake there.");
        assert_eq!(r.surface().value(), r.text());
        assert!(r.hover().is_none());
        assert_eq!(
            r.scheduler.scheduled.last(),
            Some(&(r.revision(), "An error here and a mistake there.".to_string()))
        );
    }

    #[test]
    fn test_apply_suggestion_falls_back_to_search() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        // Offset is off by two, the recorded span no longer reads "an error"
        finish(&mut r, vec![an_error(10)]);

        hover(&mut r, &an_error(10));
        r.apply_suggestion("a mistake");

        assert_eq!(r.text(), "This is a mistake.");
    }

    #[test]
    fn test_apply_suggestion_when_word_is_gone() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        finish(&mut r, vec![an_error(8)]);
        hover(&mut r, &an_error(8));

        // Edited away before the suggestion was picked
        r.on_input("This is fine.");
        let revision = r.revision();
        r.apply_suggestion("a mistake");

        assert_eq!(r.text(), "This is fine.");
        assert_eq!(r.revision(), revision);
        assert!(r.hover().is_none());
    }

    #[test]
    fn test_apply_suggestion_without_hover() {
        let mut r = rectifier();
        r.on_input("This is an error.");
        r.apply_suggestion("a mistake");
        assert_eq!(r.text(), "This is an error.");
    }

    #[test]
    fn test_scroll_sync() {
        let mut r = rectifier();
        let scroll = ScrollPosition {
            top: 42.0,
            left: 7.0,
        };
        r.surface_mut().scroll_to(scroll);
        r.on_scroll();
        assert_eq!(r.overlay().scroll, scroll);
    }
}
