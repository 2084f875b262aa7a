//! Detail overlay with a focus trap
//!
//! The overlay is generic over the handle used for focusable elements, so
//! the same trap drives any front end that can report and move focus.

use common::models::ImageRecord;

/// Keys the trap reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    Tab,
    ShiftTab,
    Escape,
}

/// What the front end should do with focus after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusMove<F> {
    /// Let the default focus traversal happen
    Stay,
    /// Move focus here instead
    MoveTo(F),
    /// The overlay closed; restore focus to the element, if any
    Close(Option<F>),
}

#[derive(Debug)]
struct Opened<F> {
    image: ImageRecord,
    focusables: Vec<F>,
    restore_to: Option<F>,
}

#[derive(Debug)]
pub struct DetailOverlay<F> {
    opened: Option<Opened<F>>,
}

impl<F> Default for DetailOverlay<F> {
    fn default() -> Self {
        Self { opened: None }
    }
}

impl<F: Clone + PartialEq> DetailOverlay<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `image`. Returns the element that should receive focus.
    pub fn open(
        &mut self,
        image: ImageRecord,
        focusables: Vec<F>,
        previously_focused: Option<F>,
    ) -> Option<F> {
        let first = focusables.first().cloned();
        self.opened = Some(Opened {
            image,
            focusables,
            restore_to: previously_focused,
        });
        first
    }

    pub fn is_open(&self) -> bool {
        self.opened.is_some()
    }

    pub fn image(&self) -> Option<&ImageRecord> {
        self.opened.as_ref().map(|opened| &opened.image)
    }

    /// Close the overlay, returning the element to restore focus to
    pub fn close(&mut self) -> Option<F> {
        self.opened.take().and_then(|opened| opened.restore_to)
    }

    pub fn backdrop_click(&mut self) -> Option<F> {
        self.close()
    }

    pub fn handle_key(&mut self, key: OverlayKey, focused: Option<&F>) -> FocusMove<F> {
        let Some(opened) = self.opened.as_ref() else {
            return FocusMove::Stay;
        };

        if key == OverlayKey::Escape {
            return FocusMove::Close(self.close());
        }

        let (Some(first), Some(last)) = (opened.focusables.first(), opened.focusables.last())
        else {
            return FocusMove::Stay;
        };

        match key {
            OverlayKey::Tab if focused == Some(last) => FocusMove::MoveTo(first.clone()),
            OverlayKey::ShiftTab if focused == Some(first) => FocusMove::MoveTo(last.clone()),
            _ => FocusMove::Stay,
        }
    }
}
