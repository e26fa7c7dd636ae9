use std::collections::BTreeMap;
use std::time::Duration;

use crate::keys::{Key, KeyEvent};

/// Delay before focus goes back to the editor after a click-away, so the
/// click finishes moving focus first.
pub const FOCUS_RETURN_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputKind {
    #[default]
    Text,
    TextArea,
}

/// An auxiliary checkbox rendered below the primary input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckboxInput {
    pub name: String,
    pub value: String,
    pub checked: bool,
}

impl CheckboxInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            checked: false,
        }
    }
}

/// What held focus when a document click landed outside the popover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveElement {
    None,
    Body,
    InsideEditor,
    OutsideEditor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissCause {
    Cancel,
    ClickAway(ActiveElement),
    Escape,
    Submit,
}

/// How the editor regains focus once a popover closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusReturn {
    Immediate,
    Deferred(Duration),
    /// Something inside the editor already has focus.
    Keep,
}

impl FocusReturn {
    pub fn after(cause: DismissCause) -> Self {
        match cause {
            DismissCause::ClickAway(ActiveElement::InsideEditor) => FocusReturn::Keep,
            DismissCause::ClickAway(_) => FocusReturn::Deferred(FOCUS_RETURN_DELAY),
            DismissCause::Cancel | DismissCause::Escape | DismissCause::Submit => {
                FocusReturn::Immediate
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopoverSubmission {
    pub value: String,
    /// `name -> value` of every checked checkbox.
    pub additional: BTreeMap<String, String>,
}

/// A floating input bound to one shown/hidden flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Popover {
    shown: bool,
    kind: InputKind,
    placeholder: Option<String>,
    value: String,
    checkboxes: Vec<CheckboxInput>,
}

impl Popover {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn checkbox(mut self, checkbox: CheckboxInput) -> Self {
        self.checkboxes.push(checkbox);
        self
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn checkboxes(&self) -> &[CheckboxInput] {
        &self.checkboxes
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns false when no checkbox has that name.
    pub fn set_checked(&mut self, name: &str, checked: bool) -> bool {
        let mut found = false;
        for checkbox in self.checkboxes.iter_mut().filter(|c| c.name == name) {
            checkbox.checked = checked;
            found = true;
        }
        found
    }

    /// Opens with a fresh form: `initial` in the input, every box unchecked.
    pub fn show(&mut self, initial: impl Into<String>) {
        if self.shown {
            return;
        }
        self.value = initial.into();
        for checkbox in &mut self.checkboxes {
            checkbox.checked = false;
        }
        self.shown = true;
        tracing::debug!(kind = ?self.kind, "popover shown");
    }

    /// Closes the popover. `None` when it was already hidden.
    pub fn hide(&mut self, cause: DismissCause) -> Option<FocusReturn> {
        if !self.shown {
            return None;
        }
        self.shown = false;
        let focus = FocusReturn::after(cause);
        tracing::debug!(kind = ?self.kind, ?cause, ?focus, "popover hidden");
        Some(focus)
    }

    /// Flips the flag. Showing yields no focus change.
    pub fn toggle(&mut self, initial: impl Into<String>) -> Option<FocusReturn> {
        if self.shown {
            self.hide(DismissCause::Cancel)
        } else {
            self.show(initial);
            None
        }
    }

    pub fn on_document_click(
        &mut self,
        inside_popover: bool,
        active: ActiveElement,
    ) -> Option<FocusReturn> {
        if inside_popover {
            return None;
        }
        self.hide(DismissCause::ClickAway(active))
    }

    pub fn on_document_keydown(&mut self, event: &KeyEvent) -> Option<FocusReturn> {
        if event.key != Key::Escape {
            return None;
        }
        self.hide(DismissCause::Escape)
    }

    /// Collects the form and closes. `None` when the popover is hidden.
    pub fn submit(&mut self) -> Option<(PopoverSubmission, FocusReturn)> {
        if !self.shown {
            return None;
        }
        let submission = PopoverSubmission {
            value: self.value.clone(),
            additional: self
                .checkboxes
                .iter()
                .filter(|checkbox| checkbox.checked)
                .map(|checkbox| (checkbox.name.clone(), checkbox.value.clone()))
                .collect(),
        };
        let focus = self.hide(DismissCause::Submit)?;
        Some((submission, focus))
    }
}
