use std::time::Duration;

use rte_core::rich_utils::{self, insert_soft_newline, on_tab};
use rte_core::{
    BlockType, ChangeType, EditorCommand, EditorState, EditorValue, MAX_LIST_DEPTH, MarkupFormat,
    change_block_depth, change_block_type, insert_block_after, is_list_item, markup, modifier,
};

use crate::config::ToolbarConfig;
use crate::interceptor::{KeyContext, KeyInterceptors};
use crate::keys::{Key, KeyEvent, Platform, default_key_binding, is_soft_newline_event};
use crate::popover::{ActiveElement, DismissCause, FocusReturn, InputKind, Popover};
use crate::toolbar::{Toolbar, ToolbarAction, ToolbarView};

/// Closing tag after which pasted HTML is discarded.
const CLOSE_HTML_TAG: &str = "</html>";

/// The editable surface the shell drives.
pub trait EditorSurface {
    fn focus(&mut self);

    /// Focuses after `delay`. Focusing twice is harmless.
    fn schedule_focus(&mut self, delay: Duration);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// An interceptor took the event.
    Claimed(&'static str),
    Handled,
    /// Left to the surface's own text input.
    NotHandled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopoverKind {
    Link,
    Source,
}

type ChangeHandler = Box<dyn FnMut(&EditorValue)>;

/// Owns the value, routes input through the key policies and the toolbar,
/// and reports every new value through one change handler.
pub struct EditorShell<S> {
    value: EditorValue,
    toolbar: Toolbar,
    interceptors: KeyInterceptors,
    platform: Platform,
    surface: S,
    view_source: Option<(MarkupFormat, Popover)>,
    on_change: ChangeHandler,
}

impl<S: EditorSurface> EditorShell<S> {
    pub fn new(
        value: EditorValue,
        config: ToolbarConfig,
        surface: S,
        on_change: impl FnMut(&EditorValue) + 'static,
    ) -> Self {
        let view_source = config
            .view_source_format()
            .map(|format| (format, Popover::new(InputKind::TextArea)));
        Self {
            value,
            toolbar: Toolbar::new(config),
            interceptors: KeyInterceptors::with_defaults(),
            platform: Platform::default(),
            surface,
            view_source,
            on_change: Box::new(on_change),
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the interceptor chain, built-ins included.
    pub fn interceptors(mut self, interceptors: KeyInterceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn value(&self) -> &EditorValue {
        &self.value
    }

    pub fn editor_state(&self) -> &EditorState {
        self.value.editor_state()
    }

    /// Adopts a value pushed down by the host without echoing it back.
    pub fn set_value(&mut self, value: EditorValue) {
        self.value = value;
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn toolbar_mut(&mut self) -> &mut Toolbar {
        &mut self.toolbar
    }

    pub fn toolbar_view(&self) -> ToolbarView {
        self.toolbar.view(self.editor_state())
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn source_popover(&self) -> Option<&Popover> {
        self.view_source.as_ref().map(|(_, popover)| popover)
    }

    pub fn source_popover_mut(&mut self) -> Option<&mut Popover> {
        self.view_source.as_mut().map(|(_, popover)| popover)
    }

    /// Publishes `state` as the new value.
    pub fn handle_change(&mut self, state: EditorState) {
        self.value = self.value.set_editor_state(state);
        (self.on_change)(&self.value);
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        let state = self.value.editor_state().clone();
        let mut cx = KeyContext {
            state: &state,
            platform: self.platform,
            toolbar: &mut self.toolbar,
        };
        if let Some(id) = self.interceptors.offer(event, &mut cx) {
            return KeyOutcome::Claimed(id);
        }

        match event.key {
            Key::Enter if self.handle_return(event) => return KeyOutcome::Handled,
            Key::Tab => {
                return if self.handle_tab(event.modifiers.shift) {
                    KeyOutcome::Handled
                } else {
                    KeyOutcome::NotHandled
                };
            }
            _ => {}
        }

        match default_key_binding(event, self.platform) {
            Some(command) if self.handle_key_command(command) => KeyOutcome::Handled,
            _ => KeyOutcome::NotHandled,
        }
    }

    /// Return key policies, first match wins.
    pub fn handle_return(&mut self, event: &KeyEvent) -> bool {
        self.handle_return_soft_newline(event)
            || self.handle_return_empty_list_item()
            || self.handle_return_special_block()
    }

    fn handle_return_soft_newline(&mut self, event: &KeyEvent) -> bool {
        if !is_soft_newline_event(event) {
            return false;
        }
        tracing::debug!("return inserts soft newline");
        let next = insert_soft_newline(self.editor_state());
        self.handle_change(next);
        true
    }

    /// Return in an empty list item leaves the list one level at a time.
    fn handle_return_empty_list_item(&mut self) -> bool {
        let state = self.editor_state();
        let selection = state.selection();
        if !selection.is_collapsed() {
            return false;
        }
        let Some(block) = state.current_content().block_for_key(selection.start_key()) else {
            return false;
        };
        if !is_list_item(block) || !block.is_empty() {
            return false;
        }

        let key = block.key().clone();
        let depth = block.depth();
        tracing::debug!(block = %key, depth, "return in empty list item");
        let next = if depth == 0 {
            change_block_type(state, &key, BlockType::Unstyled)
        } else {
            change_block_depth(state, &key, i32::from(depth) - 1)
        };
        self.handle_change(next);
        true
    }

    /// Return at the end of a heading, quote or code block starts a plain
    /// paragraph.
    fn handle_return_special_block(&mut self) -> bool {
        let state = self.editor_state();
        let selection = state.selection();
        if !selection.is_collapsed() {
            return false;
        }
        let Some(block) = state.current_content().block_for_key(selection.start_key()) else {
            return false;
        };
        if is_list_item(block) || block.block_type() == BlockType::Unstyled {
            return false;
        }
        if block.len() != selection.start_offset() {
            return false;
        }

        let key = block.key().clone();
        tracing::debug!(block = %key, block_type = %block.block_type(), "return at end of block");
        let next = insert_block_after(state, &key, BlockType::Unstyled);
        self.handle_change(next);
        true
    }

    pub fn handle_tab(&mut self, shift: bool) -> bool {
        let state = self.editor_state();
        let next = on_tab(state, shift, MAX_LIST_DEPTH);
        if next == *state {
            return false;
        }
        self.handle_change(next);
        true
    }

    pub fn handle_key_command(&mut self, command: EditorCommand) -> bool {
        match rich_utils::handle_key_command(self.editor_state(), command) {
            Some(next) => {
                self.handle_change(next);
                true
            }
            None => false,
        }
    }

    /// Plain typed text.
    pub fn handle_before_input(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let next = rich_utils::insert_text(self.editor_state(), text);
        self.handle_change(next);
        true
    }

    /// Pasted HTML replaces the document. Anything after the first closing
    /// `</html>` is dropped before parsing. Plain text is left to the surface.
    pub fn handle_pasted_text(&mut self, _text: &str, html: Option<&str>) -> bool {
        let Some(html) = html.filter(|html| !html.is_empty()) else {
            return false;
        };
        let html = truncate_pasted_html(html);
        let content = match markup::from_markup(html, MarkupFormat::Html) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(%err, "failed to import pasted html");
                return false;
            }
        };
        let state = self.editor_state();
        let next = modifier::replace_document(state.selection(), content);
        let next = state.push(next, ChangeType::InsertFragment);
        self.handle_change(next);
        true
    }

    pub fn dispatch_toolbar(&mut self, action: ToolbarAction) {
        let state = self.editor_state().clone();
        let mut changed = None;
        let focus = self
            .toolbar
            .dispatch(action, &state, |next| changed = Some(next));
        if let Some(next) = changed {
            self.handle_change(next);
        }
        self.return_focus(focus);
    }

    /// Opens the source popover prefilled with the current markup, or closes
    /// it. Returns false when view-source is off.
    pub fn toggle_source_popover(&mut self) -> bool {
        let Some((format, popover)) = self.view_source.as_mut() else {
            return false;
        };
        let focus = if popover.is_shown() {
            popover.hide(DismissCause::Cancel)
        } else {
            let source = self.value.to_markup(*format).unwrap_or_else(|err| {
                tracing::warn!(%err, %format, "failed to export source");
                String::new()
            });
            popover.show(source);
            None
        };
        self.return_focus(focus);
        true
    }

    /// Replaces the document with the edited source.
    pub fn submit_source(&mut self) -> bool {
        let Some((format, popover)) = self.view_source.as_mut() else {
            return false;
        };
        let format = *format;
        let Some((submission, focus)) = popover.submit() else {
            return false;
        };
        let imported = match markup::from_markup(&submission.value, format) {
            Ok(content) => {
                let state = self.editor_state();
                let next = modifier::replace_document(state.selection(), content);
                let next = state.push(next, ChangeType::InsertFragment);
                self.handle_change(next);
                true
            }
            Err(err) => {
                tracing::warn!(%err, %format, "failed to import edited source");
                false
            }
        };
        self.return_focus(Some(focus));
        imported
    }

    /// A document click. `inside` names the popover containing the target.
    pub fn on_document_click(&mut self, inside: Option<PopoverKind>, active: ActiveElement) {
        let link = self
            .toolbar
            .link_popover_mut()
            .on_document_click(inside == Some(PopoverKind::Link), active);
        let in_source = inside == Some(PopoverKind::Source);
        let source = self
            .source_popover_mut()
            .and_then(|popover| popover.on_document_click(in_source, active));
        self.return_focus(link.or(source));
    }

    pub fn on_document_keydown(&mut self, event: &KeyEvent) {
        let link = self.toolbar.link_popover_mut().on_document_keydown(event);
        let source = self
            .source_popover_mut()
            .and_then(|popover| popover.on_document_keydown(event));
        self.return_focus(link.or(source));
    }

    /// Hidden when the empty document's first block is not a paragraph, so
    /// the hint does not sit inside a heading or list bullet.
    pub fn should_hide_placeholder(&self) -> bool {
        let content = self.value.current_content();
        !content.has_text() && content.first_block().block_type() != BlockType::Unstyled
    }

    fn return_focus(&mut self, focus: Option<FocusReturn>) {
        match focus {
            Some(FocusReturn::Immediate) => self.surface.focus(),
            Some(FocusReturn::Deferred(delay)) => self.surface.schedule_focus(delay),
            Some(FocusReturn::Keep) | None => {}
        }
    }
}

/// Cuts pasted HTML right after the first `</html>`.
pub fn truncate_pasted_html(html: &str) -> &str {
    match html.find(CLOSE_HTML_TAG) {
        Some(index) => {
            let end = index + CLOSE_HTML_TAG.len();
            if end < html.len() {
                tracing::debug!(dropped = html.len() - end, "truncated pasted html");
            }
            &html[..end]
        }
        None => html,
    }
}
