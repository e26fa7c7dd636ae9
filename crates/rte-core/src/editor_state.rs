use std::sync::Arc;

use crate::content::{BlockKey, ContentState, InlineStyleSet};
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    InsertCharacters,
    BackspaceCharacter,
    DeleteCharacter,
    RemoveRange,
    InsertFragment,
    SplitBlock,
    ChangeBlockType,
    ChangeInlineStyle,
    ApplyEntity,
    AdjustDepth,
    Undo,
    Redo,
}

impl ChangeType {
    fn coalesces(self) -> bool {
        matches!(
            self,
            ChangeType::InsertCharacters
                | ChangeType::BackspaceCharacter
                | ChangeType::DeleteCharacter
        )
    }

    /// Block-level changes leave a pending caret style in place.
    fn keeps_style_override(self) -> bool {
        matches!(
            self,
            ChangeType::AdjustDepth | ChangeType::ChangeBlockType | ChangeType::SplitBlock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorConfig {
    pub max_undo: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

/// Snapshot of everything the editing surface needs: content, selection and
/// history. Every transition returns a new value.
#[derive(Debug, Clone)]
pub struct EditorState {
    content: Arc<ContentState>,
    selection: SelectionState,
    undo_stack: Vec<Arc<ContentState>>,
    redo_stack: Vec<Arc<ContentState>>,
    last_change_type: Option<ChangeType>,
    inline_style_override: Option<InlineStyleSet>,
    config: EditorConfig,
}

impl PartialEq for EditorState {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.selection == other.selection
            && self.undo_stack == other.undo_stack
            && self.redo_stack == other.redo_stack
            && self.last_change_type == other.last_change_type
            && self.inline_style_override == other.inline_style_override
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl EditorState {
    pub fn create_empty() -> Self {
        Self::create_with_content(ContentState::default())
    }

    pub fn create_with_content(content: ContentState) -> Self {
        Self::with_config(content, EditorConfig::default())
    }

    pub fn with_config(content: ContentState, config: EditorConfig) -> Self {
        let selection = content.selection_after().clone();
        Self {
            content: Arc::new(content),
            selection,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            last_change_type: None,
            inline_style_override: None,
            config: config.with_defaults(),
        }
    }

    pub fn current_content(&self) -> &ContentState {
        &self.content
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn last_change_type(&self) -> Option<ChangeType> {
        self.last_change_type
    }

    pub fn inline_style_override(&self) -> Option<&InlineStyleSet> {
        self.inline_style_override.as_ref()
    }

    /// Adopts `content` as the new current content and records the old one
    /// for undo.
    pub fn push(&self, content: ContentState, change: ChangeType) -> EditorState {
        let mut next = self.clone();
        let selection = content
            .selection_after()
            .clone()
            .with_focus(self.selection.has_focus);

        if content.same_document(&self.content) {
            next.selection = selection;
            return next;
        }

        let coalesce = change.coalesces()
            && self.last_change_type == Some(change)
            && self.inline_style_override.is_none()
            && content
                .selection_before()
                .same_range(self.content.selection_after())
            && !self.undo_stack.is_empty();
        if !coalesce {
            next.undo_stack.push(Arc::clone(&self.content));
            if next.undo_stack.len() > self.config.max_undo {
                next.undo_stack.remove(0);
            }
        }

        next.content = Arc::new(content);
        next.selection = selection;
        next.redo_stack.clear();
        next.last_change_type = Some(change);
        if !change.keeps_style_override() {
            next.inline_style_override = None;
        }
        next
    }

    pub fn undo(&self) -> EditorState {
        let mut next = self.clone();
        let Some(previous) = next.undo_stack.pop() else {
            return next;
        };
        next.selection = self
            .content
            .selection_before()
            .clone()
            .with_focus(self.selection.has_focus);
        next.redo_stack.push(Arc::clone(&self.content));
        next.content = previous;
        next.last_change_type = Some(ChangeType::Undo);
        next.inline_style_override = None;
        next
    }

    pub fn redo(&self) -> EditorState {
        let mut next = self.clone();
        let Some(following) = next.redo_stack.pop() else {
            return next;
        };
        next.selection = following
            .selection_after()
            .clone()
            .with_focus(self.selection.has_focus);
        next.undo_stack.push(Arc::clone(&self.content));
        next.content = following;
        next.last_change_type = Some(ChangeType::Redo);
        next.inline_style_override = None;
        next
    }

    pub fn force_selection(&self, selection: SelectionState) -> EditorState {
        let mut next = self.clone();
        if selection != self.selection {
            next.inline_style_override = None;
        }
        next.selection = selection.with_focus(true);
        next
    }

    pub fn set_inline_style_override(&self, style: InlineStyleSet) -> EditorState {
        let mut next = self.clone();
        next.inline_style_override = Some(style);
        next
    }

    pub fn current_inline_style(&self) -> InlineStyleSet {
        if let Some(style) = &self.inline_style_override {
            return style.clone();
        }

        let content = &self.content;
        let selection = &self.selection;
        let key = selection.start_key();
        let offset = selection.start_offset();
        let Some(block) = content.block_for_key(key) else {
            return InlineStyleSet::new();
        };

        if selection.is_collapsed() {
            if offset > 0 {
                return block.style_at(offset - 1);
            }
            if !block.is_empty() {
                return block.style_at(0);
            }
        } else {
            if offset < block.len() {
                return block.style_at(offset);
            }
            if offset > 0 {
                return block.style_at(offset - 1);
            }
        }
        self.look_upward_for_style(key)
    }

    fn look_upward_for_style(&self, key: &BlockKey) -> InlineStyleSet {
        let Some(ix) = self.content.block_index(key) else {
            return InlineStyleSet::new();
        };
        self.content.blocks()[..ix]
            .iter()
            .rev()
            .find(|block| !block.is_empty())
            .map(|block| block.style_at(block.len() - 1))
            .unwrap_or_default()
    }
}
