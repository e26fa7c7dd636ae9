//! Editor-state level operations behind toolbar buttons and key commands.

use std::fmt;

use crate::content::{BOLD, BlockType, CODE, Entity, ITALIC, STRIKETHROUGH, UNDERLINE};
use crate::editor_state::{ChangeType, EditorState};
use crate::modifier;
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    Bold,
    Italic,
    Underline,
    Code,
    Strikethrough,
    Backspace,
    Delete,
    SplitBlock,
    Undo,
    Redo,
}

impl EditorCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            EditorCommand::Bold => "bold",
            EditorCommand::Italic => "italic",
            EditorCommand::Underline => "underline",
            EditorCommand::Code => "code",
            EditorCommand::Strikethrough => "strikethrough",
            EditorCommand::Backspace => "backspace",
            EditorCommand::Delete => "delete",
            EditorCommand::SplitBlock => "split-block",
            EditorCommand::Undo => "undo",
            EditorCommand::Redo => "redo",
        }
    }

    fn inline_style(self) -> Option<&'static str> {
        match self {
            EditorCommand::Bold => Some(BOLD),
            EditorCommand::Italic => Some(ITALIC),
            EditorCommand::Underline => Some(UNDERLINE),
            EditorCommand::Code => Some(CODE),
            EditorCommand::Strikethrough => Some(STRIKETHROUGH),
            _ => None,
        }
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the block holding the selection start.
pub fn current_block_type(state: &EditorState) -> BlockType {
    let selection = state.selection();
    state
        .current_content()
        .block_for_key(selection.start_key())
        .map(|block| block.block_type())
        .unwrap_or_default()
}

pub fn toggle_inline_style(state: &EditorState, style: &str) -> EditorState {
    let selection = state.selection();
    let current = state.current_inline_style();

    if selection.is_collapsed() {
        let mut next_style = current;
        if !next_style.remove(style) {
            next_style.insert(style.to_string());
        }
        return state.set_inline_style_override(next_style);
    }

    let content = state.current_content();
    let next = if current.contains(style) {
        modifier::remove_inline_style(content, selection, style)
    } else {
        modifier::apply_inline_style(content, selection, style)
    };
    state.push(next, ChangeType::ChangeInlineStyle)
}

/// Sets the selected blocks to `block_type`, or back to unstyled when the
/// start block already has it.
pub fn toggle_block_type(state: &EditorState, block_type: BlockType) -> EditorState {
    let target = if current_block_type(state) == block_type {
        BlockType::Unstyled
    } else {
        block_type
    };
    let next = modifier::set_block_type(state.current_content(), state.selection(), target);
    state.push(next, ChangeType::ChangeBlockType)
}

/// Applies `entity` over `range`, or clears entities there when `None`.
/// The state's own selection is kept.
pub fn toggle_link(
    state: &EditorState,
    range: &SelectionState,
    entity: Option<Entity>,
) -> EditorState {
    let content = state.current_content();
    let mut next = match entity {
        Some(entity) => {
            let (with_entity, key) = content.with_entity(entity);
            modifier::apply_entity(&with_entity, range, Some(&key))
        }
        None => modifier::apply_entity(content, range, None),
    };
    next.set_selection_before(state.selection().clone());
    next.set_selection_after(state.selection().clone());
    state.push(next, ChangeType::ApplyEntity)
}

/// Inserts a line break inside the current block. A range is removed first
/// and the break takes the style found where the range started.
pub fn insert_soft_newline(state: &EditorState) -> EditorState {
    let content = state.current_content();
    let selection = state.selection();

    if selection.is_collapsed() {
        let style = state.current_inline_style();
        let next = modifier::insert_text(content, selection, "\n", &style, None);
        return state.push(next, ChangeType::InsertCharacters);
    }

    let removed = modifier::remove_range(content, selection);
    let caret = removed.selection_after().clone();
    let style = removed
        .block_for_key(&caret.anchor_key)
        .map(|block| block.style_at(caret.anchor_offset))
        .unwrap_or_default();
    let mut next = modifier::insert_text(&removed, &caret, "\n", &style, None);
    next.set_selection_before(selection.clone());
    state.push(next, ChangeType::InsertFragment)
}

/// List indentation for Tab / Shift+Tab. Only a list item directly below
/// another list item moves, and never more than one level deeper than that
/// item or past `max_depth`.
pub fn on_tab(state: &EditorState, shift: bool, max_depth: u8) -> EditorState {
    let selection = state.selection();
    if selection.anchor_key != selection.focus_key {
        return state.clone();
    }
    let content = state.current_content();
    let Some(block) = content.block_for_key(&selection.anchor_key) else {
        return state.clone();
    };
    if !block.is_list_item() {
        return state.clone();
    }
    let Some(above) = content.block_before(block.key()) else {
        return state.clone();
    };
    if !above.is_list_item() {
        return state.clone();
    }
    if !shift && block.depth() >= max_depth {
        return state.clone();
    }

    let max_depth = max_depth.min(above.depth().saturating_add(1));
    let adjustment = if shift { -1 } else { 1 };
    let next = modifier::adjust_block_depth(content, selection, adjustment, max_depth);
    if next.same_document(content) {
        return state.clone();
    }
    state.push(next, ChangeType::AdjustDepth)
}

/// Replaces the selection with `text` in the current inline style.
pub fn insert_text(state: &EditorState, text: &str) -> EditorState {
    let style = state.current_inline_style();
    let next = modifier::insert_text(
        state.current_content(),
        state.selection(),
        text,
        &style,
        None,
    );
    state.push(next, ChangeType::InsertCharacters)
}

/// Runs a key command. `None` means the command had nothing to do and the
/// caller may fall back to its own handling.
pub fn handle_key_command(state: &EditorState, command: EditorCommand) -> Option<EditorState> {
    if let Some(style) = command.inline_style() {
        return Some(toggle_inline_style(state, style));
    }
    match command {
        EditorCommand::Undo => state.can_undo().then(|| state.undo()),
        EditorCommand::Redo => state.can_redo().then(|| state.redo()),
        EditorCommand::SplitBlock => {
            let next = modifier::split_block(state.current_content(), state.selection());
            Some(state.push(next, ChangeType::SplitBlock))
        }
        EditorCommand::Backspace => on_backspace(state),
        EditorCommand::Delete => on_delete(state),
        _ => None,
    }
}

fn remove_selected(state: &EditorState) -> EditorState {
    let next = modifier::remove_range(state.current_content(), state.selection());
    state.push(next, ChangeType::RemoveRange)
}

/// At offset 0 of a styled block, backspace first drops the block style.
fn try_remove_block_style(state: &EditorState) -> Option<EditorState> {
    let selection = state.selection();
    if !selection.is_collapsed() || selection.anchor_offset != 0 {
        return None;
    }
    let content = state.current_content();
    let key = &selection.anchor_key;
    let block = content.block_for_key(key)?;
    if block.block_type() == BlockType::CodeBlock {
        if let Some(before) = content.block_before(key) {
            if before.block_type() == BlockType::CodeBlock && !before.is_empty() {
                return None;
            }
        }
    }
    if block.block_type() == BlockType::Unstyled {
        return None;
    }
    let next = modifier::set_block_type(content, selection, BlockType::Unstyled);
    Some(state.push(next, ChangeType::ChangeBlockType))
}

fn on_backspace(state: &EditorState) -> Option<EditorState> {
    let selection = state.selection();
    if !selection.is_collapsed() {
        return Some(remove_selected(state));
    }
    if let Some(next) = try_remove_block_style(state) {
        return Some(next);
    }

    let content = state.current_content();
    let key = &selection.anchor_key;
    let offset = selection.anchor_offset;
    let target = if offset > 0 {
        content.select(key, offset - 1, key, offset)
    } else {
        let before = content.block_before(key)?;
        content.select(before.key(), before.len(), key, 0)
    };
    let mut next = modifier::remove_range(content, &target);
    next.set_selection_before(selection.clone());
    Some(state.push(next, ChangeType::BackspaceCharacter))
}

fn on_delete(state: &EditorState) -> Option<EditorState> {
    let selection = state.selection();
    if !selection.is_collapsed() {
        return Some(remove_selected(state));
    }

    let content = state.current_content();
    let key = &selection.anchor_key;
    let offset = selection.anchor_offset;
    let block = content.block_for_key(key)?;
    let target = if offset < block.len() {
        content.select(key, offset, key, offset + 1)
    } else {
        let after = content.block_after(key)?;
        content.select(key, offset, after.key(), 0)
    };
    let mut next = modifier::remove_range(content, &target);
    next.set_selection_before(selection.clone());
    Some(state.push(next, ChangeType::DeleteCharacter))
}
