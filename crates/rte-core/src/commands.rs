use crate::content::{BlockKey, BlockType, ContentBlock, ContentState, EntityKey};
use crate::editor_state::{ChangeType, EditorState};
use crate::modifier;
use crate::selection::SelectionState;

/// Deepest list nesting reachable through Tab or `change_block_depth`.
pub const MAX_LIST_DEPTH: u8 = 2;

/// Entity covering the cursor, with the char range it spans in one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRange {
    pub entity_key: EntityKey,
    pub block_key: BlockKey,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl EntityRange {
    pub fn selection(&self) -> SelectionState {
        let mut selection = SelectionState::collapsed(self.block_key.clone(), self.start_offset);
        selection.focus_offset = self.end_offset;
        selection
    }
}

pub fn is_list_item(block: &ContentBlock) -> bool {
    block.block_type().is_list_item()
}

fn keep_user_selection(mut content: ContentState, state: &EditorState) -> ContentState {
    content.set_selection_before(state.selection().clone());
    content.set_selection_after(state.selection().clone());
    content
}

pub fn change_block_type(
    state: &EditorState,
    block_key: &BlockKey,
    block_type: BlockType,
) -> EditorState {
    let content = state.current_content();
    let Some(block) = content.block_for_key(block_key) else {
        return state.clone();
    };
    if block.block_type() == block_type {
        return state.clone();
    }
    let target = SelectionState::collapsed(block_key.clone(), 0);
    let next = modifier::set_block_type(content, &target, block_type);
    state.push(keep_user_selection(next, state), ChangeType::ChangeBlockType)
}

/// Sets the block's depth. Depths outside `0..=MAX_LIST_DEPTH` are ignored.
pub fn change_block_depth(
    state: &EditorState,
    block_key: &BlockKey,
    new_depth: i32,
) -> EditorState {
    if !(0..=i32::from(MAX_LIST_DEPTH)).contains(&new_depth) {
        return state.clone();
    }
    let content = state.current_content();
    let Some(block) = content.block_for_key(block_key) else {
        return state.clone();
    };
    let adjustment = new_depth - i32::from(block.depth());
    if adjustment == 0 {
        return state.clone();
    }
    let target = SelectionState::collapsed(block_key.clone(), 0);
    let next = modifier::adjust_block_depth(content, &target, adjustment, MAX_LIST_DEPTH);
    state.push(keep_user_selection(next, state), ChangeType::AdjustDepth)
}

/// Adds an empty `block_type` block right after `block_key` and moves the
/// caret into it.
pub fn insert_block_after(
    state: &EditorState,
    block_key: &BlockKey,
    block_type: BlockType,
) -> EditorState {
    let content = state.current_content();
    let Some(index) = content.block_index(block_key) else {
        return state.clone();
    };
    let next = modifier::insert_block_at(content, state.selection(), index, block_type);
    state.push(next, ChangeType::SplitBlock)
}

pub fn get_entity_at_cursor(state: &EditorState) -> Option<EntityRange> {
    let selection = state.selection();
    let start_key = selection.start_key();
    let block = state.current_content().block_for_key(start_key)?;
    let start_offset = selection.start_offset();

    if selection.is_collapsed() {
        return entity_at_offset(block, start_offset.saturating_sub(1));
    }
    if start_key != selection.end_key() {
        return None;
    }

    let end_offset = selection.end_offset();
    let entity_key = block.entity_at(start_offset)?;
    if (start_offset..end_offset).any(|offset| block.entity_at(offset) != Some(entity_key)) {
        return None;
    }
    Some(EntityRange {
        entity_key: entity_key.clone(),
        block_key: block.key().clone(),
        start_offset,
        end_offset,
    })
}

fn entity_at_offset(block: &ContentBlock, offset: usize) -> Option<EntityRange> {
    let entity_key = block.entity_at(offset)?;
    let mut start_offset = offset;
    while start_offset > 0 && block.entity_at(start_offset - 1) == Some(entity_key) {
        start_offset -= 1;
    }
    let mut end_offset = offset + 1;
    while end_offset < block.len() && block.entity_at(end_offset) == Some(entity_key) {
        end_offset += 1;
    }
    Some(EntityRange {
        entity_key: entity_key.clone(),
        block_key: block.key().clone(),
        start_offset,
        end_offset,
    })
}

/// Detaches entities from `start_offset..end_offset` of one block. Text is
/// left in place.
pub fn clear_entity_for_range(
    state: &EditorState,
    block_key: &BlockKey,
    start_offset: usize,
    end_offset: usize,
) -> EditorState {
    let content = state.current_content();
    if content.block_for_key(block_key).is_none() || start_offset >= end_offset {
        return state.clone();
    }
    let range = content.select(block_key, start_offset, block_key, end_offset);
    let next = modifier::apply_entity(content, &range, None);
    state.push(keep_user_selection(next, state), ChangeType::ApplyEntity)
}
