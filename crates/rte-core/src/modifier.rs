//! Low-level content transforms. Each takes a content snapshot plus the
//! selection it applies to and returns a new snapshot whose
//! `selection_before`/`selection_after` describe the edit.
//!
//! A selection naming a block that does not exist leaves the content
//! unchanged apart from the recorded selections.

use std::ops::Range;

use crate::content::{
    BlockType, CharacterMetadata, ContentBlock, ContentState, EntityKey, InlineStyleSet,
};
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    start_ix: usize,
    start_offset: usize,
    end_ix: usize,
    end_offset: usize,
}

fn bounds(content: &ContentState, selection: &SelectionState) -> Option<Bounds> {
    let anchor_ix = content.block_index(&selection.anchor_key)?;
    let focus_ix = content.block_index(&selection.focus_key)?;
    let anchor = (anchor_ix, selection.anchor_offset);
    let focus = (focus_ix, selection.focus_offset);
    let (start, end) = if anchor <= focus {
        (anchor, focus)
    } else {
        (focus, anchor)
    };
    let blocks = content.blocks();
    Some(Bounds {
        start_ix: start.0,
        start_offset: start.1.min(blocks[start.0].len()),
        end_ix: end.0,
        end_offset: end.1.min(blocks[end.0].len()),
    })
}

/// Per-block char ranges covered by `selection`, in document order.
pub fn selected_ranges(
    content: &ContentState,
    selection: &SelectionState,
) -> Vec<(usize, Range<usize>)> {
    let Some(b) = bounds(content, selection) else {
        return Vec::new();
    };
    let blocks = content.blocks();
    (b.start_ix..=b.end_ix)
        .map(|ix| {
            let start = if ix == b.start_ix { b.start_offset } else { 0 };
            let end = if ix == b.end_ix {
                b.end_offset
            } else {
                blocks[ix].len()
            };
            (ix, start..end)
        })
        .collect()
}

fn with_selections(
    mut content: ContentState,
    before: &SelectionState,
    after: SelectionState,
) -> ContentState {
    content.set_selection_before(before.clone());
    content.set_selection_after(after);
    content
}

fn unchanged(content: &ContentState, selection: &SelectionState) -> ContentState {
    with_selections(content.clone(), selection, selection.clone())
}

pub fn remove_range(content: &ContentState, selection: &SelectionState) -> ContentState {
    let Some(b) = bounds(content, selection) else {
        return unchanged(content, selection);
    };
    let mut next = content.clone();
    let start_key = next.blocks()[b.start_ix].key().clone();
    let blocks = next.blocks_mut();

    if b.start_ix == b.end_ix {
        blocks[b.start_ix].splice(
            b.start_offset..b.end_offset,
            "",
            &CharacterMetadata::default(),
        );
    } else {
        let (tail_text, tail_chars) = blocks[b.end_ix].split_off(b.end_offset);
        let start = &mut blocks[b.start_ix];
        start.split_off(b.start_offset);
        start.append(&tail_text, &tail_chars);
        blocks.drain(b.start_ix + 1..=b.end_ix);
    }

    let after = SelectionState::collapsed(start_key, b.start_offset);
    with_selections(next, selection, after)
}

/// Replaces the selection with `text`. Newlines are kept inside the block.
pub fn insert_text(
    content: &ContentState,
    selection: &SelectionState,
    text: &str,
    style: &InlineStyleSet,
    entity: Option<&EntityKey>,
) -> ContentState {
    let removed = if selection.is_collapsed() {
        content.clone()
    } else {
        remove_range(content, selection)
    };
    let caret = if selection.is_collapsed() {
        selection.clone()
    } else {
        removed.selection_after().clone()
    };
    let Some(b) = bounds(&removed, &caret) else {
        return unchanged(content, selection);
    };

    let mut next = removed;
    let meta = CharacterMetadata {
        style: style.clone(),
        entity: entity.cloned(),
    };
    let block = &mut next.blocks_mut()[b.start_ix];
    block.splice(b.start_offset..b.start_offset, text, &meta);
    let after = SelectionState::collapsed(
        block.key().clone(),
        b.start_offset + text.chars().count(),
    );
    with_selections(next, selection, after)
}

/// Splits the caret's block in two; the new block keeps type and depth.
pub fn split_block(content: &ContentState, selection: &SelectionState) -> ContentState {
    let removed = if selection.is_collapsed() {
        content.clone()
    } else {
        remove_range(content, selection)
    };
    let caret = if selection.is_collapsed() {
        selection.clone()
    } else {
        removed.selection_after().clone()
    };
    let Some(b) = bounds(&removed, &caret) else {
        return unchanged(content, selection);
    };

    let mut next = removed;
    let key = next.mint_block_key();
    let block = &mut next.blocks_mut()[b.start_ix];
    let (text, characters) = block.split_off(b.start_offset);
    let new_block =
        ContentBlock::from_parts(key.clone(), block.block_type(), block.depth(), text, characters);
    next.blocks_mut().insert(b.start_ix + 1, new_block);
    with_selections(next, selection, SelectionState::collapsed(key, 0))
}

/// Inserts an empty block of `block_type` after the block at `index`.
pub fn insert_block_at(
    content: &ContentState,
    selection: &SelectionState,
    index: usize,
    block_type: BlockType,
) -> ContentState {
    if index >= content.blocks().len() {
        return unchanged(content, selection);
    }
    let mut next = content.clone();
    let key = next.mint_block_key();
    next.blocks_mut()
        .insert(index + 1, ContentBlock::new(key.clone(), block_type, ""));
    with_selections(next, selection, SelectionState::collapsed(key, 0))
}

pub fn set_block_type(
    content: &ContentState,
    selection: &SelectionState,
    block_type: BlockType,
) -> ContentState {
    let mut next = content.clone();
    for (ix, _) in selected_ranges(content, selection) {
        next.blocks_mut()[ix].set_block_type(block_type);
    }
    with_selections(next, selection, selection.clone())
}

/// Shifts the depth of every selected block by `adjustment`, clamped to
/// `0..=max_depth`.
pub fn adjust_block_depth(
    content: &ContentState,
    selection: &SelectionState,
    adjustment: i32,
    max_depth: u8,
) -> ContentState {
    let mut next = content.clone();
    for (ix, _) in selected_ranges(content, selection) {
        let block = &mut next.blocks_mut()[ix];
        let depth = (i32::from(block.depth()) + adjustment).clamp(0, i32::from(max_depth));
        block.set_depth(depth as u8);
    }
    with_selections(next, selection, selection.clone())
}

pub fn apply_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> ContentState {
    update_characters(content, selection, |ch| {
        ch.style.insert(style.to_string());
    })
}

pub fn remove_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> ContentState {
    update_characters(content, selection, |ch| {
        ch.style.remove(style);
    })
}

/// Sets (or with `None` clears) the entity of every selected character.
pub fn apply_entity(
    content: &ContentState,
    selection: &SelectionState,
    entity: Option<&EntityKey>,
) -> ContentState {
    update_characters(content, selection, |ch| ch.entity = entity.cloned())
}

/// Swaps the whole document for `replacement`, placing the caret at its end.
pub fn replace_document(selection: &SelectionState, replacement: ContentState) -> ContentState {
    let last = replacement.last_block();
    let after = SelectionState::collapsed(last.key().clone(), last.len());
    with_selections(replacement, selection, after)
}

fn update_characters(
    content: &ContentState,
    selection: &SelectionState,
    mut f: impl FnMut(&mut CharacterMetadata),
) -> ContentState {
    let mut next = content.clone();
    for (ix, range) in selected_ranges(content, selection) {
        next.blocks_mut()[ix].update_range(range, &mut f);
    }
    with_selections(next, selection, selection.clone())
}
