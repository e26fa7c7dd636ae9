use proptest::prelude::*;
use rte_core::rich_utils::toggle_link;
use rte_core::{
    BlockKey, BlockType, ContentBlock, ContentState, EditorState, Entity, MAX_LIST_DEPTH,
    SelectionState, change_block_depth, change_block_type, clear_entity_for_range,
    get_entity_at_cursor, insert_block_after, is_list_item,
};

fn state_with(blocks: Vec<ContentBlock>) -> EditorState {
    EditorState::create_with_content(ContentState::from_blocks(blocks))
}

fn at(state: &EditorState, key: &str, offset: usize) -> EditorState {
    state.force_selection(SelectionState::collapsed(BlockKey::from(key), offset))
}

fn select(state: &EditorState, key: &str, start: usize, end: usize) -> EditorState {
    let key = BlockKey::from(key);
    let selection = state.current_content().select(&key, start, &key, end);
    state.force_selection(selection)
}

/// "Visit example now" with "example" linked.
fn linked_state() -> EditorState {
    let state = state_with(vec![
        ContentBlock::new("a", BlockType::Unstyled, "Visit example now"),
        ContentBlock::new("b", BlockType::Unstyled, "second"),
    ]);
    let key = BlockKey::from("a");
    let range = state.current_content().select(&key, 6, &key, 13);
    toggle_link(&state, &range, Some(Entity::link("https://example.com")))
}

fn block<'a>(state: &'a EditorState, key: &str) -> &'a ContentBlock {
    let Some(block) = state.current_content().block_for_key(&BlockKey::from(key)) else {
        panic!("expected block {key}");
    };
    block
}

#[test]
fn change_block_type_retypes_one_block_and_keeps_selection() {
    let state = state_with(vec![
        ContentBlock::new("a", BlockType::Unstyled, "one"),
        ContentBlock::new("b", BlockType::Unstyled, "two"),
    ]);
    let state = at(&state, "b", 2);

    let next = change_block_type(&state, &BlockKey::from("a"), BlockType::HeaderOne);

    assert_eq!(block(&next, "a").block_type(), BlockType::HeaderOne);
    assert_eq!(block(&next, "b").block_type(), BlockType::Unstyled);
    assert_eq!(next.selection().anchor_key.as_str(), "b");
    assert_eq!(next.selection().anchor_offset, 2);
    assert!(next.can_undo());

    assert_eq!(block(&state, "a").block_type(), BlockType::Unstyled);
}

#[test]
fn change_block_type_to_same_type_returns_input() {
    let state = state_with(vec![ContentBlock::new("a", BlockType::Blockquote, "q")]);
    let next = change_block_type(&state, &BlockKey::from("a"), BlockType::Blockquote);
    assert_eq!(next, state);

    let missing = change_block_type(&state, &BlockKey::from("zz"), BlockType::HeaderTwo);
    assert_eq!(missing, state);
}

#[test]
fn change_block_depth_ignores_out_of_range_depths() {
    let state = state_with(vec![ContentBlock::new(
        "a",
        BlockType::UnorderedListItem,
        "item",
    )]);
    let key = BlockKey::from("a");

    assert_eq!(change_block_depth(&state, &key, -1), state);
    assert_eq!(
        change_block_depth(&state, &key, i32::from(MAX_LIST_DEPTH) + 1),
        state
    );

    let deeper = change_block_depth(&state, &key, 2);
    assert_eq!(block(&deeper, "a").depth(), 2);
    assert_eq!(block(&deeper, "a").block_type(), BlockType::UnorderedListItem);
    assert_eq!(block(&deeper, "a").text(), "item");
}

proptest! {
    #[test]
    fn change_block_depth_walks_down_to_zero_then_stops(
        ordered in any::<bool>(),
        text in "[a-z ]{0,12}",
    ) {
        let block_type = if ordered {
            BlockType::OrderedListItem
        } else {
            BlockType::UnorderedListItem
        };
        let state = state_with(vec![
            ContentBlock::new("a", block_type, &text).with_depth(MAX_LIST_DEPTH),
        ]);
        let key = BlockKey::from("a");

        let mut current = state;
        let mut depth = i32::from(MAX_LIST_DEPTH);
        while depth > 0 {
            current = change_block_depth(&current, &key, depth - 1);
            depth -= 1;
            prop_assert_eq!(i32::from(block(&current, "a").depth()), depth);
        }

        let stuck = change_block_depth(&current, &key, depth - 1);
        prop_assert_eq!(block(&stuck, "a").depth(), 0);
        prop_assert_eq!(&stuck, &current);
    }
}

#[test]
fn insert_block_after_moves_caret_into_new_block() {
    let state = state_with(vec![
        ContentBlock::new("a", BlockType::Blockquote, "quote"),
        ContentBlock::new("b", BlockType::Unstyled, "tail"),
    ]);
    let state = at(&state, "a", 5);

    let next = insert_block_after(&state, &BlockKey::from("a"), BlockType::Unstyled);
    let blocks = next.current_content().blocks();

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].key().as_str(), "a");
    assert_eq!(blocks[1].block_type(), BlockType::Unstyled);
    assert!(blocks[1].is_empty());
    assert_eq!(blocks[2].key().as_str(), "b");

    let selection = next.selection();
    assert!(selection.is_collapsed());
    assert_eq!(&selection.anchor_key, blocks[1].key());
    assert_eq!(selection.anchor_offset, 0);
}

#[test]
fn is_list_item_matches_only_list_types() {
    for block_type in BlockType::ALL {
        let block = ContentBlock::new("x", block_type, "");
        let expected = matches!(
            block_type,
            BlockType::UnorderedListItem | BlockType::OrderedListItem
        );
        assert_eq!(is_list_item(&block), expected, "{block_type}");
    }
}

#[test]
fn entity_at_cursor_expands_to_whole_entity() {
    let state = linked_state();

    let inside = get_entity_at_cursor(&at(&state, "a", 9)).expect("entity at caret");
    assert_eq!(inside.block_key.as_str(), "a");
    assert_eq!((inside.start_offset, inside.end_offset), (6, 13));

    // caret right after the last linked char
    let after = get_entity_at_cursor(&at(&state, "a", 13)).expect("entity before caret");
    assert_eq!((after.start_offset, after.end_offset), (6, 13));

    assert!(get_entity_at_cursor(&at(&state, "a", 6)).is_none());
    assert!(get_entity_at_cursor(&at(&state, "a", 0)).is_none());
}

#[test]
fn entity_at_cursor_for_ranges() {
    let state = linked_state();

    let range = get_entity_at_cursor(&select(&state, "a", 7, 10)).expect("range in entity");
    assert_eq!((range.start_offset, range.end_offset), (7, 10));

    assert!(get_entity_at_cursor(&select(&state, "a", 4, 10)).is_none());

    let key_a = BlockKey::from("a");
    let key_b = BlockKey::from("b");
    let across = state.current_content().select(&key_a, 7, &key_b, 2);
    assert!(get_entity_at_cursor(&state.force_selection(across)).is_none());
}

#[test]
fn clear_entity_for_range_keeps_text() {
    let state = at(&linked_state(), "a", 9);
    let range = get_entity_at_cursor(&state).expect("entity at caret");

    let next = clear_entity_for_range(
        &state,
        &range.block_key,
        range.start_offset,
        range.end_offset,
    );

    assert_eq!(block(&next, "a").text(), "Visit example now");
    assert!((0..17).all(|offset| block(&next, "a").entity_at(offset).is_none()));
    assert!(get_entity_at_cursor(&next).is_none());
    assert_eq!(next.selection().anchor_offset, 9);

    let undone = next.undo();
    assert!(get_entity_at_cursor(&undone).is_some());
}

#[test]
fn clear_entity_for_range_limits_to_given_chars() {
    let state = linked_state();
    let next = clear_entity_for_range(&state, &BlockKey::from("a"), 6, 8);
    let a = block(&next, "a");
    assert!(a.entity_at(7).is_none());
    assert!(a.entity_at(8).is_some());
    assert!(a.entity_at(12).is_some());
}
