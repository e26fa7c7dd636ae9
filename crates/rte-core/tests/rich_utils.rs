use proptest::prelude::*;
use rte_core::rich_utils::{
    current_block_type, handle_key_command, insert_soft_newline, insert_text, on_tab,
    toggle_block_type, toggle_inline_style,
};
use rte_core::{
    BOLD, BlockKey, BlockType, ContentBlock, ContentState, EditorCommand, EditorState,
    ITALIC, MAX_LIST_DEPTH, SelectionState,
};

fn state_with(blocks: Vec<ContentBlock>) -> EditorState {
    EditorState::create_with_content(ContentState::from_blocks(blocks))
}

fn at(state: &EditorState, key: &str, offset: usize) -> EditorState {
    state.force_selection(SelectionState::collapsed(BlockKey::from(key), offset))
}

fn range(state: &EditorState, anchor: (&str, usize), focus: (&str, usize)) -> EditorState {
    let selection = state.current_content().select(
        &BlockKey::from(anchor.0),
        anchor.1,
        &BlockKey::from(focus.0),
        focus.1,
    );
    state.force_selection(selection)
}

#[test]
fn toggle_inline_style_on_range_applies_then_removes() {
    let state = state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "hello world")]);
    let selected = range(&state, ("a", 0), ("a", 5));

    let bold = toggle_inline_style(&selected, BOLD);
    let block = bold.current_content().first_block();
    assert!(block.style_at(0).contains(BOLD));
    assert!(block.style_at(4).contains(BOLD));
    assert!(!block.style_at(5).contains(BOLD));
    assert!(bold.current_inline_style().contains(BOLD));

    let plain = toggle_inline_style(&bold, BOLD);
    assert!(
        plain
            .current_content()
            .first_block()
            .characters()
            .iter()
            .all(|ch| ch.style.is_empty())
    );
}

#[test]
fn toggle_inline_style_at_caret_styles_next_typed_text() {
    let state = at(
        &state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "ab")]),
        "a",
        2,
    );
    let pending = toggle_inline_style(&state, ITALIC);
    assert!(pending.inline_style_override().is_some_and(|s| s.contains(ITALIC)));
    assert!(!pending.can_undo());

    let typed = insert_text(&pending, "c");
    let block = typed.current_content().first_block();
    assert_eq!(block.text(), "abc");
    assert!(block.style_at(2).contains(ITALIC));
    assert!(!block.style_at(1).contains(ITALIC));
    assert!(typed.inline_style_override().is_none());
}

#[test]
fn toggle_block_type_switches_back_to_unstyled() {
    let state = state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "title")]);
    let heading = toggle_block_type(&state, BlockType::HeaderTwo);
    assert_eq!(current_block_type(&heading), BlockType::HeaderTwo);

    let back = toggle_block_type(&heading, BlockType::HeaderTwo);
    assert_eq!(current_block_type(&back), BlockType::Unstyled);
}

#[test]
fn tab_indents_list_items_up_to_max_depth() {
    let state = at(
        &state_with(vec![
            ContentBlock::new("a", BlockType::UnorderedListItem, "one"),
            ContentBlock::new("b", BlockType::UnorderedListItem, "two").with_depth(1),
            ContentBlock::new("c", BlockType::UnorderedListItem, "x"),
        ]),
        "c",
        1,
    );
    let depth_of_c = |state: &EditorState| state.current_content().blocks()[2].depth();
    let once = on_tab(&state, false, MAX_LIST_DEPTH);
    let twice = on_tab(&once, false, MAX_LIST_DEPTH);
    let thrice = on_tab(&twice, false, MAX_LIST_DEPTH);

    assert_eq!(depth_of_c(&once), 1);
    assert_eq!(depth_of_c(&twice), 2);
    assert_eq!(thrice, twice);

    let out = on_tab(&twice, true, MAX_LIST_DEPTH);
    assert_eq!(depth_of_c(&out), 1);
}

#[test]
fn tab_never_indents_past_the_item_above() {
    let state = at(
        &state_with(vec![
            ContentBlock::new("a", BlockType::OrderedListItem, "one"),
            ContentBlock::new("b", BlockType::OrderedListItem, "two"),
        ]),
        "b",
        0,
    );
    let once = on_tab(&state, false, MAX_LIST_DEPTH);
    assert_eq!(once.current_content().blocks()[1].depth(), 1);
    assert_eq!(on_tab(&once, false, MAX_LIST_DEPTH), once);

    let first = at(&state, "a", 0);
    assert_eq!(on_tab(&first, false, MAX_LIST_DEPTH), first);
}

#[test]
fn tab_below_a_paragraph_is_ignored() {
    let state = at(
        &state_with(vec![
            ContentBlock::new("a", BlockType::Unstyled, "intro"),
            ContentBlock::new("b", BlockType::UnorderedListItem, "item"),
        ]),
        "b",
        0,
    );
    assert_eq!(on_tab(&state, false, MAX_LIST_DEPTH), state);
}

#[test]
fn tab_outside_list_items_is_ignored() {
    let state = at(
        &state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "x")]),
        "a",
        0,
    );
    assert_eq!(on_tab(&state, false, MAX_LIST_DEPTH), state);

    let top = at(
        &state_with(vec![ContentBlock::new("a", BlockType::OrderedListItem, "x")]),
        "a",
        0,
    );
    assert_eq!(on_tab(&top, true, MAX_LIST_DEPTH), top);
}

#[test]
fn backspace_at_start_of_styled_block_resets_type() {
    let state = at(
        &state_with(vec![
            ContentBlock::new("a", BlockType::Unstyled, "one"),
            ContentBlock::new("b", BlockType::Blockquote, "two"),
        ]),
        "b",
        0,
    );
    let next = handle_key_command(&state, EditorCommand::Backspace).expect("handled");
    let blocks = next.current_content().blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].block_type(), BlockType::Unstyled);

    let merged = handle_key_command(&next, EditorCommand::Backspace).expect("handled");
    assert_eq!(merged.current_content().plain_text(), "onetwo");
    assert_eq!(merged.selection().anchor_offset, 3);
}

#[test]
fn backspace_in_code_block_after_code_merges() {
    let state = at(
        &state_with(vec![
            ContentBlock::new("a", BlockType::CodeBlock, "let a;"),
            ContentBlock::new("b", BlockType::CodeBlock, "let b;"),
        ]),
        "b",
        0,
    );
    let next = handle_key_command(&state, EditorCommand::Backspace).expect("handled");
    let blocks = next.current_content().blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text(), "let a;let b;");
    assert_eq!(blocks[0].block_type(), BlockType::CodeBlock);
}

#[test]
fn backspace_and_delete_at_document_edges_are_unhandled() {
    let state = at(
        &state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "ab")]),
        "a",
        0,
    );
    assert!(handle_key_command(&state, EditorCommand::Backspace).is_none());

    let end = at(&state, "a", 2);
    assert!(handle_key_command(&end, EditorCommand::Delete).is_none());

    let deleted = handle_key_command(&state, EditorCommand::Delete).expect("handled");
    assert_eq!(deleted.current_content().plain_text(), "b");
}

#[test]
fn delete_removes_selected_range_across_blocks() {
    let state = state_with(vec![
        ContentBlock::new("a", BlockType::Unstyled, "hello"),
        ContentBlock::new("b", BlockType::Unstyled, "big"),
        ContentBlock::new("c", BlockType::Unstyled, "world"),
    ]);
    let selected = range(&state, ("c", 2), ("a", 3));
    assert!(selected.selection().is_backward);

    let next = handle_key_command(&selected, EditorCommand::Delete).expect("handled");
    assert_eq!(next.current_content().plain_text(), "helrld");
    assert_eq!(next.selection().anchor_key.as_str(), "a");
    assert_eq!(next.selection().anchor_offset, 3);
}

#[test]
fn undo_command_without_history_is_unhandled() {
    let state = state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "x")]);
    assert!(handle_key_command(&state, EditorCommand::Undo).is_none());
    assert!(handle_key_command(&state, EditorCommand::Redo).is_none());
}

#[test]
fn soft_newline_keeps_text_in_one_block() {
    let state = at(
        &state_with(vec![ContentBlock::new("a", BlockType::Unstyled, "ab")]),
        "a",
        1,
    );
    let next = insert_soft_newline(&state);
    let blocks = next.current_content().blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text(), "a\nb");
    assert_eq!(next.selection().anchor_offset, 2);
}

#[test]
fn soft_newline_over_range_takes_style_at_range_start() {
    let state = state_with(vec![
        ContentBlock::new("a", BlockType::Unstyled, "abcd")
            .with_metadata(2..4, rte_core::CharacterMetadata::styled([BOLD])),
    ]);
    let selected = range(&state, ("a", 1), ("a", 2));
    let next = insert_soft_newline(&selected);
    let block = next.current_content().first_block();
    assert_eq!(block.text(), "a\ncd");
    assert!(block.style_at(1).contains(BOLD));
}

proptest! {
    #[test]
    fn soft_newline_at_caret_adds_one_char(
        text in "[a-z]{0,16}",
        caret in 0usize..=16,
    ) {
        let caret = caret.min(text.len());
        let state = at(
            &state_with(vec![ContentBlock::new("a", BlockType::Unstyled, &text)]),
            "a",
            caret,
        );
        let before = state.current_content().text_len();
        let next = insert_soft_newline(&state);
        prop_assert_eq!(next.current_content().text_len(), before + 1);
        prop_assert_eq!(next.current_content().blocks().len(), 1);
    }

    #[test]
    fn soft_newline_over_range_replaces_selection(
        first in "[a-z]{1,10}",
        second in "[a-z]{1,10}",
        start in 0usize..10,
        end in 0usize..10,
    ) {
        let start = start.min(first.len());
        let end = end.min(second.len());
        let state = state_with(vec![
            ContentBlock::new("a", BlockType::Unstyled, &first),
            ContentBlock::new("b", BlockType::Unstyled, &second),
        ]);
        let selected = range(&state, ("a", start), ("b", end));
        let selected_len = (first.len() - start) + 1 + end;

        let before = state.current_content().text_len();
        let next = insert_soft_newline(&selected);
        prop_assert_eq!(next.current_content().text_len(), before - selected_len + 1);
        prop_assert_eq!(next.current_content().blocks().len(), 1);
    }
}
