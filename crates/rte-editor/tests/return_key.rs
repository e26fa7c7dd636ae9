mod support;

use proptest::prelude::*;
use rte_core::{BlockType, ContentBlock};
use rte_editor::{Key, KeyEvent, KeyOutcome, Modifiers, ToolbarConfig};

use support::{select, shell_at, shell_for, state_at};

fn enter() -> KeyEvent {
    KeyEvent::plain(Key::Enter)
}

fn shift_enter() -> KeyEvent {
    KeyEvent::new(Key::Enter, Modifiers::SHIFT)
}

#[test]
fn shift_return_inserts_soft_newline_at_caret() {
    let (mut shell, changes) = shell_at(
        vec![ContentBlock::new("a", BlockType::Unstyled, "ab")],
        "a",
        1,
    );
    assert!(shell.handle_return(&shift_enter()));

    let content = shell.value().current_content();
    assert_eq!(content.blocks().len(), 1);
    assert_eq!(content.first_block().text(), "a\nb");
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn soft_newline_replaces_a_range() {
    let state = select(
        &state_at(
            vec![
                ContentBlock::new("a", BlockType::Unstyled, "hello"),
                ContentBlock::new("b", BlockType::Unstyled, "world"),
            ],
            "a",
            0,
        ),
        ("a", 2),
        ("b", 3),
    );
    let (mut shell, _) = shell_for(state, ToolbarConfig::default());
    let before = shell.value().current_content().text_len();

    assert_eq!(shell.handle_key(&shift_enter()), KeyOutcome::Handled);

    let content = shell.value().current_content();
    assert_eq!(content.plain_text(), "he\nld");
    assert_eq!(content.text_len(), before - 7 + 1);
}

#[test]
fn return_in_empty_top_level_list_item_ends_the_list() {
    let (mut shell, changes) = shell_at(
        vec![
            ContentBlock::new("a", BlockType::OrderedListItem, "one"),
            ContentBlock::new("b", BlockType::OrderedListItem, ""),
        ],
        "b",
        0,
    );
    assert!(shell.handle_return(&enter()));

    let block = &shell.value().current_content().blocks()[1];
    assert_eq!(block.block_type(), BlockType::Unstyled);
    assert_eq!(block.depth(), 0);
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn return_in_empty_nested_list_item_outdents() {
    let (mut shell, _) = shell_at(
        vec![
            ContentBlock::new("a", BlockType::UnorderedListItem, "one"),
            ContentBlock::new("b", BlockType::UnorderedListItem, "").with_depth(1),
        ],
        "b",
        0,
    );
    assert!(shell.handle_return(&enter()));

    let block = &shell.value().current_content().blocks()[1];
    assert_eq!(block.block_type(), BlockType::UnorderedListItem);
    assert_eq!(block.depth(), 0);
}

#[test]
fn return_at_end_of_blockquote_starts_a_paragraph() {
    let (mut shell, _) = shell_at(
        vec![
            ContentBlock::new("a", BlockType::Blockquote, "quote"),
            ContentBlock::new("b", BlockType::Unstyled, "after"),
        ],
        "a",
        5,
    );
    assert_eq!(shell.handle_key(&enter()), KeyOutcome::Handled);

    let state = shell.editor_state();
    let blocks = state.current_content().blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].block_type(), BlockType::Blockquote);
    assert_eq!(blocks[1].block_type(), BlockType::Unstyled);
    assert!(blocks[1].is_empty());
    assert_eq!(blocks[2].text(), "after");

    let selection = state.selection();
    assert!(selection.is_collapsed());
    assert_eq!(&selection.anchor_key, blocks[1].key());
    assert_eq!(selection.anchor_offset, 0);
}

#[test]
fn return_at_end_of_paragraph_falls_through() {
    let (mut shell, changes) = shell_at(
        vec![ContentBlock::new("a", BlockType::Unstyled, "text")],
        "a",
        4,
    );
    assert!(!shell.handle_return(&enter()));
    assert!(changes.borrow().is_empty());

    // The default binding still splits the block.
    assert_eq!(shell.handle_key(&enter()), KeyOutcome::Handled);
    assert_eq!(shell.value().current_content().blocks().len(), 2);
}

#[test]
fn return_inside_heading_is_not_special() {
    let (mut shell, changes) = shell_at(
        vec![ContentBlock::new("a", BlockType::HeaderOne, "Title")],
        "a",
        2,
    );
    assert!(!shell.handle_return(&enter()));
    assert!(changes.borrow().is_empty());
}

#[test]
fn return_with_range_in_empty_looking_list_is_not_special() {
    let state = select(
        &state_at(
            vec![
                ContentBlock::new("a", BlockType::UnorderedListItem, ""),
                ContentBlock::new("b", BlockType::HeaderTwo, "end"),
            ],
            "a",
            0,
        ),
        ("a", 0),
        ("b", 3),
    );
    let (mut shell, _) = shell_for(state, ToolbarConfig::default());
    assert!(!shell.handle_return(&enter()));
}

proptest! {
    #[test]
    fn return_in_empty_list_item_steps_out_one_level(
        depth in 0u8..=2,
        ordered in any::<bool>(),
    ) {
        let block_type = if ordered {
            BlockType::OrderedListItem
        } else {
            BlockType::UnorderedListItem
        };
        let (mut shell, _) = shell_at(
            vec![ContentBlock::new("a", block_type, "").with_depth(depth)],
            "a",
            0,
        );
        prop_assert!(shell.handle_return(&enter()));

        let block = shell.value().current_content().first_block();
        if depth == 0 {
            prop_assert_eq!(block.block_type(), BlockType::Unstyled);
            prop_assert_eq!(block.depth(), 0);
        } else {
            prop_assert_eq!(block.block_type(), block_type);
            prop_assert_eq!(block.depth(), depth - 1);
        }
    }
}
