mod support;

use rte_core::{BOLD, BlockType, ContentBlock, EditorCommand};
use rte_editor::{
    Key, KeyContext, KeyEvent, KeyInterceptor, KeyInterceptors, KeyOutcome, LinkShortcut,
    Modifiers, Platform, ToolbarConfig, default_key_binding, is_soft_newline_event,
};

use support::{select, shell_at, shell_for, state_at};

#[test]
fn command_modifier_depends_on_platform() {
    let mac_bold = KeyEvent::char('b', Modifiers::META);
    let ctrl_bold = KeyEvent::char('b', Modifiers::CTRL);

    assert_eq!(
        default_key_binding(&mac_bold, Platform::Mac),
        Some(EditorCommand::Bold)
    );
    assert_eq!(default_key_binding(&ctrl_bold, Platform::Mac), None);
    assert_eq!(
        default_key_binding(&ctrl_bold, Platform::Other),
        Some(EditorCommand::Bold)
    );

    let alt_gr = KeyEvent::char('b', Modifiers::CTRL | Modifiers::ALT);
    assert_eq!(default_key_binding(&alt_gr, Platform::Other), None);
}

#[test]
fn default_bindings_cover_formatting_and_history() {
    let cmd = Modifiers::CTRL;
    let cases = [
        (KeyEvent::char('i', cmd), Some(EditorCommand::Italic)),
        (KeyEvent::char('u', cmd), Some(EditorCommand::Underline)),
        (KeyEvent::char('j', cmd), Some(EditorCommand::Code)),
        (
            KeyEvent::char('X', cmd | Modifiers::SHIFT),
            Some(EditorCommand::Strikethrough),
        ),
        (KeyEvent::char('z', cmd), Some(EditorCommand::Undo)),
        (
            KeyEvent::char('Z', cmd | Modifiers::SHIFT),
            Some(EditorCommand::Redo),
        ),
        (KeyEvent::char('y', cmd), Some(EditorCommand::Redo)),
        (KeyEvent::char('x', cmd), None),
        (KeyEvent::char('b', Modifiers::NONE), None),
        (KeyEvent::plain(Key::Enter), Some(EditorCommand::SplitBlock)),
        (KeyEvent::plain(Key::Backspace), Some(EditorCommand::Backspace)),
        (KeyEvent::plain(Key::Delete), Some(EditorCommand::Delete)),
        (KeyEvent::plain(Key::Tab), None),
        (KeyEvent::plain(Key::Escape), None),
    ];
    for (event, expected) in cases {
        assert_eq!(
            default_key_binding(&event, Platform::Other),
            expected,
            "{event:?}"
        );
    }

    assert_eq!(
        default_key_binding(&KeyEvent::char('y', Modifiers::META), Platform::Mac),
        None
    );
}

#[test]
fn soft_newline_modifiers() {
    assert!(!is_soft_newline_event(&KeyEvent::plain(Key::Enter)));
    for modifiers in [Modifiers::SHIFT, Modifiers::ALT, Modifiers::CTRL] {
        assert!(is_soft_newline_event(&KeyEvent::new(Key::Enter, modifiers)));
    }
    assert!(!is_soft_newline_event(&KeyEvent::new(Key::Enter, Modifiers::META)));
    assert!(!is_soft_newline_event(&KeyEvent::char('a', Modifiers::SHIFT)));
}

#[test]
fn cmd_k_is_claimed_and_opens_link_input() {
    let (mut shell, changes) = shell_at(
        vec![ContentBlock::new("a", BlockType::Unstyled, "text")],
        "a",
        0,
    );
    let outcome = shell.handle_key(&KeyEvent::char('k', Modifiers::CTRL));

    assert_eq!(outcome, KeyOutcome::Claimed("link-shortcut"));
    assert!(shell.toolbar().link_popover().is_shown());
    assert!(changes.borrow().is_empty());
}

#[test]
fn cmd_k_passes_through_without_link_buttons() {
    let config = ToolbarConfig {
        show_link_buttons: false,
        ..ToolbarConfig::default()
    };
    let (mut shell, _) = shell_for(
        state_at(vec![ContentBlock::new("a", BlockType::Unstyled, "x")], "a", 0),
        config,
    );
    let outcome = shell.handle_key(&KeyEvent::char('k', Modifiers::CTRL));

    assert_eq!(outcome, KeyOutcome::NotHandled);
    assert!(!shell.toolbar().link_popover().is_shown());
}

#[test]
fn command_keys_reach_the_document() {
    let state = select(
        &state_at(vec![ContentBlock::new("a", BlockType::Unstyled, "hello")], "a", 0),
        ("a", 0),
        ("a", 5),
    );
    let (mut shell, changes) = shell_for(state, ToolbarConfig::default());

    assert_eq!(
        shell.handle_key(&KeyEvent::char('b', Modifiers::CTRL)),
        KeyOutcome::Handled
    );
    assert!(shell.value().current_content().first_block().style_at(0).contains(BOLD));
    assert_eq!(changes.borrow().len(), 1);

    assert_eq!(
        shell.handle_key(&KeyEvent::char('q', Modifiers::NONE)),
        KeyOutcome::NotHandled
    );
}

struct ClaimAll;

impl KeyInterceptor for ClaimAll {
    fn id(&self) -> &'static str {
        "claim-all"
    }

    fn intercept(&mut self, _event: &KeyEvent, _cx: &mut KeyContext<'_>) -> bool {
        true
    }
}

#[derive(Default)]
struct CountTabs {
    seen: usize,
}

impl KeyInterceptor for CountTabs {
    fn id(&self) -> &'static str {
        "count-tabs"
    }

    fn intercept(&mut self, event: &KeyEvent, _cx: &mut KeyContext<'_>) -> bool {
        if event.key == Key::Tab {
            self.seen += 1;
            return self.seen > 1;
        }
        false
    }
}

#[test]
fn interceptors_run_in_registration_order() {
    let chain = KeyInterceptors::new().with(ClaimAll).with(LinkShortcut);
    assert_eq!(chain.ids(), vec!["claim-all", "link-shortcut"]);

    let (shell, changes) = shell_at(
        vec![ContentBlock::new("a", BlockType::Unstyled, "hello")],
        "a",
        0,
    );
    let mut shell = shell.interceptors(chain);

    let outcome = shell.handle_key(&KeyEvent::char('k', Modifiers::CTRL));
    assert_eq!(outcome, KeyOutcome::Claimed("claim-all"));
    assert!(!shell.toolbar().link_popover().is_shown());

    let outcome = shell.handle_key(&KeyEvent::plain(Key::Enter));
    assert_eq!(outcome, KeyOutcome::Claimed("claim-all"));
    assert!(changes.borrow().is_empty());
}

#[test]
fn unclaimed_events_continue_down_the_chain() {
    let chain = KeyInterceptors::with_defaults().with(CountTabs::default());
    assert_eq!(chain.len(), 2);

    let (shell, _) = shell_at(
        vec![
            ContentBlock::new("a", BlockType::UnorderedListItem, "one"),
            ContentBlock::new("b", BlockType::UnorderedListItem, "item"),
        ],
        "b",
        0,
    );
    let mut shell = shell.interceptors(chain);

    let tab = KeyEvent::plain(Key::Tab);
    assert_eq!(shell.handle_key(&tab), KeyOutcome::Handled);
    assert_eq!(shell.value().current_content().blocks()[1].depth(), 1);

    assert_eq!(shell.handle_key(&tab), KeyOutcome::Claimed("count-tabs"));
    assert_eq!(shell.value().current_content().blocks()[1].depth(), 1);
}
