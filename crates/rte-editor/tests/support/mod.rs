#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rte_core::{BlockKey, ContentBlock, ContentState, EditorState, EditorValue, SelectionState};
use rte_editor::{EditorShell, EditorSurface, Platform, ToolbarConfig};

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub focus_calls: usize,
    pub scheduled: Vec<Duration>,
}

impl EditorSurface for RecordingSurface {
    fn focus(&mut self) {
        self.focus_calls += 1;
    }

    fn schedule_focus(&mut self, delay: Duration) {
        self.scheduled.push(delay);
    }
}

pub type Changes = Rc<RefCell<Vec<EditorValue>>>;

pub type Shell = EditorShell<RecordingSurface>;

pub fn state_at(blocks: Vec<ContentBlock>, key: &str, offset: usize) -> EditorState {
    EditorState::create_with_content(ContentState::from_blocks(blocks))
        .force_selection(SelectionState::collapsed(BlockKey::from(key), offset))
}

pub fn select(state: &EditorState, anchor: (&str, usize), focus: (&str, usize)) -> EditorState {
    let selection = state.current_content().select(
        &BlockKey::from(anchor.0),
        anchor.1,
        &BlockKey::from(focus.0),
        focus.1,
    );
    state.force_selection(selection)
}

pub fn shell_for(
    state: EditorState,
    config: ToolbarConfig,
) -> (Shell, Changes) {
    let changes = Changes::default();
    let sink = changes.clone();
    let shell = EditorShell::new(
        EditorValue::create_from_state(state),
        config,
        RecordingSurface::default(),
        move |value: &EditorValue| sink.borrow_mut().push(value.clone()),
    )
    .platform(Platform::Other);
    (shell, changes)
}

pub fn shell_at(
    blocks: Vec<ContentBlock>,
    key: &str,
    offset: usize,
) -> (Shell, Changes) {
    shell_for(state_at(blocks, key, offset), ToolbarConfig::default())
}
