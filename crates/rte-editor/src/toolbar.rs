use rte_core::rich_utils::{current_block_type, toggle_block_type, toggle_inline_style, toggle_link};
use rte_core::{BlockType, EditorState, Entity, get_entity_at_cursor};

use crate::config::{ToolbarButtonSpec, ToolbarConfig};
use crate::popover::{CheckboxInput, FocusReturn, InputKind, Popover};

pub const LINK_PLACEHOLDER: &str = "https://www.example.org";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonState {
    pub spec: ToolbarButtonSpec,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropdownState {
    pub choices: Vec<ToolbarButtonSpec>,
    /// Style of the selected choice. Falls back to the first choice when the
    /// current block type is not offered.
    pub selected: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkControls {
    pub link_enabled: bool,
    pub remove_enabled: bool,
    pub popover_shown: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryControls {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Snapshot of every control for one editor state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolbarView {
    pub inline_styles: Vec<ButtonState>,
    pub block_types: Vec<ButtonState>,
    pub dropdown: Option<DropdownState>,
    pub link: Option<LinkControls>,
    pub history: Option<HistoryControls>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    ToggleInlineStyle(String),
    ToggleBlockType(BlockType),
    /// Dropdown pick. Same as `ToggleBlockType` but hands focus back.
    SelectBlockType(BlockType),
    ToggleLinkPopover,
    SubmitLink,
    RemoveLink,
    Undo,
    Redo,
}

#[derive(Clone, Debug)]
pub struct Toolbar {
    config: ToolbarConfig,
    link_popover: Popover,
}

impl Toolbar {
    pub fn new(config: ToolbarConfig) -> Self {
        let link_popover = Popover::new(InputKind::Text)
            .placeholder(LINK_PLACEHOLDER)
            .checkbox(CheckboxInput::new("target", "_blank"));
        Self {
            config,
            link_popover,
        }
    }

    pub fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    pub fn link_popover(&self) -> &Popover {
        &self.link_popover
    }

    pub fn link_popover_mut(&mut self) -> &mut Popover {
        &mut self.link_popover
    }

    /// Shows the link input. Returns false when link buttons are hidden.
    pub fn open_link_popover(&mut self) -> bool {
        if !self.config.show_link_buttons {
            return false;
        }
        self.link_popover.show(String::new());
        true
    }

    pub fn view(&self, state: &EditorState) -> ToolbarView {
        let current_style = state.current_inline_style();
        let block_type = current_block_type(state);
        let block_button = |spec: ToolbarButtonSpec| ButtonState {
            active: spec.block_type() == Some(block_type),
            spec,
        };

        let inline_styles = self
            .config
            .inline_style_buttons()
            .into_iter()
            .map(|spec| ButtonState {
                active: current_style.contains(spec.style.as_ref()),
                spec,
            })
            .collect();
        let block_types = self
            .config
            .block_type_buttons()
            .into_iter()
            .map(block_button)
            .collect();

        let choices = self.config.block_type_dropdown();
        let dropdown = choices.first().map(|first| {
            let selected = choices
                .iter()
                .find(|spec| spec.style == block_type.as_str())
                .unwrap_or(first)
                .style
                .to_string();
            DropdownState {
                selected,
                choices: choices.clone(),
            }
        });

        let link = self.config.show_link_buttons.then(|| {
            let on_link = cursor_on_link(state);
            LinkControls {
                link_enabled: !state.selection().is_collapsed() || on_link,
                remove_enabled: on_link,
                popover_shown: self.link_popover.is_shown(),
            }
        });
        let history = self.config.show_undo_redo.then(|| HistoryControls {
            can_undo: state.can_undo(),
            can_redo: state.can_redo(),
        });

        ToolbarView {
            inline_styles,
            block_types,
            dropdown,
            link,
            history,
        }
    }

    /// Runs one control. Each action produces at most one new state, handed
    /// to `on_change`; the return value says how the editor gets focus back.
    pub fn dispatch(
        &mut self,
        action: ToolbarAction,
        state: &EditorState,
        mut on_change: impl FnMut(EditorState),
    ) -> Option<FocusReturn> {
        tracing::debug!(?action, "toolbar action");
        match action {
            ToolbarAction::ToggleInlineStyle(style) => {
                on_change(toggle_inline_style(state, &style));
                None
            }
            ToolbarAction::ToggleBlockType(block_type) => {
                on_change(toggle_block_type(state, block_type));
                None
            }
            ToolbarAction::SelectBlockType(block_type) => {
                on_change(toggle_block_type(state, block_type));
                Some(FocusReturn::Immediate)
            }
            ToolbarAction::ToggleLinkPopover => {
                if !self.link_popover.is_shown() && !link_enabled(state) {
                    return None;
                }
                self.link_popover.toggle(String::new())
            }
            ToolbarAction::SubmitLink => {
                let (submission, focus) = self.link_popover.submit()?;
                let range = if state.selection().is_collapsed() {
                    let Some(found) = get_entity_at_cursor(state) else {
                        tracing::debug!("link submitted with nothing to link");
                        return Some(focus);
                    };
                    found.selection()
                } else {
                    state.selection().clone()
                };
                let url = submission.value.trim();
                let entity = (!url.is_empty()).then(|| {
                    submission
                        .additional
                        .into_iter()
                        .fold(Entity::link(url), |entity, (name, value)| {
                            entity.with_data(name, value)
                        })
                });
                on_change(toggle_link(state, &range, entity));
                Some(focus)
            }
            ToolbarAction::RemoveLink => {
                if let Some(found) = get_entity_at_cursor(state) {
                    on_change(rte_core::clear_entity_for_range(
                        state,
                        &found.block_key,
                        found.start_offset,
                        found.end_offset,
                    ));
                }
                None
            }
            ToolbarAction::Undo => {
                if state.can_undo() {
                    on_change(state.undo());
                }
                None
            }
            ToolbarAction::Redo => {
                if state.can_redo() {
                    on_change(state.redo());
                }
                None
            }
        }
    }
}

fn cursor_on_link(state: &EditorState) -> bool {
    get_entity_at_cursor(state).is_some_and(|found| {
        state
            .current_content()
            .entity(&found.entity_key)
            .is_some_and(Entity::is_link)
    })
}

fn link_enabled(state: &EditorState) -> bool {
    !state.selection().is_collapsed() || cursor_on_link(state)
}
