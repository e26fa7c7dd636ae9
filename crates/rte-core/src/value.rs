use std::collections::BTreeMap;

use crate::content::ContentState;
use crate::editor_state::EditorState;
use crate::markup::{self, MarkupError, MarkupFormat};

/// Editor state paired with cached markup renderings of its content.
#[derive(Debug, Clone, Default)]
pub struct EditorValue {
    state: EditorState,
    cache: BTreeMap<MarkupFormat, String>,
}

impl EditorValue {
    pub fn create_empty() -> Self {
        Self::default()
    }

    pub fn create_from_state(state: EditorState) -> Self {
        Self {
            state,
            cache: BTreeMap::new(),
        }
    }

    /// Parses `text`. The source is returned verbatim by `to_markup` for the
    /// same format until the content changes.
    pub fn from_markup(text: &str, format: MarkupFormat) -> Result<Self, MarkupError> {
        let content = markup::from_markup(text, format)?;
        let mut cache = BTreeMap::new();
        cache.insert(format, text.to_string());
        Ok(Self {
            state: EditorState::create_with_content(content),
            cache,
        })
    }

    pub fn editor_state(&self) -> &EditorState {
        &self.state
    }

    pub fn current_content(&self) -> &ContentState {
        self.state.current_content()
    }

    pub fn set_editor_state(&self, state: EditorState) -> EditorValue {
        if state == self.state {
            return self.clone();
        }
        let cache = if state
            .current_content()
            .same_document(self.state.current_content())
        {
            self.cache.clone()
        } else {
            BTreeMap::new()
        };
        Self { state, cache }
    }

    pub fn to_markup(&self, format: MarkupFormat) -> Result<String, MarkupError> {
        if let Some(cached) = self.cache.get(&format) {
            return Ok(cached.clone());
        }
        markup::to_markup(self.state.current_content(), format)
    }
}
