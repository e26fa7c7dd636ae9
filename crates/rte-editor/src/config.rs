use std::borrow::Cow;

use rte_core::{BlockType, MarkupFormat};
use serde::{Deserialize, Serialize};

/// A toolbar control: an inline style name or a block type name plus the
/// label shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarButtonSpec {
    pub id: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub style: Cow<'static, str>,
}

impl ToolbarButtonSpec {
    pub const fn new(id: &'static str, label: &'static str, style: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            label: Cow::Borrowed(label),
            style: Cow::Borrowed(style),
        }
    }

    /// The block type named by `style`, if it is one.
    pub fn block_type(&self) -> Option<BlockType> {
        self.style.parse().ok()
    }
}

pub const INLINE_STYLE_BUTTONS: [ToolbarButtonSpec; 4] = [
    ToolbarButtonSpec::new("bold", "Bold", rte_core::BOLD),
    ToolbarButtonSpec::new("italic", "Italic", rte_core::ITALIC),
    ToolbarButtonSpec::new("strike", "Strikethrough", rte_core::STRIKETHROUGH),
    ToolbarButtonSpec::new("mono", "Monospace", rte_core::CODE),
];

pub const BLOCK_TYPE_BUTTONS: [ToolbarButtonSpec; 3] = [
    ToolbarButtonSpec::new("ul", "UL", "unordered-list-item"),
    ToolbarButtonSpec::new("ol", "OL", "ordered-list-item"),
    ToolbarButtonSpec::new("block", "Blockquote", "blockquote"),
];

pub const BLOCK_TYPE_DROPDOWN: [ToolbarButtonSpec; 5] = [
    ToolbarButtonSpec::new("normal", "Normal", "unstyled"),
    ToolbarButtonSpec::new("large", "Heading Large", "header-one"),
    ToolbarButtonSpec::new("medium", "Heading Medium", "header-two"),
    ToolbarButtonSpec::new("small", "Heading Small", "header-three"),
    ToolbarButtonSpec::new("code", "Code Block", "code-block"),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid toolbar config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSourceOptions {
    pub enabled: bool,
    pub format: MarkupFormat,
}

impl Default for ViewSourceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            format: MarkupFormat::Html,
        }
    }
}

/// Which toolbar controls are offered. Defaults show every built-in control.
///
/// The id lists whitelist entries of the built-in tables; the `additional_*`
/// specs are appended as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    pub inline_style_buttons: Vec<String>,
    pub additional_inline_style_buttons: Vec<ToolbarButtonSpec>,
    pub block_type_buttons: Vec<String>,
    pub additional_block_type_buttons: Vec<ToolbarButtonSpec>,
    pub block_type_dropdown: Vec<String>,
    pub additional_block_type_dropdown: Vec<ToolbarButtonSpec>,
    pub show_link_buttons: bool,
    pub show_undo_redo: bool,
    pub view_source: Option<ViewSourceOptions>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        fn ids(specs: &[ToolbarButtonSpec]) -> Vec<String> {
            specs.iter().map(|spec| spec.id.to_string()).collect()
        }

        Self {
            inline_style_buttons: ids(&INLINE_STYLE_BUTTONS),
            additional_inline_style_buttons: Vec::new(),
            block_type_buttons: ids(&BLOCK_TYPE_BUTTONS),
            additional_block_type_buttons: Vec::new(),
            block_type_dropdown: ids(&BLOCK_TYPE_DROPDOWN),
            additional_block_type_dropdown: Vec::new(),
            show_link_buttons: true,
            show_undo_redo: true,
            view_source: None,
        }
    }
}

impl ToolbarConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn inline_style_buttons(&self) -> Vec<ToolbarButtonSpec> {
        allowed(
            &INLINE_STYLE_BUTTONS,
            &self.inline_style_buttons,
            &self.additional_inline_style_buttons,
        )
    }

    pub fn block_type_buttons(&self) -> Vec<ToolbarButtonSpec> {
        allowed(
            &BLOCK_TYPE_BUTTONS,
            &self.block_type_buttons,
            &self.additional_block_type_buttons,
        )
    }

    pub fn block_type_dropdown(&self) -> Vec<ToolbarButtonSpec> {
        allowed(
            &BLOCK_TYPE_DROPDOWN,
            &self.block_type_dropdown,
            &self.additional_block_type_dropdown,
        )
    }

    pub fn view_source_format(&self) -> Option<MarkupFormat> {
        self.view_source
            .filter(|options| options.enabled)
            .map(|options| options.format)
    }
}

fn allowed(
    defaults: &[ToolbarButtonSpec],
    ids: &[String],
    additional: &[ToolbarButtonSpec],
) -> Vec<ToolbarButtonSpec> {
    defaults
        .iter()
        .filter(|spec| ids.iter().any(|id| *id == spec.id))
        .chain(additional)
        .cloned()
        .collect()
}
