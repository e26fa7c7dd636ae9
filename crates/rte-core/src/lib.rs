mod commands;
mod content;
mod editor_state;
pub mod markup;
pub mod modifier;
pub mod rich_utils;
mod selection;
mod value;

pub use crate::commands::*;
pub use crate::content::*;
pub use crate::editor_state::*;
pub use crate::markup::{MarkupError, MarkupFormat};
pub use crate::rich_utils::EditorCommand;
pub use crate::selection::*;
pub use crate::value::*;
