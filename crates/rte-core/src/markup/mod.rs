//! Import and export of content in the supported markup formats.

mod builder;
mod html;
mod markdown;
mod raw;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::ContentState;

pub use self::raw::{RawBlock, RawDocument, RawEntityRange, RawInlineStyleRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupFormat {
    Raw,
    Html,
    #[serde(alias = "md")]
    Markdown,
}

impl MarkupFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkupFormat::Raw => "raw",
            MarkupFormat::Html => "html",
            MarkupFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkupFormat {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(MarkupFormat::Raw),
            "html" => Ok(MarkupFormat::Html),
            "markdown" | "md" => Ok(MarkupFormat::Markdown),
            _ => Err(MarkupError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("unknown markup format: {0}")]
    UnknownFormat(String),
    #[error("invalid raw document: {0}")]
    Raw(#[from] serde_json::Error),
    #[error("unsupported raw document schema {schema} v{version}")]
    UnsupportedSchema { schema: String, version: u32 },
    #[error("duplicate block key in raw document: {0}")]
    DuplicateBlockKey(String),
    #[error("malformed html: {0}")]
    Html(String),
    #[error("failed to write markup: {0}")]
    Write(String),
}

pub fn to_markup(content: &ContentState, format: MarkupFormat) -> Result<String, MarkupError> {
    match format {
        MarkupFormat::Raw => RawDocument::from_content(content).to_json_pretty(),
        MarkupFormat::Html => html::export(content),
        MarkupFormat::Markdown => Ok(markdown::export(content)),
    }
}

pub fn from_markup(text: &str, format: MarkupFormat) -> Result<ContentState, MarkupError> {
    let content = match format {
        MarkupFormat::Raw => RawDocument::from_json_str(text)?.into_content()?,
        MarkupFormat::Html => html::import(text)?,
        MarkupFormat::Markdown => markdown::import(text),
    };
    tracing::trace!(
        %format,
        bytes = text.len(),
        blocks = content.blocks().len(),
        "imported markup"
    );
    Ok(content)
}
