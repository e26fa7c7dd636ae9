use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::content::{
    BlockKey, BlockType, CharacterMetadata, ContentBlock, ContentState, Entity, EntityKey,
};
use crate::markup::MarkupError;

const DEFAULT_SCHEMA: &str = "rte";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInlineStyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub key: String,
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub depth: u8,
    #[serde(default)]
    pub inline_style_ranges: Vec<RawInlineStyleRange>,
    #[serde(default)]
    pub entity_ranges: Vec<RawEntityRange>,
}

/// Versioned JSON form of a content state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub blocks: Vec<RawBlock>,
    #[serde(default)]
    pub entity_map: BTreeMap<String, Entity>,
}

/// Maximal runs of consecutive offsets for which `hit` holds.
fn runs(len: usize, hit: impl Fn(usize) -> bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for offset in 0..=len {
        let on = offset < len && hit(offset);
        match (start, on) {
            (None, true) => start = Some(offset),
            (Some(s), false) => {
                out.push((s, offset - s));
                start = None;
            }
            _ => {}
        }
    }
    out
}

impl RawBlock {
    fn from_block(block: &ContentBlock) -> Self {
        let chars = block.characters();
        let styles: BTreeSet<&String> = chars.iter().flat_map(|ch| ch.style.iter()).collect();

        let mut inline_style_ranges: Vec<RawInlineStyleRange> = styles
            .into_iter()
            .flat_map(|style| {
                runs(chars.len(), |ix| chars[ix].style.contains(style))
                    .into_iter()
                    .map(|(offset, length)| RawInlineStyleRange {
                        offset,
                        length,
                        style: style.clone(),
                    })
            })
            .collect();
        inline_style_ranges.sort_by(|a, b| {
            (a.offset, a.length, &a.style).cmp(&(b.offset, b.length, &b.style))
        });

        let entity_ranges = block
            .inline_runs()
            .into_iter()
            .filter_map(|run| run.entity.map(|key| (key, run.start, run.end)))
            .fold(Vec::<RawEntityRange>::new(), |mut acc, (key, start, end)| {
                match acc.last_mut() {
                    Some(last)
                        if last.key == key.as_str() && last.offset + last.length == start =>
                    {
                        last.length = end - last.offset;
                    }
                    _ => acc.push(RawEntityRange {
                        offset: start,
                        length: end - start,
                        key: key.to_string(),
                    }),
                }
                acc
            });

        Self {
            key: block.key().to_string(),
            block_type: block.block_type(),
            text: block.text().to_string(),
            depth: block.depth(),
            inline_style_ranges,
            entity_ranges,
        }
    }

    fn into_block(self, entities: &BTreeMap<EntityKey, Entity>) -> ContentBlock {
        let len = self.text.chars().count();
        let mut characters = vec![CharacterMetadata::default(); len];
        for range in &self.inline_style_ranges {
            let end = (range.offset + range.length).min(len);
            for ch in characters.iter_mut().take(end).skip(range.offset) {
                ch.style.insert(range.style.clone());
            }
        }
        for range in &self.entity_ranges {
            let key = EntityKey::new(range.key.clone());
            if !entities.contains_key(&key) {
                continue;
            }
            let end = (range.offset + range.length).min(len);
            for ch in characters.iter_mut().take(end).skip(range.offset) {
                ch.entity = Some(key.clone());
            }
        }
        ContentBlock::from_parts(
            BlockKey::new(self.key),
            self.block_type,
            self.depth,
            self.text,
            characters,
        )
    }
}

impl RawDocument {
    pub fn from_content(content: &ContentState) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            blocks: content.blocks().iter().map(RawBlock::from_block).collect(),
            entity_map: content
                .entities()
                .iter()
                .map(|(key, entity)| (key.to_string(), entity.clone()))
                .collect(),
        }
    }

    pub fn into_content(self) -> Result<ContentState, MarkupError> {
        if self.schema != DEFAULT_SCHEMA || self.version != DEFAULT_VERSION {
            return Err(MarkupError::UnsupportedSchema {
                schema: self.schema,
                version: self.version,
            });
        }

        let mut seen = BTreeSet::new();
        for block in &self.blocks {
            if !seen.insert(block.key.as_str()) {
                return Err(MarkupError::DuplicateBlockKey(block.key.clone()));
            }
        }

        let entities: BTreeMap<EntityKey, Entity> = self
            .entity_map
            .into_iter()
            .map(|(key, entity)| (EntityKey::new(key), entity))
            .collect();
        let blocks = self
            .blocks
            .into_iter()
            .map(|block| block.into_block(&entities))
            .collect();
        Ok(ContentState::from_parts(blocks, entities))
    }

    pub fn to_json_pretty(&self) -> Result<String, MarkupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, MarkupError> {
        Ok(serde_json::from_str(s)?)
    }
}
