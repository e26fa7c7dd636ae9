use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::selection::SelectionState;

pub type InlineStyleSet = BTreeSet<String>;
pub type EntityData = BTreeMap<String, Value>;

pub const BOLD: &str = "BOLD";
pub const ITALIC: &str = "ITALIC";
pub const UNDERLINE: &str = "UNDERLINE";
pub const STRIKETHROUGH: &str = "STRIKETHROUGH";
pub const CODE: &str = "CODE";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockKey(String);

impl BlockKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    #[default]
    Unstyled,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    Blockquote,
    CodeBlock,
    UnorderedListItem,
    OrderedListItem,
}

impl BlockType {
    pub const ALL: [BlockType; 8] = [
        BlockType::Unstyled,
        BlockType::HeaderOne,
        BlockType::HeaderTwo,
        BlockType::HeaderThree,
        BlockType::Blockquote,
        BlockType::CodeBlock,
        BlockType::UnorderedListItem,
        BlockType::OrderedListItem,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Unstyled => "unstyled",
            BlockType::HeaderOne => "header-one",
            BlockType::HeaderTwo => "header-two",
            BlockType::HeaderThree => "header-three",
            BlockType::Blockquote => "blockquote",
            BlockType::CodeBlock => "code-block",
            BlockType::UnorderedListItem => "unordered-list-item",
            BlockType::OrderedListItem => "ordered-list-item",
        }
    }

    pub fn is_list_item(self) -> bool {
        matches!(
            self,
            BlockType::UnorderedListItem | BlockType::OrderedListItem
        )
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type: {0}")]
pub struct UnknownBlockType(pub String);

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Link,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutability {
    #[default]
    Mutable,
    Immutable,
    Segmented,
}

/// Out-of-band annotation attached to a character range, e.g. a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    #[serde(default)]
    pub mutability: Mutability,
    #[serde(default)]
    pub data: EntityData,
}

impl Entity {
    pub fn link(url: impl Into<String>) -> Self {
        let mut data = EntityData::new();
        data.insert("url".to_string(), Value::String(url.into()));
        Self {
            kind: EntityType::Link,
            mutability: Mutability::Mutable,
            data,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn is_link(&self) -> bool {
        self.kind == EntityType::Link
    }

    pub fn url(&self) -> Option<&str> {
        self.data.get("url").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterMetadata {
    pub style: InlineStyleSet,
    pub entity: Option<EntityKey>,
}

impl CharacterMetadata {
    pub fn styled<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            style: styles.into_iter().map(Into::into).collect(),
            entity: None,
        }
    }
}

/// A maximal stretch of characters sharing the same style set and entity.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRun<'a> {
    pub text: &'a str,
    pub style: &'a InlineStyleSet,
    pub entity: Option<&'a EntityKey>,
    pub start: usize,
    pub end: usize,
}

/// Paragraph-level unit of content. Offsets count chars, not bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    key: BlockKey,
    block_type: BlockType,
    depth: u8,
    text: String,
    characters: Vec<CharacterMetadata>,
}

impl ContentBlock {
    pub fn new(key: impl Into<BlockKey>, block_type: BlockType, text: &str) -> Self {
        Self {
            key: key.into(),
            block_type,
            depth: 0,
            text: text.to_string(),
            characters: vec![CharacterMetadata::default(); text.chars().count()],
        }
    }

    pub fn from_parts(
        key: BlockKey,
        block_type: BlockType,
        depth: u8,
        text: String,
        mut characters: Vec<CharacterMetadata>,
    ) -> Self {
        characters.resize(text.chars().count(), CharacterMetadata::default());
        Self {
            key,
            block_type,
            depth,
            text,
            characters,
        }
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Applies `meta` to the chars in `range`, clamped to the block.
    pub fn with_metadata(mut self, range: Range<usize>, meta: CharacterMetadata) -> Self {
        self.update_range(range, |ch| *ch = meta.clone());
        self
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn characters(&self) -> &[CharacterMetadata] {
        &self.characters
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn is_list_item(&self) -> bool {
        self.block_type.is_list_item()
    }

    pub fn style_at(&self, offset: usize) -> InlineStyleSet {
        self.characters
            .get(offset)
            .map(|ch| ch.style.clone())
            .unwrap_or_default()
    }

    pub fn entity_at(&self, offset: usize) -> Option<&EntityKey> {
        self.characters.get(offset).and_then(|ch| ch.entity.as_ref())
    }

    pub fn inline_runs(&self) -> Vec<InlineRun<'_>> {
        let boundaries: Vec<usize> = self
            .text
            .char_indices()
            .map(|(ix, _)| ix)
            .chain(std::iter::once(self.text.len()))
            .collect();

        let mut runs = Vec::new();
        let mut run_start = 0usize;
        for offset in 1..=self.characters.len() {
            if offset < self.characters.len()
                && self.characters[offset] == self.characters[run_start]
            {
                continue;
            }
            let meta = &self.characters[run_start];
            runs.push(InlineRun {
                text: &self.text[boundaries[run_start]..boundaries[offset]],
                style: &meta.style,
                entity: meta.entity.as_ref(),
                start: run_start,
                end: offset,
            });
            run_start = offset;
        }
        runs
    }

    pub(crate) fn set_block_type(&mut self, block_type: BlockType) {
        self.block_type = block_type;
    }

    pub(crate) fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    fn byte_index(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(ix, _)| ix)
            .unwrap_or(self.text.len())
    }

    fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let start = range.start.min(self.len());
        let end = range.end.clamp(start, self.len());
        start..end
    }

    /// Replaces the chars in `range` with `text`, every new char carrying `meta`.
    pub(crate) fn splice(&mut self, range: Range<usize>, text: &str, meta: &CharacterMetadata) {
        let range = self.clamp_range(range);
        let bytes = self.byte_index(range.start)..self.byte_index(range.end);
        self.text.replace_range(bytes, text);
        let inserted = std::iter::repeat_n(meta.clone(), text.chars().count());
        self.characters.splice(range, inserted);
    }

    pub(crate) fn split_off(&mut self, offset: usize) -> (String, Vec<CharacterMetadata>) {
        let offset = offset.min(self.len());
        let byte = self.byte_index(offset);
        (self.text.split_off(byte), self.characters.split_off(offset))
    }

    pub(crate) fn append(&mut self, text: &str, characters: &[CharacterMetadata]) {
        self.text.push_str(text);
        self.characters.extend_from_slice(characters);
    }

    pub(crate) fn update_range(
        &mut self,
        range: Range<usize>,
        f: impl FnMut(&mut CharacterMetadata),
    ) {
        let range = self.clamp_range(range);
        self.characters[range].iter_mut().for_each(f);
    }
}

/// Immutable snapshot of document content. Every transform clones and
/// returns a new value; callers never observe in-place mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentState {
    blocks: Vec<ContentBlock>,
    entities: BTreeMap<EntityKey, Entity>,
    selection_before: SelectionState,
    selection_after: SelectionState,
    key_seq: u64,
}

impl Default for ContentState {
    fn default() -> Self {
        Self::from_blocks(Vec::new())
    }
}

impl ContentState {
    pub fn from_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::from_parts(blocks, BTreeMap::new())
    }

    pub fn from_parts(blocks: Vec<ContentBlock>, entities: BTreeMap<EntityKey, Entity>) -> Self {
        let mut content = Self {
            blocks,
            entities,
            selection_before: SelectionState::collapsed(BlockKey::new(""), 0),
            selection_after: SelectionState::collapsed(BlockKey::new(""), 0),
            key_seq: 0,
        };
        if content.blocks.is_empty() {
            let key = content.mint_block_key();
            content
                .blocks
                .push(ContentBlock::new(key, BlockType::Unstyled, ""));
        }
        let first = SelectionState::collapsed(content.blocks[0].key.clone(), 0);
        content.selection_before = first.clone();
        content.selection_after = first;
        content
    }

    /// One unstyled block per line of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut content = Self::from_blocks(Vec::new());
        let normalized = text.replace("\r\n", "\n");
        let blocks = normalized
            .split('\n')
            .map(|line| {
                let key = content.mint_block_key();
                ContentBlock::new(key, BlockType::Unstyled, line)
            })
            .collect();
        content.blocks = blocks;
        let first = SelectionState::collapsed(content.blocks[0].key.clone(), 0);
        content.selection_before = first.clone();
        content.selection_after = first;
        content
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn block_for_key(&self, key: &BlockKey) -> Option<&ContentBlock> {
        self.blocks.iter().find(|block| &block.key == key)
    }

    pub fn block_index(&self, key: &BlockKey) -> Option<usize> {
        self.blocks.iter().position(|block| &block.key == key)
    }

    pub fn block_before(&self, key: &BlockKey) -> Option<&ContentBlock> {
        let ix = self.block_index(key)?;
        ix.checked_sub(1).and_then(|ix| self.blocks.get(ix))
    }

    pub fn block_after(&self, key: &BlockKey) -> Option<&ContentBlock> {
        let ix = self.block_index(key)?;
        self.blocks.get(ix + 1)
    }

    pub fn first_block(&self) -> &ContentBlock {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &ContentBlock {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn entity(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn entities(&self) -> &BTreeMap<EntityKey, Entity> {
        &self.entities
    }

    pub fn selection_before(&self) -> &SelectionState {
        &self.selection_before
    }

    pub fn selection_after(&self) -> &SelectionState {
        &self.selection_after
    }

    pub fn has_text(&self) -> bool {
        self.blocks.len() > 1 || !self.blocks[0].is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(ContentBlock::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total char count including one separator per block boundary.
    pub fn text_len(&self) -> usize {
        self.blocks.iter().map(ContentBlock::len).sum::<usize>() + self.blocks.len() - 1
    }

    /// Compares blocks and entities, ignoring the recorded selections.
    pub fn same_document(&self, other: &ContentState) -> bool {
        self.blocks == other.blocks && self.entities == other.entities
    }

    /// Builds a selection between two points, deriving `is_backward` from
    /// block order.
    pub fn select(
        &self,
        anchor_key: &BlockKey,
        anchor_offset: usize,
        focus_key: &BlockKey,
        focus_offset: usize,
    ) -> SelectionState {
        let is_backward = if anchor_key == focus_key {
            anchor_offset > focus_offset
        } else {
            match (self.block_index(anchor_key), self.block_index(focus_key)) {
                (Some(anchor), Some(focus)) => anchor > focus,
                _ => false,
            }
        };
        SelectionState {
            anchor_key: anchor_key.clone(),
            anchor_offset,
            focus_key: focus_key.clone(),
            focus_offset,
            is_backward,
            has_focus: false,
        }
    }

    /// Returns a copy holding `entity` plus the key it was stored under.
    pub fn with_entity(&self, entity: Entity) -> (ContentState, EntityKey) {
        let mut next = self.clone();
        let key = next.insert_entity(entity);
        (next, key)
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<ContentBlock> {
        &mut self.blocks
    }

    pub(crate) fn set_selection_before(&mut self, selection: SelectionState) {
        self.selection_before = selection;
    }

    pub(crate) fn set_selection_after(&mut self, selection: SelectionState) {
        self.selection_after = selection;
    }

    pub(crate) fn mint_block_key(&mut self) -> BlockKey {
        loop {
            self.key_seq += 1;
            let key = BlockKey(format!("b{:x}", self.key_seq));
            if self.block_index(&key).is_none() {
                return key;
            }
        }
    }

    pub(crate) fn insert_entity(&mut self, entity: Entity) -> EntityKey {
        let mut seq = self.entities.len() as u64;
        let key = loop {
            seq += 1;
            let key = EntityKey(seq.to_string());
            if !self.entities.contains_key(&key) {
                break key;
            }
        };
        self.entities.insert(key.clone(), entity);
        key
    }
}
