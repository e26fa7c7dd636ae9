use std::collections::BTreeMap;

use crate::content::{
    BlockKey, BlockType, CharacterMetadata, ContentBlock, ContentState, Entity, EntityKey,
    InlineStyleSet,
};

struct PendingBlock {
    block_type: BlockType,
    depth: u8,
    text: String,
    characters: Vec<CharacterMetadata>,
}

/// Accumulates blocks while a markup importer walks its input.
#[derive(Default)]
pub(crate) struct DocumentBuilder {
    blocks: Vec<ContentBlock>,
    entities: BTreeMap<EntityKey, Entity>,
    current: Option<PendingBlock>,
}

impl DocumentBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start_block(&mut self, block_type: BlockType, depth: u8) {
        self.finish_block();
        self.current = Some(PendingBlock {
            block_type,
            depth,
            text: String::new(),
            characters: Vec::new(),
        });
    }

    pub(crate) fn finish_block(&mut self) {
        let Some(mut pending) = self.current.take() else {
            return;
        };
        // A lone break is how empty blocks are written out.
        if pending.text == "\n" {
            pending.text.clear();
            pending.characters.clear();
        }
        let key = BlockKey::new(format!("b{:x}", self.blocks.len() + 1));
        self.blocks.push(ContentBlock::from_parts(
            key,
            pending.block_type,
            pending.depth,
            pending.text,
            pending.characters,
        ));
    }

    /// Text of the open block so far, empty if none is open.
    pub(crate) fn current_text(&self) -> &str {
        self.current
            .as_ref()
            .map(|pending| pending.text.as_str())
            .unwrap_or("")
    }

    /// Appends text to the open block, opening one of `fallback` type if
    /// needed. Empty text never opens a block.
    pub(crate) fn push_text(
        &mut self,
        text: &str,
        style: &InlineStyleSet,
        entity: Option<&EntityKey>,
        fallback: (BlockType, u8),
    ) {
        if text.is_empty() {
            return;
        }
        let pending = self.current.get_or_insert_with(|| PendingBlock {
            block_type: fallback.0,
            depth: fallback.1,
            text: String::new(),
            characters: Vec::new(),
        });
        pending.text.push_str(text);
        let meta = CharacterMetadata {
            style: style.clone(),
            entity: entity.cloned(),
        };
        pending
            .characters
            .extend(std::iter::repeat_n(meta, text.chars().count()));
    }

    pub(crate) fn trim_trailing_newline(&mut self) {
        if let Some(pending) = self.current.as_mut()
            && pending.text.ends_with('\n')
        {
            pending.text.pop();
            pending.characters.pop();
        }
    }

    pub(crate) fn add_entity(&mut self, entity: Entity) -> EntityKey {
        let key = EntityKey::new((self.entities.len() + 1).to_string());
        self.entities.insert(key.clone(), entity);
        key
    }

    pub(crate) fn finish(mut self) -> ContentState {
        self.finish_block();
        ContentState::from_parts(self.blocks, self.entities)
    }
}
