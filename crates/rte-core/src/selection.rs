use crate::content::BlockKey;

/// Anchor/focus pair into the document. Offsets count chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub anchor_key: BlockKey,
    pub anchor_offset: usize,
    pub focus_key: BlockKey,
    pub focus_offset: usize,
    pub is_backward: bool,
    pub has_focus: bool,
}

impl SelectionState {
    pub fn collapsed(key: BlockKey, offset: usize) -> Self {
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Compares positions only, ignoring focus.
    pub fn same_range(&self, other: &SelectionState) -> bool {
        self.start_key() == other.start_key()
            && self.start_offset() == other.start_offset()
            && self.end_key() == other.end_key()
            && self.end_offset() == other.end_offset()
    }

    pub fn with_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }
}
