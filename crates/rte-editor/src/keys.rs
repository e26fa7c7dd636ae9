use std::ops::BitOr;

use rte_core::EditorCommand;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };
    /// Cmd on macOS, Win elsewhere.
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };

    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            meta: self.meta || other.meta,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Character(char),
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn char(ch: char, modifiers: Modifiers) -> Self {
        Self::new(Key::Character(ch), modifiers)
    }

    /// Letter keys compare case-insensitively since shift changes the char.
    pub fn is_char(&self, expected: char) -> bool {
        matches!(self.key, Key::Character(ch) if ch.eq_ignore_ascii_case(&expected))
    }
}

/// Decides which physical modifier acts as the command key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Mac,
    Other,
}

impl Default for Platform {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

impl Platform {
    pub fn command_modifier(self) -> Modifiers {
        match self {
            Platform::Mac => Modifiers::META,
            Platform::Other => Modifiers::CTRL,
        }
    }

    /// Cmd on macOS, Ctrl elsewhere. Alt cancels it so AltGr text input
    /// is not mistaken for a shortcut.
    pub fn has_command_modifier(self, event: &KeyEvent) -> bool {
        let modifiers = event.modifiers;
        let held = match self {
            Platform::Mac => modifiers.meta,
            Platform::Other => modifiers.ctrl,
        };
        held && !modifiers.alt
    }
}

/// Return with shift, alt or ctrl breaks the line inside the block.
pub fn is_soft_newline_event(event: &KeyEvent) -> bool {
    let modifiers = event.modifiers;
    event.key == Key::Enter && (modifiers.shift || modifiers.alt || modifiers.ctrl)
}

pub fn default_key_binding(event: &KeyEvent, platform: Platform) -> Option<EditorCommand> {
    match &event.key {
        Key::Enter => return Some(EditorCommand::SplitBlock),
        Key::Backspace => return Some(EditorCommand::Backspace),
        Key::Delete => return Some(EditorCommand::Delete),
        Key::Character(_) => {}
        _ => return None,
    }

    if !platform.has_command_modifier(event) {
        return None;
    }
    let shift = event.modifiers.shift;
    let Key::Character(ch) = event.key else {
        return None;
    };
    match (ch.to_ascii_lowercase(), shift) {
        ('b', false) => Some(EditorCommand::Bold),
        ('i', false) => Some(EditorCommand::Italic),
        ('u', false) => Some(EditorCommand::Underline),
        ('j', false) => Some(EditorCommand::Code),
        ('x', true) => Some(EditorCommand::Strikethrough),
        ('z', false) => Some(EditorCommand::Undo),
        ('z', true) => Some(EditorCommand::Redo),
        ('y', false) if platform == Platform::Other => Some(EditorCommand::Redo),
        _ => None,
    }
}
