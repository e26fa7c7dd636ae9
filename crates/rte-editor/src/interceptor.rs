use rte_core::EditorState;

use crate::keys::{KeyEvent, Platform};
use crate::toolbar::Toolbar;

/// What an interceptor may look at or change while deciding on a key.
pub struct KeyContext<'a> {
    pub state: &'a EditorState,
    pub platform: Platform,
    pub toolbar: &'a mut Toolbar,
}

/// A hook offered every key event before the default key bindings run.
pub trait KeyInterceptor {
    fn id(&self) -> &'static str;

    /// Returns true to claim the event, which ends the chain.
    fn intercept(&mut self, event: &KeyEvent, cx: &mut KeyContext<'_>) -> bool;
}

/// Interceptors in the order they are consulted.
#[derive(Default)]
pub struct KeyInterceptors {
    chain: Vec<Box<dyn KeyInterceptor>>,
}

impl KeyInterceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain with the built-in interceptors registered.
    pub fn with_defaults() -> Self {
        Self::new().with(LinkShortcut)
    }

    pub fn with(mut self, interceptor: impl KeyInterceptor + 'static) -> Self {
        self.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: impl KeyInterceptor + 'static) {
        self.chain.push(Box::new(interceptor));
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.chain.iter().map(|interceptor| interceptor.id()).collect()
    }

    /// Offers `event` to each interceptor in turn and returns the id of the
    /// one that claimed it.
    pub fn offer(&mut self, event: &KeyEvent, cx: &mut KeyContext<'_>) -> Option<&'static str> {
        let claimed = self
            .chain
            .iter_mut()
            .find_map(|interceptor| interceptor.intercept(event, cx).then(|| interceptor.id()));
        if let Some(id) = claimed {
            tracing::debug!(interceptor = id, key = ?event.key, "key event claimed");
        }
        claimed
    }
}

/// Cmd+K opens the link input.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkShortcut;

impl KeyInterceptor for LinkShortcut {
    fn id(&self) -> &'static str {
        "link-shortcut"
    }

    fn intercept(&mut self, event: &KeyEvent, cx: &mut KeyContext<'_>) -> bool {
        if event.modifiers.shift || !event.is_char('k') {
            return false;
        }
        if !cx.platform.has_command_modifier(event) {
            return false;
        }
        cx.toolbar.open_link_popover()
    }
}
