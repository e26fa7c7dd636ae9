mod config;
mod interceptor;
mod keys;
mod popover;
mod shell;
mod toolbar;

pub use crate::config::*;
pub use crate::interceptor::*;
pub use crate::keys::*;
pub use crate::popover::*;
pub use crate::shell::*;
pub use crate::toolbar::*;
