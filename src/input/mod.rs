mod pointer;
mod shortcut;

pub use pointer::{DragSession, ListenerGuard, PointerEvent, PointerHub};
pub use shortcut::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers,
};
