#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    /// A crop or resize overlay is showing.
    pub overlay_active: bool,
    pub blur_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ApplyTool,
    CancelTool,
    Undo,
    Save,
    Rotate,
    EnterCrop,
    EnterResize,
    EnterBlur,
    CancelSession,
}

fn resolve_overlay_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Enter => Some(ShortcutAction::ApplyTool),
        ShortcutKey::Escape => Some(ShortcutAction::CancelTool),
        _ => None,
    }
}

fn resolve_tool_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Character('c') => Some(ShortcutAction::EnterCrop),
        ShortcutKey::Character('s') => Some(ShortcutAction::EnterResize),
        ShortcutKey::Character('b') => Some(ShortcutAction::EnterBlur),
        ShortcutKey::Character('r') => Some(ShortcutAction::Rotate),
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.overlay_active {
        return resolve_overlay_shortcut(key);
    }

    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::Character('z'), true, false) => Some(ShortcutAction::Undo),
        (ShortcutKey::Character('s'), true, _) => Some(ShortcutAction::Save),
        (ShortcutKey::Escape, false, false) if context.blur_enabled => {
            Some(ShortcutAction::CancelTool)
        }
        (ShortcutKey::Escape, _, _) => Some(ShortcutAction::CancelSession),
        (_, false, false) => resolve_tool_shortcut(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_shortcut_prioritizes_overlay_context() {
        let context = InputContext {
            overlay_active: true,
            blur_enabled: false,
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::default(), context),
            Some(ShortcutAction::ApplyTool)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CancelTool)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, false),
                context
            ),
            None
        );
    }

    #[test]
    fn resolve_shortcut_maps_editor_shortcuts() {
        let context = InputContext::default();
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('s'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::Save)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('s'),
                ShortcutModifiers::default(),
                context
            ),
            Some(ShortcutAction::EnterResize)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('r'),
                ShortcutModifiers::default(),
                context
            ),
            Some(ShortcutAction::Rotate)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('c'),
                ShortcutModifiers::default(),
                context
            ),
            Some(ShortcutAction::EnterCrop)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('b'),
                ShortcutModifiers::default(),
                context
            ),
            Some(ShortcutAction::EnterBlur)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CancelSession)
        );
    }

    #[test]
    fn resolve_shortcut_escape_leaves_blur_before_closing() {
        let context = InputContext {
            overlay_active: false,
            blur_enabled: true,
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CancelTool)
        );
    }
}
