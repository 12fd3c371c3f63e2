use crate::editor::tools::ToolKind;

/// Which tool currently owns pointer input. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    None,
    Cropping,
    Resizing,
    Blurring,
}

impl ToolState {
    pub const fn for_tool(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Crop => Self::Cropping,
            ToolKind::Resize => Self::Resizing,
            ToolKind::Blur => Self::Blurring,
        }
    }

    pub const fn tool(self) -> Option<ToolKind> {
        match self {
            Self::None => None,
            Self::Cropping => Some(ToolKind::Crop),
            Self::Resizing => Some(ToolKind::Resize),
            Self::Blurring => Some(ToolKind::Blur),
        }
    }

    /// Crop and resize show a handle overlay that is applied on commit.
    pub const fn has_overlay(self) -> bool {
        matches!(self, Self::Cropping | Self::Resizing)
    }
}
