// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared panel type definitions.

/// Panel types that can be docked in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// Imported assets, dragged onto layers
    MediaLibrary,
    /// Layer stack and track view
    Timeline,
    /// Transport and preview canvas
    Player,
}

impl PanelType {
    /// Get the display name for this panel type
    pub fn name(&self) -> &'static str {
        match self {
            Self::MediaLibrary => "Media Library",
            Self::Timeline => "Timeline",
            Self::Player => "Player",
        }
    }

    /// Get the icon for this panel type
    pub fn icon(&self) -> &'static str {
        match self {
            Self::MediaLibrary => "\u{1f4c1}", // folder
            Self::Timeline => "\u{1f3ac}",     // film
            Self::Player => "\u{25b6}",        // play
        }
    }
}
