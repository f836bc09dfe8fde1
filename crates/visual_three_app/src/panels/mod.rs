// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor panel implementations.

mod media_library;
mod player;

pub use media_library::MediaLibraryPanel;
pub use player::PlayerPanel;
