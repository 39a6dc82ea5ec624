//! # Sounds
//!
//! A single sound, e.g. a music track or an effect.

use std::path::{Path, PathBuf};

use super::{Element, ElementKind};
use crate::store::ElementId;

/// A sound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sound {
    /// Assigned by the sound store on `add`.
    id: ElementId,
    /// Sound file, relative to the game description.
    path: PathBuf,
    /// Volume in decibels.
    volume: i32,
}

impl Sound {
    /// Creates an unregistered sound.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, volume: i32) -> Self {
        Self {
            id: ElementId::UNASSIGNED,
            path: path.into(),
            volume,
        }
    }

    /// Returns the sound's ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Returns the sound file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the volume in decibels.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> i32 {
        self.volume
    }
}

impl Element for Sound {
    const KIND: ElementKind = ElementKind::Sound;

    #[inline]
    fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    fn assign_id(&mut self, id: ElementId) {
        self.id = id;
    }
}
