//! # Sprites
//!
//! A series of subimages drawn one after another. Entities that show a
//! sprite decide which subimage to use and when; the sprite itself is a
//! shared, read-mostly resource.

use super::{Element, ElementKind};
use crate::store::ElementId;

/// Handle to one uploaded subimage texture, owned by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TextureHandle(pub u32);

/// A sprite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sprite {
    /// Assigned by the sprite store on `add`.
    id: ElementId,
    /// One texture per subimage.
    textures: Vec<TextureHandle>,
}

impl Sprite {
    /// Creates an unregistered sprite.
    #[must_use]
    pub const fn new(textures: Vec<TextureHandle>) -> Self {
        Self {
            id: ElementId::UNASSIGNED,
            textures,
        }
    }

    /// Returns the sprite's ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Returns the number of subimages.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn subimage_count(&self) -> u32 {
        // Sprites with more than u32::MAX frames do not exist in practice.
        self.textures.len().min(u32::MAX as usize) as u32
    }

    /// Returns the texture of a subimage.
    #[inline]
    #[must_use]
    pub fn texture(&self, image: u32) -> Option<TextureHandle> {
        self.textures.get(image as usize).copied()
    }

    /// Returns every subimage texture.
    #[inline]
    #[must_use]
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }
}

impl Element for Sprite {
    const KIND: ElementKind = ElementKind::Sprite;

    #[inline]
    fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    fn assign_id(&mut self, id: ElementId) {
        self.id = id;
    }
}
