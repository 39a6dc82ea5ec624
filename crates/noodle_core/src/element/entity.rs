//! # Entities
//!
//! An entity is an atomic element of a room that updates independently.
//! It has a position, the state of the sprite it is showing, a set of event
//! handlers and a payload it owns exclusively.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::behavior::{Behavior, Inert};
use super::{Element, ElementKind};
use crate::store::ElementId;

/// Per-archetype scratch data carried by an entity.
///
/// Owned by the entity; dropped with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityData {
    /// No payload.
    #[default]
    Empty,
    /// Something that moves and can be hurt.
    Actor {
        /// Hit points left.
        health: i32,
        /// Pixels moved per tick.
        speed: i32,
    },
    /// A countdown.
    Timer {
        /// Ticks left.
        remaining: u32,
    },
    /// A piece of text, e.g. a sign or a menu entry.
    Label {
        /// The text shown.
        text: String,
    },
}

/// Which sprite an entity shows and where it is in that sprite's animation.
///
/// The sprite itself is a shared resource; timing and frame selection are
/// decided here, per entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpriteState {
    /// ID of the sprite being shown.
    pub sprite: ElementId,
    /// Index of the current subimage, starting at 0.
    pub image: u32,
    /// Frames between subimages. `None` for a static image.
    pub period: Option<u32>,
    /// Frames since the subimage last changed.
    pub frames_since_image: u32,
}

impl SpriteState {
    /// Static image 0 of a sprite.
    #[inline]
    #[must_use]
    pub const fn fixed(sprite: ElementId) -> Self {
        Self {
            sprite,
            image: 0,
            period: None,
            frames_since_image: 0,
        }
    }

    /// Animation of a sprite, changing subimage every `period` frames.
    #[inline]
    #[must_use]
    pub const fn animated(sprite: ElementId, period: u32) -> Self {
        Self {
            sprite,
            image: 0,
            period: Some(period),
            frames_since_image: 0,
        }
    }

    /// Advances the animation by one frame.
    ///
    /// Returns true if the subimage changed.
    pub fn advance(&mut self, subimage_count: u32) -> bool {
        let Some(period) = self.period else {
            return false;
        };
        if period == 0 || subimage_count == 0 {
            return false;
        }

        self.frames_since_image += 1;
        if self.frames_since_image < period {
            return false;
        }

        self.frames_since_image = 0;
        self.image = (self.image + 1) % subimage_count;
        true
    }
}

/// An entity.
#[derive(Clone)]
pub struct Entity {
    /// Assigned by the entity store on `add`.
    id: ElementId,
    /// X coordinate in the room (right is positive).
    pub x: i32,
    /// Y coordinate in the room (down is positive).
    pub y: i32,
    /// Sprite shown and its animation phase.
    pub sprite: SpriteState,
    /// Event handlers.
    pub behavior: Arc<dyn Behavior>,
    /// Scratch payload.
    pub data: EntityData,
}

impl Entity {
    /// Creates an unregistered entity showing a static sprite, with inert
    /// behavior.
    #[must_use]
    pub fn new(sprite: ElementId, x: i32, y: i32, data: EntityData) -> Self {
        Self {
            id: ElementId::UNASSIGNED,
            x,
            y,
            sprite: SpriteState::fixed(sprite),
            behavior: Arc::new(Inert),
            data,
        }
    }

    /// Replaces the behavior.
    #[must_use]
    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Arc::new(behavior);
        self
    }

    /// Replaces the behavior with one shared between entities.
    #[must_use]
    pub fn with_shared_behavior(mut self, behavior: Arc<dyn Behavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Replaces the sprite state.
    #[must_use]
    pub const fn with_sprite(mut self, sprite: SpriteState) -> Self {
        self.sprite = sprite;
        self
    }

    /// Returns the entity's ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }
}

impl Element for Entity {
    const KIND: ElementKind = ElementKind::Entity;

    #[inline]
    fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    fn assign_id(&mut self, id: ElementId) {
        self.id = id;
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.x == other.x
            && self.y == other.y
            && self.sprite == other.sprite
            && self.data == other.data
            && Arc::ptr_eq(&self.behavior, &other.behavior)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("sprite", &self.sprite)
            .field("behavior", &self.behavior.name())
            .field("data", &self.data)
            .finish()
    }
}
