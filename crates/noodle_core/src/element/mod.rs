//! # Game Elements
//!
//! The four kinds of thing a game is made of. Each kind lives in its own
//! store, keyed by an ID drawn from the shared registry.
//!
//! - [`Entity`]: something that updates every tick and may be drawn
//! - [`Room`]: a screen's worth of entities (membership only, no ownership)
//! - [`Sprite`]: a sequence of subimages shared by any number of entities
//! - [`Sound`]: a sound file and its volume

mod behavior;
mod entity;
mod room;
mod sound;
mod sprite;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::ElementId;

pub use behavior::{Behavior, Inert, KeyCode};
pub use entity::{Entity, EntityData, SpriteState};
pub use room::Room;
pub use sound::Sound;
pub use sprite::{Sprite, TextureHandle};

/// The kind of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// An entity.
    Entity,
    /// A sound.
    Sound,
    /// A room.
    Room,
    /// A sprite.
    Sprite,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entity => "entity",
            Self::Sound => "sound",
            Self::Room => "room",
            Self::Sprite => "sprite",
        })
    }
}

/// Anything a [`Store`](crate::store::Store) can hold.
pub trait Element: Send {
    /// Kind reported in errors and logs.
    const KIND: ElementKind;

    /// Returns the element's ID ([`ElementId::UNASSIGNED`] before `add`).
    fn id(&self) -> ElementId;

    /// Overwrites the element's ID. Called by the store on `add`.
    fn assign_id(&mut self, id: ElementId);
}
