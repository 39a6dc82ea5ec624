//! # Noodle Core
//!
//! The game-state store of the Noodle 2D engine:
//! - Entities living in rooms, drawing sprites and playing sounds
//! - One shared ID counter; an ID is never reused
//! - Bucketed concurrent stores with one lock per bucket
//! - A command protocol through which entities request every state change
//!
//! ## Architecture Rules
//!
//! 1. **Handlers read, dispatchers write** - entity handlers get a
//!    [`GameView`] and answer with commands; only dispatchers mutate
//! 2. **One lock at a time** - no operation ever holds two bucket locks
//! 3. **Stores own, rooms list** - deleting an entity is the entity store's
//!    job; rooms only hold IDs
//!
//! ## Example
//!
//! ```rust,ignore
//! use noodle_core::{Entity, EntityData, GameState, Room, Screen};
//!
//! let state = GameState::new(64, Screen::default());
//! let room = state.rooms().add(Room::new(Vec::new(), 640, 480))?;
//! let hero = state.entities().add(Entity::new(sprite, 10, 10, EntityData::Empty))?;
//! state.rooms().with_mut(room, |r| r.place(hero))?;
//! state.set_current_room(room);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod command;
pub mod element;
pub mod error;
pub mod state;
pub mod store;
pub mod view;

pub use command::{Command, CommandBatch, EntityField, QuitStatus, RoomField};
pub use element::{
    Behavior, Element, ElementKind, Entity, EntityData, Inert, KeyCode, Room, Sound, Sprite,
    SpriteState, TextureHandle,
};
pub use error::{StoreError, StoreResult};
pub use state::{Camera, GameState, Screen, Teardown};
pub use store::{ElementId, IdRegistry, Store, DEFAULT_BUCKET_COUNT};
pub use view::{GameView, StoreView};
