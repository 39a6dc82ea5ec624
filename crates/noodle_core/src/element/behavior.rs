//! # Entity Behavior
//!
//! What an entity does when something happens to it. Every handler gets a
//! [`GameView`] of the game state and a copy of the entity, and answers
//! with a batch of commands. The view has no mutating methods, so a
//! handler can only change the game through the commands it returns.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use crate::command::CommandBatch;
use crate::view::GameView;
use crate::store::ElementId;

/// Platform-independent key code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {}", self.0)
    }
}

/// Event handlers of an entity.
///
/// Every handler defaults to an empty batch, so a behavior only implements
/// the events it cares about.
///
/// # Example
///
/// ```rust,ignore
/// struct Walker;
///
/// impl Behavior for Walker {
///     fn step(&self, _view: &GameView<'_>, entity: &Entity) -> CommandBatch {
///         CommandBatch::from(vec![Command::set_x(entity.id(), entity.x + 1)])
///     }
/// }
/// ```
pub trait Behavior: Send + Sync {
    /// Called on the first tick the entity is updated.
    fn init(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called every tick.
    fn step(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called when the entity is removed. The entity is already gone from
    /// the store when this runs.
    fn destroy(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called when the entity's sprite intersects another entity's sprite.
    fn collide(&self, _view: &GameView<'_>, _entity: &Entity, _other: ElementId) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called once per tick for every key held down during that tick.
    fn key_pressed(&self, _view: &GameView<'_>, _entity: &Entity, _key: KeyCode) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called by the render loop just before the entity's sprite is read.
    fn draw_begin(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::new()
    }

    /// Called by the render loop after every sprite has been drawn.
    fn draw_end(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::new()
    }

    /// Short name used in logs.
    fn name(&self) -> &str {
        "behavior"
    }
}

/// Behavior that does nothing. New entities start with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inert;

impl Behavior for Inert {
    fn name(&self) -> &str {
        "inert"
    }
}
