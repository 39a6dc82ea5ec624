//! # Command Protocol
//!
//! Entities never mutate the game state. Their handlers return commands,
//! and the update loop applies them after every entity has been updated:
//!
//! ```text
//! ┌──────────┐  step()   ┌──────────────┐  dispatch  ┌────────────┐
//! │ Entity A │──────────>│ CommandBatch │───────────>│ Game State │
//! │ Entity B │──────────>│ CommandBatch │───────────>│  (stores)  │
//! └──────────┘ read-only └──────────────┘  phase 2   └────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::element::{Behavior, Entity, EntityData, SpriteState};
use crate::store::ElementId;

/// Entity field to overwrite, with its new value.
#[derive(Clone)]
pub enum EntityField {
    /// Sprite shown and its animation phase.
    Sprite(SpriteState),
    /// X coordinate.
    X(i32),
    /// Y coordinate.
    Y(i32),
    /// Event handlers.
    Behavior(Arc<dyn Behavior>),
    /// Scratch payload.
    Data(EntityData),
}

impl std::fmt::Debug for EntityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sprite(sprite) => f.debug_tuple("Sprite").field(sprite).finish(),
            Self::X(x) => f.debug_tuple("X").field(x).finish(),
            Self::Y(y) => f.debug_tuple("Y").field(y).finish(),
            Self::Behavior(behavior) => f.debug_tuple("Behavior").field(&behavior.name()).finish(),
            Self::Data(data) => f.debug_tuple("Data").field(data).finish(),
        }
    }
}

/// Room field to overwrite, with its new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomField {
    /// Membership list. Entities left out are not deleted; unknown and
    /// repeated IDs are dropped when applied.
    Entities(Vec<ElementId>),
    /// Width in pixels.
    Width(u32),
    /// Height in pixels.
    Height(u32),
}

/// How the game ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuitStatus {
    /// Orderly exit.
    #[default]
    Normal,
    /// The game gave up.
    Error,
}

impl QuitStatus {
    /// Process exit code for this status.
    #[inline]
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Error => 1,
        }
    }
}

/// A request to change the game state.
#[derive(Clone, Debug)]
pub enum Command {
    /// Overwrite one field of an entity.
    AlterEntity {
        /// Entity to change.
        target: ElementId,
        /// Field and new value.
        field: EntityField,
    },
    /// Register a new entity. Its ID is assigned when the command is applied.
    AddEntity {
        /// The entity; any ID it carries is ignored.
        entity: Entity,
        /// Room to place the new entity in, if any.
        room: Option<ElementId>,
    },
    /// Delete an entity and remove it from every room.
    RemoveEntity {
        /// Entity to remove.
        target: ElementId,
    },
    /// Overwrite one field of a room.
    AlterRoom {
        /// Room to change.
        target: ElementId,
        /// Field and new value.
        field: RoomField,
    },
    /// Make another room the active one.
    NextRoom {
        /// Room to switch to.
        room: ElementId,
    },
    /// Start or resume a sound.
    PlaySound {
        /// Sound to play.
        sound: ElementId,
    },
    /// Pause a sound.
    PauseSound {
        /// Sound to pause.
        sound: ElementId,
    },
    /// Stop a sound.
    EndSound {
        /// Sound to stop.
        sound: ElementId,
    },
    /// End the game.
    Quit {
        /// Exit status.
        status: QuitStatus,
    },
}

impl Command {
    /// Moves an entity horizontally.
    #[must_use]
    pub const fn set_x(target: ElementId, x: i32) -> Self {
        Self::AlterEntity {
            target,
            field: EntityField::X(x),
        }
    }

    /// Moves an entity vertically.
    #[must_use]
    pub const fn set_y(target: ElementId, y: i32) -> Self {
        Self::AlterEntity {
            target,
            field: EntityField::Y(y),
        }
    }

    /// Removes an entity.
    #[must_use]
    pub const fn remove(target: ElementId) -> Self {
        Self::RemoveEntity { target }
    }

    /// Spawns an entity, optionally into a room.
    #[must_use]
    pub const fn spawn(entity: Entity, room: Option<ElementId>) -> Self {
        Self::AddEntity { entity, room }
    }

    /// Ends the game.
    #[must_use]
    pub const fn quit(status: QuitStatus) -> Self {
        Self::Quit { status }
    }

    /// Short tag used in logs.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::AlterEntity { .. } => "alter_entity",
            Self::AddEntity { .. } => "add_entity",
            Self::RemoveEntity { .. } => "remove_entity",
            Self::AlterRoom { .. } => "alter_room",
            Self::NextRoom { .. } => "next_room",
            Self::PlaySound { .. } => "play_sound",
            Self::PauseSound { .. } => "pause_sound",
            Self::EndSound { .. } => "end_sound",
            Self::Quit { .. } => "quit",
        }
    }
}

/// Ordered commands produced by one entity's handlers in one tick.
#[derive(Clone, Debug, Default)]
pub struct CommandBatch {
    commands: Vec<Command>,
}

impl CommandBatch {
    /// Creates an empty batch.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Appends a command.
    #[inline]
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Appends every command of another batch, keeping their order.
    #[inline]
    pub fn append(&mut self, mut other: Self) {
        self.commands.append(&mut other.commands);
    }

    /// Returns the number of commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if the batch holds no command.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates over the commands in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }
}

impl From<Vec<Command>> for CommandBatch {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl FromIterator<Command> for CommandBatch {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl Extend<Command> for CommandBatch {
    fn extend<I: IntoIterator<Item = Command>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}

impl IntoIterator for CommandBatch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandBatch {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_order() {
        let a = ElementId::new(1);
        let mut batch = CommandBatch::new();
        assert!(batch.is_empty());

        batch.push(Command::set_x(a, 5));
        batch.append(CommandBatch::from(vec![Command::remove(a), Command::quit(QuitStatus::Normal)]));

        let tags: Vec<_> = batch.iter().map(Command::tag).collect();
        assert_eq!(tags, vec!["alter_entity", "remove_entity", "quit"]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_quit_exit_codes() {
        assert_eq!(QuitStatus::Normal.exit_code(), 0);
        assert_ne!(QuitStatus::Error.exit_code(), 0);
    }
}
