//! # Built-in Behaviors
//!
//! Small, stateless behaviors that game descriptions can attach to entities
//! by name. Anything with memory keeps it in the entity's [`EntityData`] or
//! derives it from the tick counter, since handlers only ever see a copy of
//! their entity.
//!
//! [`EntityData`]: noodle_core::EntityData

use std::collections::HashMap;
use std::sync::Arc;

use noodle_core::{
    Behavior, Command, CommandBatch, ElementId, Entity, GameView, Inert, QuitStatus,
};
use serde::Deserialize;

use crate::error::{LoadError, LoadResult};

/// Moves its entity by a fixed offset every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Drift {
    /// Horizontal offset per tick.
    pub dx: i32,
    /// Vertical offset per tick.
    pub dy: i32,
}

impl Behavior for Drift {
    fn step(&self, _view: &GameView<'_>, entity: &Entity) -> CommandBatch {
        let mut batch = CommandBatch::new();
        if self.dx != 0 {
            batch.push(Command::set_x(entity.id(), entity.x.saturating_add(self.dx)));
        }
        if self.dy != 0 {
            batch.push(Command::set_y(entity.id(), entity.y.saturating_add(self.dy)));
        }
        batch
    }

    fn name(&self) -> &str {
        "drift"
    }
}

/// Removes its entity once the tick counter reaches `at_tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expire {
    /// First tick (zero based) on which the entity asks to be removed.
    pub at_tick: u64,
}

impl Behavior for Expire {
    fn step(&self, view: &GameView<'_>, entity: &Entity) -> CommandBatch {
        if view.ticks() >= self.at_tick {
            CommandBatch::from(vec![Command::remove(entity.id())])
        } else {
            CommandBatch::new()
        }
    }

    fn name(&self) -> &str {
        "expire"
    }
}

/// Switches to another room on tick `at_tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Portal {
    /// Destination room.
    pub to: ElementId,
    /// Tick (zero based) on which to switch.
    pub at_tick: u64,
}

impl Behavior for Portal {
    fn step(&self, view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        if view.ticks() == self.at_tick {
            CommandBatch::from(vec![Command::NextRoom { room: self.to }])
        } else {
            CommandBatch::new()
        }
    }

    fn name(&self) -> &str {
        "portal"
    }
}

/// Plays a sound on tick `at_tick` and stops it when its entity goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Jingle {
    /// Sound to play.
    pub sound: ElementId,
    /// Tick (zero based) on which to play.
    pub at_tick: u64,
}

impl Behavior for Jingle {
    fn step(&self, view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        if view.ticks() == self.at_tick {
            CommandBatch::from(vec![Command::PlaySound { sound: self.sound }])
        } else {
            CommandBatch::new()
        }
    }

    fn destroy(&self, _view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        CommandBatch::from(vec![Command::EndSound { sound: self.sound }])
    }

    fn name(&self) -> &str {
        "jingle"
    }
}

/// Ends the game during tick number `ticks` (one based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuitAfter {
    /// Tick on which to quit.
    pub ticks: u64,
    /// Status to quit with.
    pub status: QuitStatus,
}

impl Behavior for QuitAfter {
    fn step(&self, view: &GameView<'_>, _entity: &Entity) -> CommandBatch {
        if view.ticks() + 1 >= self.ticks {
            CommandBatch::from(vec![Command::quit(self.status)])
        } else {
            CommandBatch::new()
        }
    }

    fn name(&self) -> &str {
        "quit_after"
    }
}

/// Behavior as written in a game description. Rooms and sounds are named,
/// not numbered, since IDs are only known once the game is loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorSpec {
    /// [`Inert`]
    #[default]
    Inert,
    /// [`Drift`]
    Drift {
        /// Horizontal offset per tick.
        #[serde(default)]
        dx: i32,
        /// Vertical offset per tick.
        #[serde(default)]
        dy: i32,
    },
    /// [`Expire`]
    Expire {
        /// Tick on which to go away.
        at_tick: u64,
    },
    /// [`Portal`]
    Portal {
        /// Name of the destination room.
        to: String,
        /// Tick on which to switch.
        at_tick: u64,
    },
    /// [`Jingle`]
    Jingle {
        /// Name of the sound.
        sound: String,
        /// Tick on which to play.
        #[serde(default)]
        at_tick: u64,
    },
    /// [`QuitAfter`]
    QuitAfter {
        /// Tick on which to quit.
        ticks: u64,
        /// Status to quit with.
        #[serde(default)]
        status: QuitStatus,
    },
}

impl BehaviorSpec {
    /// Builds the behavior, resolving room and sound names.
    ///
    /// # Errors
    ///
    /// [`LoadError::Invalid`] if a name is unknown.
    pub fn build(
        &self,
        rooms: &HashMap<String, ElementId>,
        sounds: &HashMap<String, ElementId>,
    ) -> LoadResult<Arc<dyn Behavior>> {
        let behavior: Arc<dyn Behavior> = match self {
            Self::Inert => Arc::new(Inert),
            Self::Drift { dx, dy } => Arc::new(Drift { dx: *dx, dy: *dy }),
            Self::Expire { at_tick } => Arc::new(Expire { at_tick: *at_tick }),
            Self::Portal { to, at_tick } => Arc::new(Portal {
                to: resolve("room", rooms, to)?,
                at_tick: *at_tick,
            }),
            Self::Jingle { sound, at_tick } => Arc::new(Jingle {
                sound: resolve("sound", sounds, sound)?,
                at_tick: *at_tick,
            }),
            Self::QuitAfter { ticks, status } => Arc::new(QuitAfter {
                ticks: *ticks,
                status: *status,
            }),
        };
        Ok(behavior)
    }
}

fn resolve(kind: &str, names: &HashMap<String, ElementId>, name: &str) -> LoadResult<ElementId> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| LoadError::Invalid(format!("unknown {kind} `{name}`")))
}
