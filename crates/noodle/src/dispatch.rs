//! # Command Dispatchers
//!
//! One dispatcher per [`Command`] variant. Dispatchers are the only code
//! that mutates the game state; the update loop calls them during the
//! applying phase, one command at a time.
//!
//! Every dispatcher returns a [`Flow`]. [`Flow::Quit`] tells the caller to
//! stop applying commands at once. A missing target surfaces as
//! [`StoreError::NotFound`] and the caller decides whether to go on.
//!
//! [`StoreError::NotFound`]: noodle_core::StoreError::NotFound

use std::collections::HashSet;

use noodle_core::{
    Command, ElementId, ElementKind, Entity, EntityField, GameState, QuitStatus, RoomField,
    StoreError, StoreResult,
};
use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::inbox::CommandSender;

/// What the caller should do after a command was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Apply the next command.
    Continue,
    /// Stop: the game is over and the state has been torn down.
    Quit(QuitStatus),
}

/// Everything a dispatcher may touch.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    /// State being mutated.
    pub state: &'a GameState,
    /// Receiver of sound commands.
    pub audio: &'a dyn AudioSink,
    /// Inbox for batches produced while applying (`destroy` handlers).
    pub deferred: &'a CommandSender,
}

impl std::fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Routes a command to its dispatcher.
///
/// # Errors
///
/// Returns whatever the dispatcher returns; see the individual functions.
pub fn dispatch(ctx: &DispatchContext<'_>, command: Command) -> StoreResult<Flow> {
    match command {
        Command::AlterEntity { target, field } => alter_entity(ctx, target, field),
        Command::AddEntity { entity, room } => add_entity(ctx, entity, room),
        Command::RemoveEntity { target } => remove_entity(ctx, target),
        Command::AlterRoom { target, field } => alter_room(ctx, target, field),
        Command::NextRoom { room } => next_room(ctx, room),
        Command::PlaySound { sound } => play_sound(ctx, sound),
        Command::PauseSound { sound } => pause_sound(ctx, sound),
        Command::EndSound { sound } => end_sound(ctx, sound),
        Command::Quit { status } => Ok(quit(ctx, status)),
    }
}

/// Overwrites one field of an entity in place.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the entity does not exist; nothing changes.
pub fn alter_entity(
    ctx: &DispatchContext<'_>,
    target: ElementId,
    field: EntityField,
) -> StoreResult<Flow> {
    ctx.state.entities().with_mut(target, |entity| match field {
        EntityField::Sprite(sprite) => entity.sprite = sprite,
        EntityField::X(x) => entity.x = x,
        EntityField::Y(y) => entity.y = y,
        EntityField::Behavior(behavior) => entity.behavior = behavior,
        EntityField::Data(data) => entity.data = data,
    })?;
    Ok(Flow::Continue)
}

/// Registers a new entity and optionally places it in a room.
///
/// # Errors
///
/// [`StoreError::AllocationFailure`] if the entity store cannot grow.
/// [`StoreError::NotFound`] if `room` does not exist; the entity stays
/// registered but belongs to no room.
pub fn add_entity(
    ctx: &DispatchContext<'_>,
    entity: Entity,
    room: Option<ElementId>,
) -> StoreResult<Flow> {
    let id = ctx.state.entities().add(entity)?;
    if let Some(room) = room {
        ctx.state.rooms().with_mut(room, |r| r.place(id))?;
    }
    debug!(%id, room = ?room, "entity added");
    Ok(Flow::Continue)
}

/// Deletes an entity, evicts it from every room and runs its `destroy`
/// handler. The handler's batch is applied on the next tick.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the entity does not exist. Rooms are scrubbed
/// of the ID either way.
pub fn remove_entity(ctx: &DispatchContext<'_>, target: ElementId) -> StoreResult<Flow> {
    let removed = ctx.state.entities().delete(target);

    let mut evictions = 0_usize;
    ctx.state.rooms().for_each_mut(|room| {
        if room.evict(target) {
            evictions += 1;
        }
    });

    let removed = removed?;
    debug!(id = %target, evictions, "entity removed");

    let farewell = removed.behavior.destroy(&ctx.state.view(), &removed);
    ctx.deferred.send(farewell);
    Ok(Flow::Continue)
}

/// Overwrites one field of a room. Replacing the entity list never deletes
/// the entities that were left out.
///
/// A new entity list keeps only IDs of existing entities, each once, in the
/// order given. Dropped IDs are logged.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the room does not exist.
pub fn alter_room(
    ctx: &DispatchContext<'_>,
    target: ElementId,
    field: RoomField,
) -> StoreResult<Flow> {
    let field = match field {
        RoomField::Entities(ids) => RoomField::Entities(existing_once(ctx.state, target, ids)),
        other => other,
    };
    let departed = ctx.state.rooms().with_mut(target, |room| match field {
        RoomField::Entities(ids) => room.replace_entities(ids),
        RoomField::Width(width) => {
            room.set_width(width);
            Vec::new()
        }
        RoomField::Height(height) => {
            room.set_height(height);
            Vec::new()
        }
    })?;
    if !departed.is_empty() {
        debug!(room = %target, departed = ?departed, "entities left room");
    }
    Ok(Flow::Continue)
}

/// Filters a room's new entity list down to entities that exist, dropping
/// repeats. Takes entity bucket locks only; no room lock is held.
fn existing_once(state: &GameState, room: ElementId, ids: Vec<ElementId>) -> Vec<ElementId> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut kept = Vec::with_capacity(ids.len());
    let mut unknown = Vec::new();
    let mut repeated = Vec::new();
    for id in ids {
        if !state.entities().contains(id) {
            unknown.push(id);
        } else if !seen.insert(id) {
            repeated.push(id);
        } else {
            kept.push(id);
        }
    }
    if !unknown.is_empty() || !repeated.is_empty() {
        warn!(%room, ?unknown, ?repeated, "room entity list filtered");
    }
    kept
}

/// Makes `room` the active room.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the room does not exist; the active room is
/// unchanged.
pub fn next_room(ctx: &DispatchContext<'_>, room: ElementId) -> StoreResult<Flow> {
    if !ctx.state.rooms().contains(room) {
        return Err(StoreError::NotFound {
            kind: ElementKind::Room,
            id: room,
        });
    }
    ctx.state.set_current_room(room);
    info!(%room, "room changed");
    Ok(Flow::Continue)
}

/// Starts or resumes a sound.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the sound does not exist.
pub fn play_sound(ctx: &DispatchContext<'_>, sound: ElementId) -> StoreResult<Flow> {
    let sound = ctx.state.sounds().get(sound)?;
    ctx.audio.play(&sound);
    Ok(Flow::Continue)
}

/// Pauses a sound.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the sound does not exist.
pub fn pause_sound(ctx: &DispatchContext<'_>, sound: ElementId) -> StoreResult<Flow> {
    let sound = ctx.state.sounds().get(sound)?;
    ctx.audio.pause(&sound);
    Ok(Flow::Continue)
}

/// Stops a sound.
///
/// # Errors
///
/// [`StoreError::NotFound`] if the sound does not exist.
pub fn end_sound(ctx: &DispatchContext<'_>, sound: ElementId) -> StoreResult<Flow> {
    let sound = ctx.state.sounds().get(sound)?;
    ctx.audio.stop(&sound);
    Ok(Flow::Continue)
}

/// Tears the whole state down and ends the game.
pub fn quit(ctx: &DispatchContext<'_>, status: QuitStatus) -> Flow {
    let released = ctx.state.teardown();
    info!(?status, released = released.total(), "quit");
    Flow::Quit(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentAudio;
    use crate::inbox::CommandInbox;
    use noodle_core::{Behavior, CommandBatch, EntityData, GameView, Room, Screen, Sound};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn new_state() -> GameState {
        GameState::new(4, Screen::default())
    }

    fn entity(x: i32) -> Entity {
        Entity::new(ElementId::UNASSIGNED, x, 0, EntityData::Empty)
    }

    #[derive(Default)]
    struct RecordingAudio {
        calls: Mutex<Vec<(&'static str, ElementId)>>,
    }

    impl AudioSink for RecordingAudio {
        fn play(&self, sound: &Sound) {
            self.calls.lock().push(("play", sound.id()));
        }

        fn pause(&self, sound: &Sound) {
            self.calls.lock().push(("pause", sound.id()));
        }

        fn stop(&self, sound: &Sound) {
            self.calls.lock().push(("stop", sound.id()));
        }
    }

    struct Farewell;

    impl Behavior for Farewell {
        fn destroy(&self, _view: &GameView<'_>, entity: &Entity) -> CommandBatch {
            CommandBatch::from(vec![Command::set_y(entity.id(), -1)])
        }
    }

    #[test]
    fn test_alter_entity() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let id = state.entities().add(entity(1)).unwrap();

        assert_eq!(
            alter_entity(&ctx, id, EntityField::X(5)).unwrap(),
            Flow::Continue
        );
        alter_entity(&ctx, id, EntityField::Data(EntityData::Timer { remaining: 3 })).unwrap();

        let stored = state.entities().get(id).unwrap();
        assert_eq!(stored.x, 5);
        assert_eq!(stored.data, EntityData::Timer { remaining: 3 });

        let missing = ElementId::new(999);
        assert_eq!(
            alter_entity(&ctx, missing, EntityField::X(1)),
            Err(StoreError::NotFound {
                kind: ElementKind::Entity,
                id: missing
            })
        );
    }

    #[test]
    fn test_add_entity_into_room() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let room = state.rooms().add(Room::new(Vec::new(), 10, 10)).unwrap();

        dispatch(&ctx, Command::spawn(entity(0), Some(room))).unwrap();
        dispatch(&ctx, Command::spawn(entity(0), None)).unwrap();

        assert_eq!(state.entities().len(), 2);
        let members = state.rooms().with(room, |r| r.entity_ids().to_vec()).unwrap();
        assert_eq!(members.len(), 1);
        assert!(state.entities().contains(members[0]));
    }

    #[test]
    fn test_add_entity_missing_room_keeps_entity() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };

        let result = add_entity(&ctx, entity(0), Some(ElementId::new(77)));
        assert!(matches!(result, Err(StoreError::NotFound { kind: ElementKind::Room, .. })));
        assert_eq!(state.entities().len(), 1);
    }

    #[test]
    fn test_remove_entity_scrubs_rooms_and_defers_destroy() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let doomed = state
            .entities()
            .add(entity(0).with_behavior(Farewell))
            .unwrap();
        let other = state.entities().add(entity(0)).unwrap();
        let first = state.rooms().add(Room::new(vec![doomed, other], 10, 10)).unwrap();
        let second = state.rooms().add(Room::new(vec![doomed], 10, 10)).unwrap();

        remove_entity(&ctx, doomed).unwrap();

        assert!(!state.entities().contains(doomed));
        assert_eq!(state.rooms().with(first, |r| r.entity_ids().to_vec()).unwrap(), vec![other]);
        assert!(state.rooms().with(second, |r| r.entity_ids().is_empty()).unwrap());

        let deferred = inbox.drain();
        assert_eq!(deferred.len(), 1);

        assert!(remove_entity(&ctx, doomed).unwrap_err().is_not_found());
    }

    #[test]
    fn test_alter_room_keeps_departed_entities() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let a = state.entities().add(entity(0)).unwrap();
        let b = state.entities().add(entity(0)).unwrap();
        let room = state.rooms().add(Room::new(vec![a, b], 10, 10)).unwrap();

        alter_room(&ctx, room, RoomField::Entities(vec![b])).unwrap();
        alter_room(&ctx, room, RoomField::Width(640)).unwrap();

        let (members, width) = state
            .rooms()
            .with(room, |r| (r.entity_ids().to_vec(), r.width()))
            .unwrap();
        assert_eq!(members, vec![b]);
        assert_eq!(width, 640);
        assert!(state.entities().contains(a));
    }

    #[test]
    fn test_alter_room_drops_unknown_and_repeated_ids() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let a = state.entities().add(entity(0)).unwrap();
        let b = state.entities().add(entity(0)).unwrap();
        let room = state.rooms().add(Room::new(Vec::new(), 10, 10)).unwrap();
        let ghost = ElementId::new(999);

        alter_room(&ctx, room, RoomField::Entities(vec![a, ghost, a, b])).unwrap();
        let members = state.rooms().with(room, |r| r.entity_ids().to_vec()).unwrap();
        assert_eq!(members, vec![a, b]);

        // Rooms are not entities either.
        alter_room(&ctx, room, RoomField::Entities(vec![room, b])).unwrap();
        let members = state.rooms().with(room, |r| r.entity_ids().to_vec()).unwrap();
        assert_eq!(members, vec![b]);

        assert!(alter_room(&ctx, ghost, RoomField::Entities(vec![a]))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_next_room() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let room = state.rooms().add(Room::new(Vec::new(), 10, 10)).unwrap();

        next_room(&ctx, room).unwrap();
        assert_eq!(state.current_room(), Some(room));

        assert!(next_room(&ctx, ElementId::new(500)).is_err());
        assert_eq!(state.current_room(), Some(room));
    }

    #[test]
    fn test_sound_commands_reach_sink() {
        let state = new_state();
        let audio = Arc::new(RecordingAudio::default());
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: audio.as_ref(),
            deferred: &sender,
        };
        let sound = state.sounds().add(Sound::new("boing.wav", 80)).unwrap();

        dispatch(&ctx, Command::PlaySound { sound }).unwrap();
        dispatch(&ctx, Command::PauseSound { sound }).unwrap();
        dispatch(&ctx, Command::EndSound { sound }).unwrap();
        assert!(dispatch(&ctx, Command::PlaySound { sound: ElementId::new(404) }).is_err());

        let calls = audio.calls.lock().clone();
        assert_eq!(calls, vec![("play", sound), ("pause", sound), ("stop", sound)]);
    }

    #[test]
    fn test_quit_tears_down() {
        let state = new_state();
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let ctx = DispatchContext {
            state: &state,
            audio: &SilentAudio,
            deferred: &sender,
        };
        let a = state.entities().add(entity(0)).unwrap();
        let room = state.rooms().add(Room::new(vec![a], 10, 10)).unwrap();
        state.set_current_room(room);

        let flow = dispatch(&ctx, Command::quit(QuitStatus::Error)).unwrap();

        assert_eq!(flow, Flow::Quit(QuitStatus::Error));
        assert_eq!(state.element_count(), 0);
        assert_eq!(state.current_room(), None);
    }
}
