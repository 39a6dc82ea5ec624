//! # Game State
//!
//! Everything about one running game: the four stores, the shared ID
//! counter, screen and camera geometry, the active room and the tick count.
//!
//! The state is shared by reference between the update loop, its collector
//! workers and the render loop. There is no global lock; every store locks
//! per bucket and the scalar fields are atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::element::{Entity, Room, Sound, Sprite};
use crate::store::{ElementId, IdRegistry, Store};
use crate::view::GameView;

/// Size of the window the player sees, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

/// Top-left corner of the camera in room coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

/// How many elements of each kind a teardown released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Entities released.
    pub entities: usize,
    /// Rooms released.
    pub rooms: usize,
    /// Sprites released.
    pub sprites: usize,
    /// Sounds released.
    pub sounds: usize,
}

impl Teardown {
    /// Total elements released.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.entities + self.rooms + self.sprites + self.sounds
    }
}

/// All data about one game.
pub struct GameState {
    /// Shared by the four stores.
    ids: Arc<IdRegistry>,
    /// Only place entities can be referenced from.
    entities: Store<Entity>,
    /// Only place rooms can be referenced from.
    rooms: Store<Room>,
    /// Only place sprites can be referenced from.
    sprites: Store<Sprite>,
    /// Only place sounds can be referenced from.
    sounds: Store<Sound>,
    /// Fixed for the lifetime of the game.
    screen: Screen,
    /// Placed by the host, read by the renderer.
    camera: RwLock<Camera>,
    /// Raw ID of the active room, 0 when none is active.
    current_room: AtomicU64,
    /// Completed ticks.
    ticks: AtomicU64,
}

impl GameState {
    /// Creates an empty game whose stores all use `bucket_count` buckets
    /// (at least one).
    #[must_use]
    pub fn new(bucket_count: usize, screen: Screen) -> Self {
        let ids = Arc::new(IdRegistry::new());
        Self {
            entities: Store::new(bucket_count, Arc::clone(&ids)),
            rooms: Store::new(bucket_count, Arc::clone(&ids)),
            sprites: Store::new(bucket_count, Arc::clone(&ids)),
            sounds: Store::new(bucket_count, Arc::clone(&ids)),
            ids,
            screen,
            camera: RwLock::new(Camera::default()),
            current_room: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
        }
    }

    /// Returns the entity store.
    #[inline]
    #[must_use]
    pub const fn entities(&self) -> &Store<Entity> {
        &self.entities
    }

    /// Returns the room store.
    #[inline]
    #[must_use]
    pub const fn rooms(&self) -> &Store<Room> {
        &self.rooms
    }

    /// Returns the sprite store.
    #[inline]
    #[must_use]
    pub const fn sprites(&self) -> &Store<Sprite> {
        &self.sprites
    }

    /// Returns the sound store.
    #[inline]
    #[must_use]
    pub const fn sounds(&self) -> &Store<Sound> {
        &self.sounds
    }

    /// Returns the largest ID ever assigned.
    #[inline]
    #[must_use]
    pub fn max_id(&self) -> ElementId {
        self.ids.max_id()
    }

    /// Returns the read-only view entity handlers get.
    #[inline]
    #[must_use]
    pub const fn view(&self) -> GameView<'_> {
        GameView::new(self)
    }

    /// Returns the screen size.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns the camera position.
    #[inline]
    #[must_use]
    pub fn camera(&self) -> Camera {
        *self.camera.read()
    }

    /// Moves the camera. Handlers cannot; the host and loader place it.
    #[inline]
    pub fn set_camera(&self, camera: Camera) {
        *self.camera.write() = camera;
    }

    /// Returns the active room, if any.
    #[inline]
    #[must_use]
    pub fn current_room(&self) -> Option<ElementId> {
        let id = ElementId::new(self.current_room.load(Ordering::Acquire));
        id.is_assigned().then_some(id)
    }

    /// Makes a room the active one. Does not check that the room exists.
    #[inline]
    pub fn set_current_room(&self, room: ElementId) {
        self.current_room.store(room.raw(), Ordering::Release);
    }

    /// Returns the number of completed ticks.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Records a completed tick and returns the new count.
    #[inline]
    pub fn advance_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Snapshot of the active room's entity list (empty if no room is active
    /// or the active room no longer exists).
    #[must_use]
    pub fn active_entities(&self) -> Vec<ElementId> {
        self.current_room()
            .and_then(|room| self.rooms.with(room, |r| r.entity_ids().to_vec()).ok())
            .unwrap_or_default()
    }

    /// Returns the IDs of every element of every kind.
    #[must_use]
    pub fn all_ids(&self) -> Vec<ElementId> {
        let mut ids = self.entities.ids();
        ids.extend(self.rooms.ids());
        ids.extend(self.sounds.ids());
        ids.extend(self.sprites.ids());
        ids
    }

    /// Returns the number of elements of every kind.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.entities.len() + self.rooms.len() + self.sprites.len() + self.sounds.len()
    }

    /// Releases every element of every store and clears the active room.
    ///
    /// Stores are emptied one bucket at a time; the dropped elements free
    /// their payloads, texture lists and paths.
    pub fn teardown(&self) -> Teardown {
        self.current_room.store(0, Ordering::Release);
        let report = Teardown {
            rooms: self.rooms.drain().len(),
            entities: self.entities.drain().len(),
            sprites: self.sprites.drain().len(),
            sounds: self.sounds.drain().len(),
        };
        tracing::debug!(
            entities = report.entities,
            rooms = report.rooms,
            sprites = report.sprites,
            sounds = report.sounds,
            "game state torn down"
        );
        report
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("entities", &self.entities)
            .field("rooms", &self.rooms)
            .field("sprites", &self.sprites)
            .field("sounds", &self.sounds)
            .field("screen", &self.screen)
            .field("current_room", &self.current_room())
            .field("ticks", &self.ticks())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{EntityData, TextureHandle};
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_ids_unique_across_stores() {
        let state = GameState::new(4, Screen::default());
        let mut seen = HashSet::new();

        for i in 0..5 {
            assert!(seen.insert(state.sprites().add(Sprite::new(vec![TextureHandle(i)])).unwrap()));
            assert!(seen.insert(state.sounds().add(Sound::new("s.ogg", 0)).unwrap()));
            assert!(seen.insert(state.rooms().add(Room::new(Vec::new(), 8, 8)).unwrap()));
            assert!(seen.insert(
                state
                    .entities()
                    .add(Entity::new(ElementId::UNASSIGNED, 0, 0, EntityData::Empty))
                    .unwrap()
            ));
        }

        assert_eq!(seen.len(), 20);
        assert_eq!(state.max_id(), ElementId::new(20));
        assert_eq!(state.element_count(), 20);
        assert_eq!(state.all_ids().into_iter().collect::<HashSet<_>>(), seen);
    }

    #[test]
    fn test_concurrent_adds_across_stores() {
        let state = GameState::new(8, Screen::default());
        let ids: Vec<ElementId> = thread::scope(|s| {
            let rooms = s.spawn(|| {
                (0..200)
                    .map(|_| state.rooms().add(Room::new(Vec::new(), 1, 1)).unwrap())
                    .collect::<Vec<_>>()
            });
            let sounds = s.spawn(|| {
                (0..200)
                    .map(|_| state.sounds().add(Sound::new("x", 0)).unwrap())
                    .collect::<Vec<_>>()
            });
            let mut ids = rooms.join().unwrap();
            ids.extend(sounds.join().unwrap());
            ids
        });

        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 400);
    }

    #[test]
    fn test_current_room() {
        let state = GameState::new(4, Screen::default());
        assert_eq!(state.current_room(), None);
        assert!(state.active_entities().is_empty());

        let room = state
            .rooms()
            .add(Room::new(vec![ElementId::new(40), ElementId::new(41)], 10, 10))
            .unwrap();
        state.set_current_room(room);

        assert_eq!(state.current_room(), Some(room));
        assert_eq!(state.active_entities(), vec![ElementId::new(40), ElementId::new(41)]);
    }

    #[test]
    fn test_camera_and_ticks() {
        let state = GameState::new(1, Screen { width: 320, height: 240 });
        state.set_camera(Camera { x: 5, y: -2 });
        assert_eq!(state.camera(), Camera { x: 5, y: -2 });
        assert_eq!(state.screen().width, 320);

        assert_eq!(state.ticks(), 0);
        assert_eq!(state.advance_tick(), 1);
        assert_eq!(state.ticks(), 1);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let state = GameState::new(4, Screen::default());
        let room = state.rooms().add(Room::new(Vec::new(), 1, 1)).unwrap();
        state.set_current_room(room);
        state.sprites().add(Sprite::new(vec![TextureHandle(1), TextureHandle(2)])).unwrap();
        state.sounds().add(Sound::new("a", 1)).unwrap();
        for _ in 0..3 {
            state
                .entities()
                .add(Entity::new(ElementId::UNASSIGNED, 0, 0, EntityData::Label { text: "x".into() }))
                .unwrap();
        }

        let report = state.teardown();
        assert_eq!(
            report,
            Teardown {
                entities: 3,
                rooms: 1,
                sprites: 1,
                sounds: 1
            }
        );
        assert_eq!(report.total(), 6);
        assert_eq!(state.element_count(), 0);
        assert_eq!(state.current_room(), None);
        assert_eq!(state.teardown().total(), 0);
    }
}
