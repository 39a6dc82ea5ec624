//! # Read-Only Game View
//!
//! What an entity handler is allowed to see of the game. A [`GameView`]
//! borrows a [`GameState`] and only forwards lookups: no store can be
//! added to or deleted from through it, no element can be mutated, and the
//! active room, camera and tick count can only be read.
//!
//! Mutation stays with the dispatchers and the loader, which hold the
//! [`GameState`] itself.
//!
//! ```
//! use noodle_core::{Entity, EntityData, ElementId, GameState, Screen};
//!
//! let state = GameState::new(4, Screen::default());
//! let id = state
//!     .entities()
//!     .add(Entity::new(ElementId::UNASSIGNED, 3, 4, EntityData::Empty))
//!     .unwrap();
//!
//! let view = state.view();
//! assert!(view.entities().contains(id));
//! assert_eq!(view.entities().with(id, |e| e.x), Ok(3));
//! ```
//!
//! A handler holding a view cannot remove anything:
//!
//! ```compile_fail
//! use noodle_core::{ElementId, GameState, Screen};
//!
//! let state = GameState::new(4, Screen::default());
//! let view = state.view();
//! let _ = view.entities().delete(ElementId::new(1));
//! ```
//!
//! Nor move the camera or switch rooms:
//!
//! ```compile_fail
//! use noodle_core::{Camera, GameState, Screen};
//!
//! let state = GameState::new(4, Screen::default());
//! let view = state.view();
//! view.set_camera(Camera { x: 1, y: 1 });
//! ```

use crate::element::{Element, Entity, Room, Sound, Sprite};
use crate::error::StoreResult;
use crate::state::{Camera, GameState, Screen};
use crate::store::{ElementId, Store};

/// Read-only access to a [`GameState`], handed to entity handlers.
#[derive(Clone, Copy)]
pub struct GameView<'a> {
    state: &'a GameState,
}

impl<'a> GameView<'a> {
    /// Wraps a game state.
    #[inline]
    #[must_use]
    pub const fn new(state: &'a GameState) -> Self {
        Self { state }
    }

    /// Returns the entity store, read-only.
    #[inline]
    #[must_use]
    pub const fn entities(&self) -> StoreView<'a, Entity> {
        StoreView::new(self.state.entities())
    }

    /// Returns the room store, read-only.
    #[inline]
    #[must_use]
    pub const fn rooms(&self) -> StoreView<'a, Room> {
        StoreView::new(self.state.rooms())
    }

    /// Returns the sprite store, read-only.
    #[inline]
    #[must_use]
    pub const fn sprites(&self) -> StoreView<'a, Sprite> {
        StoreView::new(self.state.sprites())
    }

    /// Returns the sound store, read-only.
    #[inline]
    #[must_use]
    pub const fn sounds(&self) -> StoreView<'a, Sound> {
        StoreView::new(self.state.sounds())
    }

    /// Returns the screen size.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.state.screen()
    }

    /// Returns the camera position.
    ///
    /// The camera is placed by the loader and the host application; the
    /// renderer reads it. Handlers only observe it.
    #[inline]
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.state.camera()
    }

    /// Returns the active room, if any.
    #[inline]
    #[must_use]
    pub fn current_room(&self) -> Option<ElementId> {
        self.state.current_room()
    }

    /// Snapshot of the active room's entity list.
    #[must_use]
    pub fn active_entities(&self) -> Vec<ElementId> {
        self.state.active_entities()
    }

    /// Returns the number of completed ticks.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.state.ticks()
    }

    /// Returns the largest ID ever assigned.
    #[inline]
    #[must_use]
    pub fn max_id(&self) -> ElementId {
        self.state.max_id()
    }
}

impl std::fmt::Debug for GameView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GameView").field(self.state).finish()
    }
}

/// Lookups on one store, without `add`, `with_mut` or `delete`.
pub struct StoreView<'a, T: Element> {
    store: &'a Store<T>,
}

impl<T: Element> Clone for StoreView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for StoreView<'_, T> {}

impl<'a, T: Element> StoreView<'a, T> {
    const fn new(store: &'a Store<T>) -> Self {
        Self { store }
    }

    /// Returns a copy of the element with this ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] if no such element exists.
    pub fn get(&self, id: ElementId) -> StoreResult<T>
    where
        T: Clone,
    {
        self.store.get(id)
    }

    /// Runs `f` on the element with this ID while its bucket is locked.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] if no such element exists.
    pub fn with<R>(&self, id: ElementId, f: impl FnOnce(&T) -> R) -> StoreResult<R> {
        self.store.with(id, f)
    }

    /// Checks whether an element with this ID is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.store.contains(id)
    }

    /// Returns every ID in the store.
    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        self.store.ids()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<T: Element> std::fmt::Debug for StoreView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StoreView").field(self.store).finish()
    }
}
