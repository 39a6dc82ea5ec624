//! # Bucketed Concurrent Store
//!
//! Maps an [`ElementId`] to an element, spread over a fixed number of
//! buckets. Each bucket is an owned chain guarded by its own lock:
//!
//! ```text
//!   id % N ──► bucket 0: Mutex<[elem, elem]>
//!              bucket 1: Mutex<[elem]>
//!              bucket 2: Mutex<[]>
//!              ...
//! ```
//!
//! ## Locking rules
//!
//! - Every read and every write takes the bucket lock. There are no
//!   lock-free reads: chains move when elements are removed.
//! - Operations spanning buckets (`ids`, `len`, `for_each_mut`, `drain`) lock
//!   one bucket at a time and never hold two, so they cannot deadlock against
//!   concurrent single-bucket `add`/`delete` calls. Their results are a
//!   best-effort snapshot, not a transaction.
//! - Closures given to `with`/`with_mut` run under the bucket lock. They must
//!   not call back into the same store.

use std::sync::Arc;

use parking_lot::Mutex;

use super::id::{ElementId, IdRegistry};
use crate::element::Element;
use crate::error::{StoreError, StoreResult};

/// Bucket count used when a game description does not specify one.
pub const DEFAULT_BUCKET_COUNT: usize = 64;

/// Concurrent ID → element table with one lock per bucket.
///
/// # Example
///
/// ```rust,ignore
/// let ids = Arc::new(IdRegistry::new());
/// let sounds: Store<Sound> = Store::new(64, ids);
///
/// let id = sounds.add(Sound::new("theme.ogg", -6))?;
/// let volume = sounds.with(id, |s| s.volume())?;
/// ```
pub struct Store<T: Element> {
    /// One chain per bucket, each behind its own lock.
    buckets: Box<[Mutex<Vec<T>>]>,
    /// Shared ID counter.
    ids: Arc<IdRegistry>,
}

impl<T: Element> Store<T> {
    /// Creates an empty store drawing IDs from a shared registry.
    ///
    /// A `bucket_count` of zero is raised to one.
    #[must_use]
    pub fn new(bucket_count: usize, ids: Arc<IdRegistry>) -> Self {
        let buckets = (0..bucket_count.max(1))
            .map(|_| Mutex::new(Vec::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { buckets, ids }
    }

    /// Creates an empty store with a registry of its own.
    #[must_use]
    pub fn with_own_registry(bucket_count: usize) -> Self {
        Self::new(bucket_count, Arc::new(IdRegistry::new()))
    }

    /// Returns the number of buckets.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the bucket an ID hashes to.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bucket_of(&self, id: ElementId) -> usize {
        // The remainder is below `bucket_count`, which is a usize.
        (id.raw() % self.buckets.len() as u64) as usize
    }

    /// Returns the registry this store draws IDs from.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<IdRegistry> {
        &self.ids
    }

    /// Registers an element, overwriting whatever ID it carried.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AllocationFailure`] if the bucket chain cannot
    /// grow. The ID stays consumed.
    pub fn add(&self, mut elem: T) -> StoreResult<ElementId> {
        let id = self.ids.next_id();
        elem.assign_id(id);

        let bucket = self.bucket_of(id);
        let mut chain = self.buckets[bucket].lock();
        chain
            .try_reserve(1)
            .map_err(|_| StoreError::AllocationFailure { kind: T::KIND, id })?;
        chain.push(elem);
        drop(chain);

        tracing::trace!(kind = %T::KIND, %id, bucket, "element added");
        Ok(id)
    }

    /// Returns a copy of the element with this ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such element exists.
    pub fn get(&self, id: ElementId) -> StoreResult<T>
    where
        T: Clone,
    {
        self.with(id, T::clone)
    }

    /// Runs `f` on the element with this ID while its bucket is locked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such element exists.
    pub fn with<R>(&self, id: ElementId, f: impl FnOnce(&T) -> R) -> StoreResult<R> {
        let chain = self.buckets[self.bucket_of(id)].lock();
        chain
            .iter()
            .find(|elem| elem.id() == id)
            .map(f)
            .ok_or(StoreError::NotFound { kind: T::KIND, id })
    }

    /// Runs `f` on the element with this ID, mutably, while its bucket is locked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such element exists.
    pub fn with_mut<R>(&self, id: ElementId, f: impl FnOnce(&mut T) -> R) -> StoreResult<R> {
        let mut chain = self.buckets[self.bucket_of(id)].lock();
        chain
            .iter_mut()
            .find(|elem| elem.id() == id)
            .map(f)
            .ok_or(StoreError::NotFound { kind: T::KIND, id })
    }

    /// Unlinks the element with this ID and hands it back.
    ///
    /// The store owns nothing else of the element, so dropping the returned
    /// value releases everything it held.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such element exists.
    pub fn delete(&self, id: ElementId) -> StoreResult<T> {
        let bucket = self.bucket_of(id);
        let mut chain = self.buckets[bucket].lock();
        let position = chain
            .iter()
            .position(|elem| elem.id() == id)
            .ok_or(StoreError::NotFound { kind: T::KIND, id })?;
        let elem = chain.swap_remove(position);
        drop(chain);

        tracing::trace!(kind = %T::KIND, %id, bucket, "element deleted");
        Ok(elem)
    }

    /// Checks whether an element with this ID is present.
    ///
    /// Only the owning bucket can hold the ID, so only that bucket is locked.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.buckets[self.bucket_of(id)]
            .lock()
            .iter()
            .any(|elem| elem.id() == id)
    }

    /// Returns every ID in the store.
    ///
    /// Buckets are scanned one at a time, so concurrent mutation may be
    /// partially reflected.
    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids = Vec::new();
        for bucket in self.buckets.iter() {
            ids.extend(bucket.lock().iter().map(Element::id));
        }
        ids
    }

    /// Returns the number of elements (sum of chain lengths).
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.lock().len()).sum()
    }

    /// Returns true if no bucket holds an element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.lock().is_empty())
    }

    /// Visits every element mutably, one bucket lock at a time.
    pub fn for_each_mut(&self, mut f: impl FnMut(&mut T)) {
        for bucket in self.buckets.iter() {
            bucket.lock().iter_mut().for_each(&mut f);
        }
    }

    /// Empties every bucket, one at a time, and returns what was in them.
    pub fn drain(&self) -> Vec<T> {
        let mut drained = Vec::new();
        for bucket in self.buckets.iter() {
            drained.append(&mut bucket.lock());
        }
        drained
    }
}

impl<T: Element> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("kind", &T::KIND)
            .field("buckets", &self.buckets.len())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Room, Sound};
    use crossbeam_channel::bounded;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    fn room(width: u32) -> Room {
        Room::new(Vec::new(), width, width)
    }

    #[test]
    fn test_store_scenario_four_buckets() {
        let store: Store<Room> = Store::with_own_registry(4);
        let added: Vec<_> = (1..=5).map(|w| store.add(room(w)).unwrap()).collect();
        assert_eq!(added, (1..=5).map(ElementId::new).collect::<Vec<_>>());

        let listed: HashSet<_> = store.ids().into_iter().collect();
        assert_eq!(listed, added.iter().copied().collect::<HashSet<_>>());

        let third = store.get(ElementId::new(3)).unwrap();
        assert_eq!(third.id(), ElementId::new(3));
        assert_eq!(third.width(), 3);

        store.delete(ElementId::new(3)).unwrap();
        assert!(!store.contains(ElementId::new(3)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_add_overwrites_id() {
        let store: Store<Sound> = Store::with_own_registry(8);
        let mut sound = Sound::new("boom.wav", 3);
        sound.assign_id(ElementId::new(999));

        let id = store.add(sound.clone()).unwrap();
        assert_eq!(id, ElementId::new(1));

        let stored = store.get(id).unwrap();
        assert_eq!(stored.path(), sound.path());
        assert_eq!(stored.volume(), sound.volume());
        assert_eq!(stored.id(), id);
    }

    #[test]
    fn test_delete_then_lookup() {
        let store: Store<Sound> = Store::with_own_registry(2);
        let id = store.add(Sound::new("a.ogg", 0)).unwrap();

        let removed = store.delete(id).unwrap();
        assert_eq!(removed.id(), id);

        assert!(store.get(id).unwrap_err().is_not_found());
        assert!(!store.contains(id));
        assert!(store.delete(id).unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_buckets_raised_to_one() {
        let store: Store<Sound> = Store::with_own_registry(0);
        assert_eq!(store.bucket_count(), 1);

        let id = store.add(Sound::new("a.ogg", 0)).unwrap();
        assert_eq!(store.bucket_of(id), 0);
        assert!(store.contains(id));

        let state = crate::state::GameState::new(0, crate::state::Screen::default());
        assert_eq!(state.entities().bucket_count(), 1);
    }

    #[test]
    fn test_with_mut_updates_in_place() {
        let store: Store<Room> = Store::with_own_registry(4);
        let id = store.add(room(10)).unwrap();

        store.with_mut(id, |r| r.set_width(42)).unwrap();
        assert_eq!(store.with(id, Room::width).unwrap(), 42);

        let missing = store.with_mut(ElementId::new(77), |r| r.set_width(1));
        assert_eq!(
            missing.unwrap_err(),
            StoreError::NotFound { kind: crate::element::ElementKind::Room, id: ElementId::new(77) }
        );
    }

    #[test]
    fn test_for_each_mut_and_drain() {
        let store: Store<Room> = Store::with_own_registry(3);
        for w in 0..10 {
            store.add(room(w)).unwrap();
        }

        store.for_each_mut(|r| r.set_height(5));
        assert!(store.ids().iter().all(|id| store.with(*id, Room::height).unwrap() == 5));

        let drained = store.drain();
        assert_eq!(drained.len(), 10);
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_concurrent_adds_unique() {
        let store: Arc<Store<Sound>> = Arc::new(Store::with_own_registry(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..250)
                        .map(|i| store.add(Sound::new(format!("{t}-{i}.wav"), 0)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(store.len(), 2000);
        assert!(seen.iter().all(|id| store.contains(*id)));
    }

    #[test]
    fn test_bucket_independence() {
        let store: Arc<Store<Room>> = Arc::new(Store::with_own_registry(4));
        let held = store.add(room(1)).unwrap();
        assert_eq!(store.bucket_of(held), 1);

        // Park a thread inside bucket 1's lock.
        let (locked_tx, locked_rx) = bounded::<()>(0);
        let (release_tx, release_rx) = bounded::<()>(0);
        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .with_mut(held, |_| {
                        locked_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    })
                    .unwrap();
            })
        };
        locked_rx.recv().unwrap();

        // ID 2 lands in bucket 2 and must not wait for bucket 1.
        let (done_tx, done_rx) = bounded(1);
        {
            let store = Arc::clone(&store);
            thread::spawn(move || done_tx.send(store.add(room(2)).unwrap()).unwrap());
        }
        let free = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("add to an unlocked bucket was blocked");
        assert_eq!(store.bucket_of(free), 2);

        // IDs 3 and 4 fill buckets 3 and 0; ID 5 maps back onto bucket 1.
        store.add(room(3)).unwrap();
        store.add(room(4)).unwrap();
        assert_eq!(store.registry().peek_next(), ElementId::new(5));

        let (late_tx, late_rx) = bounded(1);
        {
            let store = Arc::clone(&store);
            thread::spawn(move || late_tx.send(store.add(room(5)).unwrap()).unwrap());
        }
        assert!(late_rx.recv_timeout(Duration::from_millis(100)).is_err());

        release_tx.send(()).unwrap();
        let serialized = late_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("add never completed after the bucket was released");
        assert_eq!(serialized, ElementId::new(5));
        assert_eq!(store.bucket_of(serialized), 1);

        holder.join().unwrap();
        assert_eq!(store.len(), 5);
    }
}
