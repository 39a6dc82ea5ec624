//! # Input Seam
//!
//! The update loop asks an [`InputSource`] once per tick which keys are held
//! and runs every entity's `key_pressed` handler for each of them.

use std::collections::BTreeSet;
use std::sync::Arc;

use noodle_core::KeyCode;
use parking_lot::Mutex;

/// Provider of the keys held during a tick.
pub trait InputSource: Send {
    /// Keys held right now, in a stable order.
    fn held_keys(&self) -> Vec<KeyCode>;
}

/// Source for headless runs: no key is ever held.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn held_keys(&self) -> Vec<KeyCode> {
        Vec::new()
    }
}

/// Key set a platform layer updates from its own thread.
#[derive(Debug, Default)]
pub struct HeldKeys {
    keys: Mutex<BTreeSet<KeyCode>>,
}

impl HeldKeys {
    /// Creates an empty, shareable key set.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records a key going down.
    pub fn press(&self, key: KeyCode) {
        self.keys.lock().insert(key);
    }

    /// Records a key going up.
    pub fn release(&self, key: KeyCode) {
        self.keys.lock().remove(&key);
    }
}

impl InputSource for HeldKeys {
    fn held_keys(&self) -> Vec<KeyCode> {
        self.keys.lock().iter().copied().collect()
    }
}

impl<T: InputSource + Sync + ?Sized> InputSource for Arc<T> {
    fn held_keys(&self) -> Vec<KeyCode> {
        (**self).held_keys()
    }
}
