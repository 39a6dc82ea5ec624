//! # Noodle
//!
//! The runtime of the Noodle 2D engine, built on [`noodle_core`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  load   ┌──────────────────────────────────────────────┐
//! │ game.toml    │────────>│                 GameState                    │
//! └──────────────┘         │  entities │ rooms │ sprites │ sounds         │
//!                          └──────┬─────────────────────────▲─────────────┘
//!                      read-only  │                         │ dispatchers
//!            ┌────────────────────┼───────────┐             │
//!            ▼                    ▼           │    ┌────────┴────────┐
//!   ┌─────────────────┐  ┌─────────────────┐  │    │   UpdateLoop    │
//!   │  render thread  │  │ collect workers │──┼───>│ apply, reversed │
//!   │  Frame/Renderer │  │  step handlers  │  │    └────────▲────────┘
//!   └────────┬────────┘  └─────────────────┘  │             │
//!            │ draw hooks          CommandInbox (deferred)  │
//!            └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `dispatch`: one dispatcher per command
//! - `update`: the two-phase update loop
//! - `render`, `audio`, `input`: collaborator seams
//! - `loader`, `config`: game descriptions
//! - `behaviors`: built-in entity behaviors

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod audio;
pub mod behaviors;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inbox;
pub mod input;
pub mod loader;
pub mod render;
pub mod telemetry;
pub mod tick;
pub mod update;

pub use noodle_core as core;

pub use audio::{AudioSink, SilentAudio};
pub use behaviors::{BehaviorSpec, Drift, Expire, Jingle, Portal, QuitAfter};
pub use config::EngineConfig;
pub use dispatch::{dispatch, DispatchContext, Flow};
pub use error::{LoadError, LoadResult};
pub use inbox::{CommandInbox, CommandSender};
pub use input::{HeldKeys, InputSource, NoInput};
pub use loader::{build, empty_state, load, load_str, GameDescription, LoadedGame};
pub use render::{render_frame, run_render_loop, Frame, NullRenderer, Renderer, SpriteInstance};
pub use tick::{TickClock, TickStats};
pub use update::{LoopStats, Phase, UpdateLoop};
