//! # Game Loader
//!
//! Builds a populated [`GameState`] from a TOML game description:
//!
//! ```toml
//! start_room = "hall"
//!
//! [engine]
//! workers = 2
//!
//! [[sprites]]
//! name = "ball"
//! textures = [1, 2, 3]
//!
//! [[rooms]]
//! name = "hall"
//! width = 640
//! height = 480
//!
//! [[rooms.entities]]
//! sprite = "ball"
//! x = 10
//! period = 4
//! behavior = { kind = "drift", dx = 1 }
//! ```
//!
//! Sprites, sounds and rooms are referred to by name; IDs are handed out in
//! file order: sprites, sounds, rooms, then each room's entities.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use noodle_core::{
    Camera, ElementId, Entity, EntityData, GameState, Room, Screen, Sound, Sprite, SpriteState,
    TextureHandle,
};
use serde::Deserialize;
use tracing::info;

use crate::behaviors::BehaviorSpec;
use crate::config::EngineConfig;
use crate::error::{LoadError, LoadResult};

/// A whole game description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameDescription {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Window size.
    pub screen: Screen,
    /// Initial camera position.
    pub camera: Camera,
    /// Room active at start; the first room if omitted.
    pub start_room: Option<String>,
    /// Sprite definitions.
    pub sprites: Vec<SpriteSpec>,
    /// Sound definitions.
    pub sounds: Vec<SoundSpec>,
    /// Room definitions with their entities.
    pub rooms: Vec<RoomSpec>,
}

/// `[[sprites]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteSpec {
    /// Name entities use to refer to the sprite.
    pub name: String,
    /// Texture handle of each subimage.
    #[serde(default)]
    pub textures: Vec<u32>,
}

/// `[[sounds]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoundSpec {
    /// Name behaviors use to refer to the sound.
    pub name: String,
    /// Audio file.
    pub path: PathBuf,
    /// Playback volume.
    #[serde(default)]
    pub volume: i32,
}

/// `[[rooms]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomSpec {
    /// Name used by `start_room` and portals.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Entities placed in the room, in update order.
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

/// `[[rooms.entities]]` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntitySpec {
    /// Sprite name; no sprite if omitted.
    pub sprite: Option<String>,
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Frames per subimage; a still image if omitted.
    pub period: Option<u32>,
    /// Event handlers.
    pub behavior: BehaviorSpec,
    /// Scratch payload.
    pub data: EntityData,
}

/// A loaded game, ready to run.
#[derive(Debug)]
pub struct LoadedGame {
    /// The populated state.
    pub state: Arc<GameState>,
    /// Engine settings from the description.
    pub config: EngineConfig,
}

/// Reads and builds a game description file.
///
/// # Errors
///
/// [`LoadError::Io`] or [`LoadError::Parse`] if the file cannot be read or
/// parsed, anything [`build`] returns otherwise.
pub fn load(path: impl AsRef<Path>) -> LoadResult<LoadedGame> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let description: GameDescription = toml::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "game description read");
    build(&description)
}

/// Parses and builds a game description held in memory.
///
/// # Errors
///
/// [`LoadError::Parse`] if `text` is not a valid description, anything
/// [`build`] returns otherwise.
pub fn load_str(text: &str) -> LoadResult<LoadedGame> {
    let description: GameDescription = toml::from_str(text).map_err(|source| LoadError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    build(&description)
}

/// Populates a fresh game state from a parsed description.
///
/// # Errors
///
/// [`LoadError::Invalid`] for bad settings, duplicate names or unknown
/// references. [`LoadError::Store`] if a store cannot grow.
pub fn build(description: &GameDescription) -> LoadResult<LoadedGame> {
    description.engine.validate()?;

    let state = GameState::new(description.engine.buckets, description.screen);
    state.set_camera(description.camera);

    let mut sprites = HashMap::new();
    for spec in &description.sprites {
        let textures = spec.textures.iter().copied().map(TextureHandle).collect();
        let id = state.sprites().add(Sprite::new(textures))?;
        register("sprite", &mut sprites, &spec.name, id)?;
    }

    let mut sounds = HashMap::new();
    for spec in &description.sounds {
        let id = state.sounds().add(Sound::new(spec.path.clone(), spec.volume))?;
        register("sound", &mut sounds, &spec.name, id)?;
    }

    let mut rooms = HashMap::new();
    let mut room_ids = Vec::with_capacity(description.rooms.len());
    for spec in &description.rooms {
        let id = state.rooms().add(Room::new(Vec::new(), spec.width, spec.height))?;
        register("room", &mut rooms, &spec.name, id)?;
        room_ids.push(id);
    }

    for (spec, &room) in description.rooms.iter().zip(&room_ids) {
        for entity_spec in &spec.entities {
            let entity = entity_from_spec(entity_spec, &sprites, &rooms, &sounds)?;
            let id = state.entities().add(entity)?;
            state.rooms().with_mut(room, |r| r.place(id))?;
        }
    }

    let start = match &description.start_room {
        Some(name) => Some(rooms.get(name).copied().ok_or_else(|| {
            LoadError::Invalid(format!("start_room `{name}` is not a room"))
        })?),
        None => room_ids.first().copied(),
    };
    if let Some(room) = start {
        state.set_current_room(room);
    }

    info!(
        sprites = state.sprites().len(),
        sounds = state.sounds().len(),
        rooms = state.rooms().len(),
        entities = state.entities().len(),
        start_room = ?start,
        "game loaded"
    );

    Ok(LoadedGame {
        state: Arc::new(state),
        config: description.engine.clone(),
    })
}

/// A game state with nothing in it.
#[must_use]
pub fn empty_state(config: &EngineConfig) -> GameState {
    GameState::new(config.buckets, Screen::default())
}

fn register(
    kind: &str,
    names: &mut HashMap<String, ElementId>,
    name: &str,
    id: ElementId,
) -> LoadResult<()> {
    if names.insert(name.to_string(), id).is_some() {
        return Err(LoadError::Invalid(format!("duplicate {kind} name `{name}`")));
    }
    Ok(())
}

fn entity_from_spec(
    spec: &EntitySpec,
    sprites: &HashMap<String, ElementId>,
    rooms: &HashMap<String, ElementId>,
    sounds: &HashMap<String, ElementId>,
) -> LoadResult<Entity> {
    let sprite = match &spec.sprite {
        Some(name) => sprites
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::Invalid(format!("unknown sprite `{name}`")))?,
        None => ElementId::UNASSIGNED,
    };
    let animation = match spec.period {
        Some(period) => SpriteState::animated(sprite, period),
        None => SpriteState::fixed(sprite),
    };
    let behavior = spec.behavior.build(rooms, sounds)?;

    Ok(Entity::new(sprite, spec.x, spec.y, spec.data.clone())
        .with_sprite(animation)
        .with_shared_behavior(behavior))
}
