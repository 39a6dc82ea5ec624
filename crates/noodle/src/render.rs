//! # Render Seam
//!
//! The render loop runs on its own thread next to the update loop. Each
//! frame it reads the active room into a [`Frame`] and hands it to a
//! [`Renderer`]. It never mutates the state: commands returned by the
//! `draw_begin`/`draw_end` handlers are posted to the update loop's inbox.
//!
//! A frame may observe the state halfway through an applying phase. Each
//! entity is read under its bucket lock, so a single sprite instance is
//! always consistent with itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use noodle_core::{
    Camera, CommandBatch, ElementId, Entity, GameState, GameView, Screen, TextureHandle,
};
use tracing::{debug, trace};

use crate::inbox::CommandSender;

/// Active room as seen by a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomView {
    /// Room ID.
    pub id: ElementId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One entity's sprite to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteInstance {
    /// Entity showing the sprite.
    pub entity: ElementId,
    /// Position in room coordinates.
    pub x: i32,
    /// Position in room coordinates.
    pub y: i32,
    /// Sprite shown.
    pub sprite: ElementId,
    /// Subimage shown.
    pub image: u32,
    /// Texture of that subimage, `None` if the sprite or subimage is missing.
    pub texture: Option<TextureHandle>,
}

impl SpriteInstance {
    /// Position relative to the camera.
    #[must_use]
    pub const fn screen_position(&self, camera: Camera) -> (i32, i32) {
        (self.x.saturating_sub(camera.x), self.y.saturating_sub(camera.y))
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Active room, `None` if no room is active.
    pub room: Option<RoomView>,
    /// Window size.
    pub screen: Screen,
    /// Camera position.
    pub camera: Camera,
    /// Sprites in room list order.
    pub instances: Vec<SpriteInstance>,
}

impl Frame {
    /// Reads the active room out of `state`.
    #[must_use]
    pub fn capture(state: &GameState) -> Self {
        let mut frame = Self {
            room: None,
            screen: state.screen(),
            camera: state.camera(),
            instances: Vec::new(),
        };

        let Some(room) = state.current_room() else {
            return frame;
        };
        let Ok((view, members)) = state.rooms().with(room, |r| {
            let view = RoomView {
                id: room,
                width: r.width(),
                height: r.height(),
            };
            (view, r.entity_ids().to_vec())
        }) else {
            return frame;
        };
        frame.room = Some(view);

        for id in members {
            let Ok((x, y, sprite)) = state.entities().with(id, |e| (e.x, e.y, e.sprite)) else {
                continue;
            };
            let texture = state
                .sprites()
                .with(sprite.sprite, |s| s.texture(sprite.image))
                .ok()
                .flatten();
            frame.instances.push(SpriteInstance {
                entity: id,
                x,
                y,
                sprite: sprite.sprite,
                image: sprite.image,
                texture,
            });
        }
        frame
    }

    /// Instances whose position falls inside the camera's view.
    pub fn visible(&self) -> impl Iterator<Item = &SpriteInstance> + '_ {
        let width = i32::try_from(self.screen.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.screen.height).unwrap_or(i32::MAX);
        self.instances.iter().filter(move |instance| {
            let (x, y) = instance.screen_position(self.camera);
            (0..width).contains(&x) && (0..height).contains(&y)
        })
    }
}

/// Drawing backend.
pub trait Renderer: Send {
    /// Draws one frame.
    fn draw(&mut self, frame: &Frame);
}

/// Renderer that only counts frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer {
    frames: u64,
}

impl NullRenderer {
    /// Frames drawn so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for NullRenderer {
    fn draw(&mut self, frame: &Frame) {
        self.frames += 1;
        trace!(
            frame = self.frames,
            sprites = frame.instances.len(),
            visible = frame.visible().count(),
            "frame"
        );
    }
}

#[derive(Clone, Copy)]
enum DrawHook {
    Begin,
    End,
}

fn run_draw_hooks(state: &GameState, deferred: &CommandSender, hook: DrawHook) {
    let view = state.view();
    for id in view.active_entities() {
        let Ok(entity) = view.entities().get(id) else {
            continue;
        };
        let batch = call_hook(&entity, &view, hook);
        deferred.send(batch);
    }
}

fn call_hook(entity: &Entity, view: &GameView<'_>, hook: DrawHook) -> CommandBatch {
    match hook {
        DrawHook::Begin => entity.behavior.draw_begin(view, entity),
        DrawHook::End => entity.behavior.draw_end(view, entity),
    }
}

/// Draws one frame: `draw_begin` hooks, capture, draw, `draw_end` hooks.
pub fn render_frame(state: &GameState, renderer: &mut dyn Renderer, deferred: &CommandSender) {
    run_draw_hooks(state, deferred, DrawHook::Begin);
    let frame = Frame::capture(state);
    renderer.draw(&frame);
    run_draw_hooks(state, deferred, DrawHook::End);
}

/// Draws frames every `frame_time` until `stop` is set. Returns the number
/// of frames drawn.
pub fn run_render_loop(
    state: &GameState,
    renderer: &mut dyn Renderer,
    deferred: &CommandSender,
    stop: &AtomicBool,
    frame_time: Duration,
) -> u64 {
    let mut frames = 0_u64;
    while !stop.load(Ordering::Acquire) {
        let started = Instant::now();
        render_frame(state, renderer, deferred);
        frames += 1;

        if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    debug!(frames, "render loop stopped");
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbox::CommandInbox;
    use noodle_core::{Behavior, Command, EntityData, Room, Sprite, SpriteState};
    use std::sync::Arc;
    use std::thread;

    struct Blink;

    impl Behavior for Blink {
        fn draw_begin(&self, _view: &GameView<'_>, entity: &Entity) -> CommandBatch {
            CommandBatch::from(vec![Command::set_x(entity.id(), entity.x + 1)])
        }

        fn draw_end(&self, _view: &GameView<'_>, entity: &Entity) -> CommandBatch {
            CommandBatch::from(vec![Command::set_y(entity.id(), entity.y + 1)])
        }
    }

    fn scene() -> (GameState, ElementId, ElementId) {
        let state = GameState::new(4, Screen { width: 100, height: 100 });
        let sprite = state
            .sprites()
            .add(Sprite::new(vec![TextureHandle(7), TextureHandle(8)]))
            .unwrap();
        let mut seen = SpriteState::fixed(sprite);
        seen.image = 1;
        let inside = state
            .entities()
            .add(Entity::new(sprite, 10, 10, EntityData::Empty).with_sprite(seen).with_behavior(Blink))
            .unwrap();
        let outside = state
            .entities()
            .add(Entity::new(ElementId::new(999), 500, 10, EntityData::Empty))
            .unwrap();
        let room = state.rooms().add(Room::new(vec![inside, outside], 640, 480)).unwrap();
        state.set_current_room(room);
        (state, inside, outside)
    }

    #[test]
    fn test_capture() {
        let (state, inside, outside) = scene();
        let frame = Frame::capture(&state);

        assert_eq!(frame.room.map(|r| r.width), Some(640));
        assert_eq!(frame.instances.len(), 2);
        assert_eq!(frame.instances[0].entity, inside);
        assert_eq!(frame.instances[0].texture, Some(TextureHandle(8)));
        assert_eq!(frame.instances[1].entity, outside);
        assert_eq!(frame.instances[1].texture, None);

        let visible: Vec<_> = frame.visible().map(|i| i.entity).collect();
        assert_eq!(visible, vec![inside]);
    }

    #[test]
    fn test_capture_without_room() {
        let state = GameState::new(4, Screen::default());
        let frame = Frame::capture(&state);
        assert!(frame.room.is_none());
        assert!(frame.instances.is_empty());
    }

    #[test]
    fn test_render_frame_defers_draw_hooks() {
        let (state, inside, _) = scene();
        let inbox = CommandInbox::new();
        let mut renderer = NullRenderer::default();

        render_frame(&state, &mut renderer, &inbox.sender());

        assert_eq!(renderer.frames(), 1);
        // Nothing was applied: hooks only posted commands.
        assert_eq!(state.entities().with(inside, |e| (e.x, e.y)).unwrap(), (10, 10));
        let tags: Vec<_> = inbox.drain().iter().map(Command::tag).collect();
        assert_eq!(tags, vec!["alter_entity", "alter_entity"]);
    }

    #[test]
    fn test_render_loop_stops() {
        let (state, _, _) = scene();
        let state = Arc::new(state);
        let inbox = CommandInbox::new();
        let sender = inbox.sender();
        let stop = AtomicBool::new(false);

        let frames = thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let mut renderer = NullRenderer::default();
                run_render_loop(&state, &mut renderer, &sender, &stop, Duration::from_millis(1))
            });
            thread::sleep(Duration::from_millis(20));
            stop.store(true, Ordering::Release);
            handle.join().unwrap()
        });

        assert!(frames > 0);
    }
}
