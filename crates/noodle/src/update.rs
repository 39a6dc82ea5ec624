//! # Update Loop
//!
//! One tick runs in two phases:
//!
//! ```text
//! ┌─────────────── COLLECTING ───────────────┐   ┌──────── APPLYING ────────┐
//! │ snapshot active room's entity list       │   │ deferred inbox batch     │
//! │ for each entity (on a copy):             │──►│ batch[n-1] ... batch[0]  │
//! │   init (first tick) + key_pressed + step │   │ Quit stops everything    │
//! └──────────────────────────────────────────┘   └──────────────────────────┘
//!                                                  then: animate, tick += 1
//! ```
//!
//! Handlers get a read-only [`GameView`] during collecting, so every entity
//! sees the same state no matter how many workers run. Batches are applied in reverse
//! room order: the entity listed first gets the last word.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use noodle_core::{
    Command, CommandBatch, ElementId, GameState, GameView, KeyCode, QuitStatus, Sprite,
};
use tracing::{debug, error, info, trace, warn};

use crate::audio::{AudioSink, SilentAudio};
use crate::dispatch::{dispatch, DispatchContext, Flow};
use crate::inbox::{CommandInbox, CommandSender};
use crate::input::{InputSource, NoInput};
use crate::tick::TickClock;

/// Where the loop is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Running handlers; the state is read-only.
    Collecting,
    /// Dispatching commands.
    Applying,
    /// A Quit was applied or a fatal error occurred. Nothing runs anymore.
    Terminated(QuitStatus),
}

/// Counters kept across ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks completed.
    pub ticks: u64,
    /// Handler runs that produced a batch.
    pub entities_updated: u64,
    /// Listed entities that were gone when their turn came.
    pub entities_skipped: u64,
    /// Commands applied without error.
    pub commands_applied: u64,
    /// Commands whose target was missing.
    pub missing_targets: u64,
}

/// One entity to update during collecting.
#[derive(Clone, Copy, Debug)]
struct Job {
    /// Position in the room's entity list.
    index: usize,
    id: ElementId,
    /// Whether `init` runs before `step`.
    first_tick: bool,
}

/// Drives the game: collect, apply, repeat until Quit.
pub struct UpdateLoop {
    state: Arc<GameState>,
    audio: Box<dyn AudioSink>,
    input: Box<dyn InputSource>,
    inbox: CommandInbox,
    workers: usize,
    phase: Phase,
    initialized: HashSet<ElementId>,
    stats: LoopStats,
}

impl UpdateLoop {
    /// Creates a single-worker loop with silent audio and no input.
    #[must_use]
    pub fn new(state: Arc<GameState>) -> Self {
        Self {
            state,
            audio: Box::new(SilentAudio),
            input: Box::new(NoInput),
            inbox: CommandInbox::new(),
            workers: 1,
            phase: Phase::Collecting,
            initialized: HashSet::new(),
            stats: LoopStats::default(),
        }
    }

    /// Sets how many threads run handlers during collecting (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Replaces the audio sink.
    #[must_use]
    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Replaces the input source.
    #[must_use]
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Returns the state being driven.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &Arc<GameState> {
        &self.state
    }

    /// Returns the current phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Returns the number of collecting workers.
    #[inline]
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Returns a handle for posting batches applied at the next tick.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        self.inbox.sender()
    }

    /// Runs one full tick.
    ///
    /// Returns the quit status once the game is over; every later call
    /// returns the same status without doing anything.
    pub fn tick(&mut self) -> Option<QuitStatus> {
        if let Phase::Terminated(status) = self.phase {
            return Some(status);
        }

        let batches = self.collect();
        if let Some(status) = self.apply(batches) {
            return Some(status);
        }

        self.animate();
        let tick = self.state.advance_tick();
        self.stats.ticks += 1;
        self.phase = Phase::Collecting;
        trace!(tick, "tick complete");
        None
    }

    /// Runs ticks paced by `clock` until the game quits.
    pub fn run(&mut self, clock: &mut TickClock) -> QuitStatus {
        info!(workers = self.workers, period = ?clock.period(), "update loop started");
        loop {
            clock.wait_for_next_tick();
            let start = clock.begin_tick();
            let outcome = self.tick();
            clock.end_tick(start);

            if let Some(status) = outcome {
                let timing = clock.stats();
                info!(
                    ?status,
                    ticks = self.stats.ticks,
                    avg_tick_us = timing.avg_tick_us,
                    late_ticks = timing.late_ticks,
                    "update loop stopped"
                );
                return status;
            }
        }
    }

    /// Phase 1: runs every active entity's handlers and returns one batch
    /// per entry of the room's entity list, in list order.
    ///
    /// Entities that disappeared since the list was taken yield an empty
    /// batch. Nothing is written to the state.
    pub fn collect(&mut self) -> Vec<CommandBatch> {
        if matches!(self.phase, Phase::Terminated(_)) {
            return Vec::new();
        }
        self.phase = Phase::Collecting;

        let snapshot = self.state.active_entities();
        let keys = self.input.held_keys();
        let jobs: Vec<Job> = snapshot
            .iter()
            .enumerate()
            .map(|(index, &id)| Job {
                index,
                id,
                first_tick: !self.initialized.contains(&id),
            })
            .collect();

        let view = self.state.view();
        let results = if self.workers <= 1 || jobs.len() <= 1 {
            jobs.iter().map(|job| run_handlers(view, job, &keys)).collect()
        } else {
            collect_parallel(view, &jobs, &keys, self.workers)
        };

        let mut batches = Vec::with_capacity(jobs.len());
        for (job, result) in jobs.iter().zip(results) {
            if let Some(batch) = result {
                self.initialized.insert(job.id);
                self.stats.entities_updated += 1;
                batches.push(batch);
            } else {
                trace!(id = %job.id, "listed entity missing, skipped");
                self.stats.entities_skipped += 1;
                batches.push(CommandBatch::new());
            }
        }
        batches
    }

    /// Phase 2: applies the deferred inbox, then `batches` in reverse order.
    ///
    /// Returns the quit status if a Quit was applied or a fatal error
    /// forced a teardown.
    pub fn apply(&mut self, batches: Vec<CommandBatch>) -> Option<QuitStatus> {
        if let Phase::Terminated(status) = self.phase {
            return Some(status);
        }
        self.phase = Phase::Applying;

        let deferred = self.inbox.drain();
        let sender = self.inbox.sender();
        let ctx = DispatchContext {
            state: &*self.state,
            audio: self.audio.as_ref(),
            deferred: &sender,
        };

        let ordered = std::iter::once(deferred).chain(batches.into_iter().rev());
        for command in ordered.flatten() {
            let tag = command.tag();
            if let Command::RemoveEntity { target } = &command {
                self.initialized.remove(target);
            }

            match dispatch(&ctx, command) {
                Ok(Flow::Continue) => self.stats.commands_applied += 1,
                Ok(Flow::Quit(status)) => {
                    self.stats.commands_applied += 1;
                    self.initialized.clear();
                    self.phase = Phase::Terminated(status);
                    return Some(status);
                }
                Err(err) if err.is_fatal() => {
                    error!(%err, command = tag, "fatal error while applying, tearing down");
                    let released = self.state.teardown();
                    debug!(released = released.total(), "state released after fatal error");
                    self.initialized.clear();
                    self.phase = Phase::Terminated(QuitStatus::Error);
                    return Some(QuitStatus::Error);
                }
                Err(err) => {
                    self.stats.missing_targets += 1;
                    warn!(%err, command = tag, "command target missing, skipped");
                }
            }
        }
        None
    }

    /// Advances the animation of every sprite in the active room.
    fn animate(&self) {
        let entities = self.state.entities();
        for id in self.state.active_entities() {
            let Ok(sprite) = entities.with(id, |entity| entity.sprite.sprite) else {
                continue;
            };
            let images = self
                .state
                .sprites()
                .with(sprite, Sprite::subimage_count)
                .unwrap_or(0);
            // The entity may have been removed in between; nothing to animate then.
            entities
                .with_mut(id, |entity| entity.sprite.advance(images))
                .ok();
        }
    }
}

impl std::fmt::Debug for UpdateLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateLoop")
            .field("workers", &self.workers)
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Runs one entity's handlers on a copy of it. `None` if it is gone.
fn run_handlers(view: GameView<'_>, job: &Job, keys: &[KeyCode]) -> Option<CommandBatch> {
    let entity = view.entities().get(job.id).ok()?;
    let behavior = &entity.behavior;

    let mut batch = CommandBatch::new();
    if job.first_tick {
        batch.append(behavior.init(&view, &entity));
    }
    for &key in keys {
        batch.append(behavior.key_pressed(&view, &entity, key));
    }
    batch.append(behavior.step(&view, &entity));
    Some(batch)
}

/// Spreads the jobs over `workers` scoped threads and puts the results back
/// in list order.
fn collect_parallel(
    view: GameView<'_>,
    jobs: &[Job],
    keys: &[KeyCode],
    workers: usize,
) -> Vec<Option<CommandBatch>> {
    let (job_tx, job_rx) = unbounded::<&Job>();
    let (result_tx, result_rx) = unbounded();
    for job in jobs {
        if job_tx.send(job).is_err() {
            trace!(id = %job.id, "job channel closed");
        }
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers.min(jobs.len()) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for job in job_rx {
                    let result = run_handlers(view, job, keys);
                    if result_tx.send((job.index, result)).is_err() {
                        trace!(id = %job.id, "result channel closed, batch dropped");
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<Option<CommandBatch>> = (0..jobs.len()).map(|_| None).collect();
    for (index, result) in result_rx.try_iter() {
        results[index] = result;
    }
    results
}
