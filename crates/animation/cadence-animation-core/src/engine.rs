//! Engine: animation registry and per-tick driver.
//!
//! Methods:
//! - new, create_animation, animation/animation_mut, remove_animation, release
//! - notify_owner_disconnected / notify_owner_connected
//! - update / update_with_inputs (commands → pending jobs → animations → settle → flush)

use hashbrown::HashSet;
use log::{debug, trace, warn};

use crate::accumulate::Accumulator;
use crate::animation::{Animation, PendingJob, TickScope};
use crate::config::Config;
use crate::error::{AnimationError, Result};
use crate::ids::{AnimationId, AuthoringSeq, IdAllocator, OwnerId};
use crate::inputs::{AnimationCommand, Inputs};
use crate::outputs::Outputs;
use crate::property::{PropertyKey, PropertySink};
use cadence_api_core::Value;

#[derive(Debug)]
pub struct Engine {
    // Owned data
    cfg: Config,
    ids: IdAllocator,
    authoring: AuthoringSeq,
    /// Creation order; also the order animations are evaluated in.
    animations: Vec<Animation>,

    // Work that outlived its animation
    orphan_jobs: Vec<PendingJob>,
    /// Discarded properties still being held at their baseline, with frames left.
    settling: Vec<(PropertyKey, u32)>,
    detached_owners: HashSet<OwnerId>,

    // Per-tick
    accum: Accumulator,
    outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        let accum = Accumulator::with_capacity(cfg.scratch_properties);
        Self {
            cfg,
            ids: IdAllocator::new(),
            authoring: AuthoringSeq::default(),
            animations: Vec::new(),
            orphan_jobs: Vec::new(),
            settling: Vec::new(),
            detached_owners: HashSet::new(),
            accum,
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Create a stopped animation of `duration_seconds`. Negative durations clamp to 0.
    pub fn create_animation(&mut self, duration_seconds: f32) -> AnimationId {
        let id = self.ids.alloc_animation();
        self.animations
            .push(Animation::new(id, duration_seconds, &self.cfg, self.authoring.clone()));
        debug!("created {id} ({duration_seconds}s)");
        id
    }

    pub fn animation(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.iter().find(|a| a.id() == id)
    }

    pub fn animation_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
        self.animations.iter_mut().find(|a| a.id() == id)
    }

    #[inline]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn animation_ids(&self) -> Vec<AnimationId> {
        self.animations.iter().map(|a| a.id()).collect()
    }

    /// Drop an animation now. Its end action still lands on the next tick,
    /// without a Finished event.
    pub fn remove_animation(&mut self, id: AnimationId) -> Result<()> {
        let idx = self
            .animations
            .iter()
            .position(|a| a.id() == id)
            .ok_or(AnimationError::AnimationNotFound { id })?;
        let mut animation = self.animations.remove(idx);
        self.orphan_jobs.extend(animation.teardown());
        debug!("removed {id}");
        Ok(())
    }

    /// Give up the handle. A playing animation keeps going and is dropped
    /// once it has stopped.
    pub fn release(&mut self, id: AnimationId) -> Result<()> {
        let animation = self
            .animation_mut(id)
            .ok_or(AnimationError::AnimationNotFound { id })?;
        animation.released = true;
        trace!("released {id}");
        Ok(())
    }

    /// The owner left the scene: its animators apply their animation's
    /// disconnect action on the next tick and then freeze.
    pub fn notify_owner_disconnected(&mut self, owner: OwnerId) {
        if self.detached_owners.insert(owner) {
            debug!("{owner} disconnected");
        }
    }

    /// The owner is back: frozen animators resume from where they stopped.
    pub fn notify_owner_connected(&mut self, owner: OwnerId) {
        if self.detached_owners.remove(&owner) {
            debug!("{owner} connected");
        }
    }

    /// Where `key` ends up once every animation targeting it has completed:
    /// the target of the animator added last, whichever animation holds it.
    pub fn target_value(&self, key: PropertyKey) -> Option<&Value> {
        self.animations
            .iter()
            .filter_map(|a| a.stamped_target(key))
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, v)| v)
    }

    /// True while something still has frames to produce.
    pub fn needs_update(&self) -> bool {
        !self.settling.is_empty()
            || !self.orphan_jobs.is_empty()
            || self.animations.iter().any(Animation::needs_update)
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Advance every animation by `elapsed_ms` of wall-clock time and write
    /// the resulting values into `sink`.
    pub fn update(&mut self, elapsed_ms: f32, sink: &mut dyn PropertySink) -> &Outputs {
        self.update_with_inputs(elapsed_ms, Inputs::default(), sink)
    }

    /// Apply `inputs` in order, then advance like [`Engine::update`].
    pub fn update_with_inputs(
        &mut self,
        elapsed_ms: f32,
        inputs: Inputs,
        sink: &mut dyn PropertySink,
    ) -> &Outputs {
        self.outputs.clear();

        // 1) Commands
        for cmd in inputs.commands {
            self.apply_command(cmd);
        }

        let dt = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0) / 1000.0
        } else {
            warn!("non-finite tick length {elapsed_ms}ms treated as 0");
            0.0
        };

        // 2) Jobs, then animations in creation order
        {
            let mut scope = TickScope {
                sink: &*sink,
                accum: &mut self.accum,
                events: &mut self.outputs.events,
                detached_owners: &self.detached_owners,
                applied: 0,
            };
            for job in self.orphan_jobs.drain(..) {
                job.run(&mut scope);
            }
            for animation in &mut self.animations {
                animation.tick(dt, &mut scope);
            }
            self.outputs.animators_applied = scope.applied;
        }

        // 3) Discarded properties hold their baseline for a few frames. Any
        //    animated write this tick takes precedence, see `hold_baseline`.
        for key in self.accum.take_reverts() {
            let frames = self.cfg.discard_settle_frames.max(1);
            match self.settling.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = frames,
                None => self.settling.push((key, frames)),
            }
        }
        for (key, frames) in &mut self.settling {
            self.accum.hold_baseline(*key, &*sink);
            *frames -= 1;
        }
        self.settling.retain(|(_, frames)| *frames > 0);

        // 4) Write out
        let written = self.accum.flush(sink);
        trace!("tick {dt:.4}s: {written} properties written");

        self.animations.retain(|a| {
            let drop = a.released && a.is_idle();
            if drop {
                debug!("dropped released {}", a.id());
            }
            !drop
        });

        if self.outputs.events.len() > self.cfg.max_events_per_tick {
            warn!(
                "{} events this tick, keeping the first {}",
                self.outputs.events.len(),
                self.cfg.max_events_per_tick
            );
            self.outputs.events.truncate(self.cfg.max_events_per_tick);
        }
        self.outputs.needs_update = self.needs_update();
        &self.outputs
    }

    fn apply_command(&mut self, cmd: AnimationCommand) {
        let id = cmd.animation();
        if let AnimationCommand::Release { .. } = cmd {
            if self.release(id).is_err() {
                warn!("release: unknown {id}");
            }
            return;
        }
        let Some(animation) = self.animation_mut(id) else {
            warn!("command for unknown {id} ignored");
            return;
        };
        match cmd {
            AnimationCommand::Play { .. } => animation.play(),
            AnimationCommand::PlayFrom { progress, .. } => animation.play_from(progress),
            AnimationCommand::PlayAfter { delay_seconds, .. } => animation.play_after(delay_seconds),
            AnimationCommand::Pause { .. } => animation.pause(),
            AnimationCommand::Stop { .. } => animation.stop(),
            AnimationCommand::Clear { .. } => animation.clear(),
            AnimationCommand::SetSpeedFactor { factor, .. } => animation.set_speed_factor(factor),
            AnimationCommand::SetLoopCount { count, .. } => animation.set_loop_count(count),
            AnimationCommand::SetLoopingMode { mode, .. } => animation.set_looping_mode(mode),
            AnimationCommand::SetPlayRange { start, end, .. } => {
                animation.set_play_range(start, end)
            }
            AnimationCommand::SetCurrentProgress { progress, .. } => {
                animation.set_current_progress(progress)
            }
            AnimationCommand::SetEndAction { action, .. } => animation.set_end_action(action),
            AnimationCommand::SetDisconnectAction { action, .. } => {
                animation.set_disconnect_action(action)
            }
            AnimationCommand::SetProgressNotification { progress, .. } => {
                animation.set_progress_notification(progress)
            }
            AnimationCommand::SetBlendPoint { progress, .. } => animation.set_blend_point(progress),
            AnimationCommand::SetDuration { seconds, .. } => animation.set_duration(seconds),
            AnimationCommand::Release { .. } => {}
        }
    }
}
