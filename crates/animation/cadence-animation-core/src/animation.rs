//! Animation: the timeline controller.
//!
//! Owns a set of animators, a duration, loop settings, a play range and a
//! speed factor, and runs the play/pause/stop state machine. Each tick it
//! advances its elapsed time, wraps or finishes at the range boundaries, and
//! evaluates every animator at the resulting position.
//!
//! Elapsed time is kept in seconds on the animation's own timeline. With
//! `AutoReverse`, odd loops mirror the position inside the play range.

use std::cmp::Ordering;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::accumulate::Accumulator;
use crate::alpha::AlphaFunction;
use crate::animator::{check_target, Animator, AnimatorCfg, AnimatorSource};
use crate::config::Config;
use crate::error::{AnimationError, Result};
use crate::ids::{AnimationId, AuthoringSeq, OwnerId};
use crate::keyframes::KeyFrames;
use crate::outputs::AnimationEvent;
use crate::path::{Path, Vec3};
use crate::property::{PropertyKey, PropertyRef, PropertySink};
use crate::time::{fmod, wrap_count, PlayRange, TimePeriod};
use cadence_api_core::blend::blend_values;
use cadence_api_core::Value;

/// Value policy applied when an animation ends, or when an animated owner
/// leaves the scene.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndAction {
    /// Keep the value reached when playback stopped.
    #[default]
    Bake,
    /// Snap to the value at the end of the last loop.
    BakeFinal,
    /// Return to the value held before the animation ran.
    Discard,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopingMode {
    /// Every loop replays from the start of the range.
    #[default]
    Restart,
    /// Loops alternate direction.
    AutoReverse,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Work queued by stop/clear/removal, carried out at the start of the next tick.
#[derive(Clone, Debug)]
pub(crate) struct PendingJob {
    animation: AnimationId,
    bakes: Vec<(Animator, f32)>,
    reverts: Vec<PropertyKey>,
    finished: bool,
}

impl PendingJob {
    fn is_empty(&self) -> bool {
        self.bakes.is_empty() && self.reverts.is_empty() && !self.finished
    }

    pub(crate) fn run(self, scope: &mut TickScope<'_>) {
        for (animator, progress) in &self.bakes {
            let key = animator.property().key();
            let Some(running) = scope.accum.running(key, scope.sink) else {
                continue;
            };
            if let Some(value) = animator.apply(&running, *progress) {
                scope.accum.bake(key, value);
                scope.applied += 1;
            }
        }
        for key in self.reverts {
            scope.accum.revert(key);
        }
        if self.finished {
            scope.events.push(AnimationEvent::Finished {
                animation: self.animation,
            });
        }
    }
}

/// Everything an animation touches during one tick.
pub(crate) struct TickScope<'a> {
    pub(crate) sink: &'a dyn PropertySink,
    pub(crate) accum: &'a mut Accumulator,
    pub(crate) events: &'a mut Vec<AnimationEvent>,
    pub(crate) detached_owners: &'a HashSet<OwnerId>,
    pub(crate) applied: usize,
}

impl TickScope<'_> {
    fn is_connected(&self, owner: OwnerId) -> bool {
        !self.detached_owners.contains(&owner) && self.sink.is_connected(owner)
    }
}

enum Step {
    Running,
    Looped,
    Finished,
}

#[derive(Debug)]
pub struct Animation {
    id: AnimationId,
    duration: f32,
    loop_count: u32,
    current_loop: u32,
    looping_mode: LoopingMode,
    play_range: PlayRange,
    speed_factor: f32,
    end_action: EndAction,
    disconnect_action: EndAction,
    default_alpha: AlphaFunction,
    state: PlayState,
    played_count: u32,

    /// Seconds on the animation timeline, before mirroring.
    elapsed: f32,
    /// Wall-clock seconds left before a delayed play starts.
    delay_remaining: f32,
    /// Frames may have been produced since the last stop.
    session_started: bool,
    first_tick: bool,
    finish_deferred: bool,

    progress_marker: Option<f32>,
    marker_armed: bool,

    blend_point: f32,
    capture_blend: bool,
    blend_baselines: HashMap<PropertyKey, Value>,

    animators: Vec<Animator>,
    /// Final value per property, stamped with the addition that produced it.
    targets: HashMap<PropertyKey, (u64, Value)>,
    authoring: AuthoringSeq,
    pending: Vec<PendingJob>,
    pub(crate) released: bool,
}

impl Animation {
    pub(crate) fn new(
        id: AnimationId,
        duration: f32,
        cfg: &Config,
        authoring: AuthoringSeq,
    ) -> Self {
        let duration = if duration.is_finite() && duration >= 0.0 {
            duration
        } else {
            warn!("{id}: duration {duration} clamped to 0");
            0.0
        };
        Self {
            id,
            duration,
            loop_count: 1,
            current_loop: 0,
            looping_mode: LoopingMode::Restart,
            play_range: PlayRange::FULL,
            speed_factor: 1.0,
            end_action: cfg.default_end_action,
            disconnect_action: cfg.default_disconnect_action,
            default_alpha: cfg.default_alpha.into(),
            state: PlayState::Stopped,
            played_count: 0,
            elapsed: 0.0,
            delay_remaining: 0.0,
            session_started: false,
            first_tick: false,
            finish_deferred: false,
            progress_marker: None,
            marker_armed: false,
            blend_point: 0.0,
            capture_blend: false,
            blend_baselines: HashMap::new(),
            animators: Vec::new(),
            targets: HashMap::new(),
            authoring,
            pending: Vec::new(),
            released: false,
        }
    }

    // ---- queries -------------------------------------------------------

    #[inline]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Seconds. Grows to cover every animator's window.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// 0 loops forever.
    #[inline]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn is_looping(&self) -> bool {
        self.loop_count != 1
    }

    /// Loop boundaries crossed since play started; saturates at a finite loop count.
    #[inline]
    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    #[inline]
    pub fn looping_mode(&self) -> LoopingMode {
        self.looping_mode
    }

    pub fn play_range(&self) -> (f32, f32) {
        (self.play_range.start, self.play_range.end)
    }

    #[inline]
    pub fn end_action(&self) -> EndAction {
        self.end_action
    }

    #[inline]
    pub fn disconnect_action(&self) -> EndAction {
        self.disconnect_action
    }

    pub fn default_alpha(&self) -> AlphaFunction {
        self.default_alpha
    }

    pub fn progress_notification(&self) -> Option<f32> {
        self.progress_marker
    }

    #[inline]
    pub fn blend_point(&self) -> f32 {
        self.blend_point
    }

    /// Completed play sessions, natural or stopped.
    #[inline]
    pub fn played_count(&self) -> u32 {
        self.played_count
    }

    pub fn animators(&self) -> &[Animator] {
        &self.animators
    }

    #[inline]
    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    /// What `key` ends up as once this animation completes, as implied by the
    /// last animator added for it.
    pub fn target_value(&self, key: PropertyKey) -> Option<&Value> {
        self.targets.get(&key).map(|(_, v)| v)
    }

    /// Target together with the engine-wide sequence number of the addition
    /// that set it.
    pub(crate) fn stamped_target(&self, key: PropertyKey) -> Option<(u64, &Value)> {
        self.targets.get(&key).map(|(seq, v)| (*seq, v))
    }

    /// Position in `[0,1]` of the full duration.
    pub fn current_progress(&self) -> f32 {
        if self.duration > 0.0 {
            self.position() / self.duration
        } else {
            self.play_range.start
        }
    }

    pub(crate) fn needs_update(&self) -> bool {
        self.state != PlayState::Stopped || !self.pending.is_empty()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state == PlayState::Stopped && self.pending.is_empty()
    }

    // ---- timeline math -------------------------------------------------

    fn range_seconds(&self) -> (f32, f32) {
        self.play_range.to_seconds(self.duration)
    }

    #[inline]
    fn forward(&self) -> bool {
        self.speed_factor > 0.0
    }

    fn mirrored_on(&self, pass: u32) -> bool {
        self.looping_mode == LoopingMode::AutoReverse && pass % 2 == 1
    }

    #[inline]
    fn mirrored(&self) -> bool {
        self.mirrored_on(self.current_loop)
    }

    /// Whether the visible position is moving towards the end of the range.
    fn travels_up(&self) -> bool {
        self.forward() != self.mirrored()
    }

    fn position_of(&self, elapsed: f32, mirrored: bool) -> f32 {
        let (lo, hi) = self.range_seconds();
        let e = elapsed.clamp(lo, hi);
        if mirrored {
            lo + hi - e
        } else {
            e
        }
    }

    /// Visible position in seconds, confined to the play range.
    fn position(&self) -> f32 {
        self.position_of(self.elapsed, self.mirrored())
    }

    /// Where the last loop ends, in the current direction of play.
    fn final_position(&self) -> f32 {
        let (lo, hi) = self.range_seconds();
        let raw = if self.forward() { hi } else { lo };
        let last_pass = if self.loop_count == 0 {
            self.current_loop
        } else {
            self.loop_count - 1
        };
        self.position_of(raw, self.mirrored_on(last_pass))
    }

    fn loops_remaining(&self) -> Option<u32> {
        if self.loop_count == 0 {
            None
        } else {
            Some(
                self.loop_count
                    .saturating_sub(1)
                    .saturating_sub(self.current_loop),
            )
        }
    }

    /// Wrap or finish after elapsed time moved. Boundaries are strict: sitting
    /// exactly on the end of the range is still inside it.
    fn wrap_or_finish(&mut self) -> Step {
        let (lo, hi) = self.range_seconds();
        let span = hi - lo;
        let forward = self.forward();
        let overshoot = if forward {
            self.elapsed - hi
        } else {
            lo - self.elapsed
        };
        let crossings = wrap_count(overshoot, span);
        if crossings == 0 {
            return Step::Running;
        }
        match self.loops_remaining() {
            Some(left) if crossings > left => {
                self.current_loop += left;
                self.elapsed = if forward { hi } else { lo };
                Step::Finished
            }
            _ => {
                self.current_loop = self.current_loop.saturating_add(crossings);
                let rem = fmod(overshoot, span);
                self.elapsed = if forward { lo + rem } else { hi - rem };
                Step::Looped
            }
        }
    }

    /// Marker in seconds, if it can be reached inside the play range.
    fn marker_seconds(&self) -> Option<f32> {
        match self.progress_marker {
            Some(p) if self.duration > 0.0 && self.play_range.contains(p) => Some(p * self.duration),
            _ => None,
        }
    }

    /// Arm only if the marker still lies ahead of the playhead.
    fn arm_marker(&mut self) {
        self.marker_armed = match self.marker_seconds() {
            Some(marker) => {
                let pos = self.position();
                if self.travels_up() {
                    pos < marker
                } else {
                    pos > marker
                }
            }
            None => false,
        };
    }

    fn check_marker(&mut self, events: &mut Vec<AnimationEvent>) {
        if !self.marker_armed {
            return;
        }
        let Some(p) = self.progress_marker else {
            return;
        };
        let marker = p * self.duration;
        let (lo, hi) = self.range_seconds();
        let pos = if self.mirrored() {
            lo + hi - self.elapsed
        } else {
            self.elapsed
        };
        let reached = if self.travels_up() {
            pos >= marker
        } else {
            pos <= marker
        };
        if reached {
            self.marker_armed = false;
            debug!("{}: progress {p} reached", self.id);
            events.push(AnimationEvent::ProgressReached {
                animation: self.id,
                progress: p,
            });
        }
    }

    // ---- state machine -------------------------------------------------

    /// Common entry from Stopped: order animators, rewind and arm.
    fn start(&mut self) {
        self.animators.sort_by(|a, b| {
            a.period()
                .end()
                .partial_cmp(&b.period().end())
                .unwrap_or(Ordering::Equal)
        });
        let (lo, hi) = self.range_seconds();
        if self.speed_factor < 0.0 && self.elapsed <= lo {
            self.elapsed = hi;
        }
        self.current_loop = 0;
        self.first_tick = true;
        self.finish_deferred = false;
        for animator in &mut self.animators {
            animator.reset_session();
        }
        self.blend_baselines.clear();
        self.capture_blend = self.blend_point > 0.0;
        self.state = PlayState::Playing;
        self.arm_marker();
    }

    fn rewind(&mut self) {
        let (lo, _) = self.range_seconds();
        self.state = PlayState::Stopped;
        self.elapsed = lo;
        self.current_loop = 0;
        self.delay_remaining = 0.0;
        self.session_started = false;
        self.first_tick = false;
        self.finish_deferred = false;
        self.marker_armed = false;
        for animator in &mut self.animators {
            animator.reset_session();
        }
    }

    /// Start or resume. A no-op while already playing.
    pub fn play(&mut self) {
        match self.state {
            PlayState::Playing => trace!("{}: play ignored, already playing", self.id),
            PlayState::Paused => {
                self.state = PlayState::Playing;
                debug!("{}: resumed", self.id);
            }
            PlayState::Stopped => {
                self.start();
                self.session_started = true;
                debug!("{}: play from {:.3}", self.id, self.current_progress());
            }
        }
    }

    /// Play from `progress`, given in play-range local coordinates.
    /// Ignored when `progress` is outside `[0,1]`.
    pub fn play_from(&mut self, progress: f32) {
        if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
            warn!("{}: play_from({progress}) ignored", self.id);
            return;
        }
        if self.state == PlayState::Stopped {
            self.start();
        }
        let (lo, hi) = self.range_seconds();
        let target = lo + progress * (hi - lo);
        self.elapsed = if self.mirrored() { lo + hi - target } else { target };
        self.state = PlayState::Playing;
        self.session_started = true;
        self.delay_remaining = 0.0;
        self.first_tick = true;
        self.finish_deferred = false;
        for animator in &mut self.animators {
            animator.progress_offset = 0.0;
        }
        self.arm_marker();
        debug!("{}: play from {:.3}", self.id, self.current_progress());
    }

    /// Start playing after `seconds` of wall-clock time. The delay is not
    /// scaled by the speed factor and no frames are produced during it.
    pub fn play_after(&mut self, seconds: f32) {
        if !(seconds > 0.0) {
            self.play();
            return;
        }
        match self.state {
            PlayState::Playing => trace!("{}: play_after ignored, already playing", self.id),
            PlayState::Paused => {
                self.state = PlayState::Playing;
                self.delay_remaining = seconds;
            }
            PlayState::Stopped => {
                self.start();
                self.delay_remaining = seconds;
                self.session_started = false;
                debug!("{}: play after {seconds}s", self.id);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
            debug!("{}: paused at {:.3}", self.id, self.current_progress());
        }
    }

    /// Stop and rewind. The end action is applied, and Finished delivered, on
    /// the next tick if the session had started.
    pub fn stop(&mut self) {
        if matches!(self.state, PlayState::Playing | PlayState::Paused) {
            let produced = self.session_started;
            let job = self.end_of_session_job(produced);
            if !job.is_empty() {
                self.pending.push(job);
            }
            if produced {
                self.played_count += 1;
            }
            debug!("{}: stopped", self.id);
        }
        self.rewind();
    }

    /// Stop and detach every animator. Applies the end action but never
    /// delivers Finished of its own.
    pub fn clear(&mut self) {
        if matches!(self.state, PlayState::Playing | PlayState::Paused) {
            let job = self.end_of_session_job(false);
            if !job.is_empty() {
                self.pending.push(job);
            }
        }
        self.animators.clear();
        self.targets.clear();
        self.blend_baselines.clear();
        self.rewind();
        debug!("{}: cleared", self.id);
    }

    /// Clear, then hand over whatever the next tick still has to do.
    pub(crate) fn teardown(&mut self) -> Vec<PendingJob> {
        self.clear();
        std::mem::take(&mut self.pending)
    }

    fn end_of_session_job(&self, finished: bool) -> PendingJob {
        let mut job = PendingJob {
            animation: self.id,
            bakes: Vec::new(),
            reverts: Vec::new(),
            finished,
        };
        if !self.session_started {
            return job;
        }
        let position = match self.end_action {
            EndAction::BakeFinal => self.final_position(),
            _ => self.position(),
        };
        for animator in self.animators.iter().filter(|a| !a.detached) {
            match self.end_action {
                EndAction::Discard => {
                    if animator.applied {
                        job.reverts.push(animator.property().key());
                    }
                }
                EndAction::Bake | EndAction::BakeFinal => {
                    if let Some(p) = animator.progress_at(position) {
                        job.bakes.push((animator.clone(), p));
                    }
                }
            }
        }
        job
    }

    // ---- setters -------------------------------------------------------

    /// Negative durations clamp to 0.
    pub fn set_duration(&mut self, seconds: f32) {
        if !seconds.is_finite() {
            warn!("{}: non-finite duration ignored", self.id);
            return;
        }
        if seconds < 0.0 {
            warn!("{}: duration {seconds} clamped to 0", self.id);
        }
        self.duration = seconds.max(0.0);
        let (lo, hi) = self.range_seconds();
        self.elapsed = self.elapsed.clamp(lo, hi);
    }

    /// Any non-zero finite factor; negative plays backwards.
    pub fn set_speed_factor(&mut self, factor: f32) {
        if factor == 0.0 || !factor.is_finite() {
            warn!("{}: speed factor {factor} ignored", self.id);
            return;
        }
        let was_up = self.travels_up();
        self.speed_factor = factor;
        if self.state != PlayState::Stopped && self.travels_up() != was_up {
            self.arm_marker();
        }
    }

    /// 0 loops forever, 1 plays once. The current loop index is kept, capped
    /// so that a smaller count takes effect at the next boundary.
    pub fn set_loop_count(&mut self, count: u32) {
        self.loop_count = count;
        if count > 0 && self.current_loop >= count {
            self.current_loop = count - 1;
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.set_loop_count(if looping { 0 } else { 1 });
    }

    pub fn set_looping_mode(&mut self, mode: LoopingMode) {
        self.looping_mode = mode;
    }

    /// Clamped to `[0,1]` and ordered. The current position is clamped into
    /// the new range; a stopped animation rewinds to its start.
    pub fn set_play_range(&mut self, start: f32, end: f32) {
        self.play_range = PlayRange::normalized(start, end);
        let (lo, hi) = self.range_seconds();
        if self.state == PlayState::Stopped {
            self.elapsed = lo;
        } else {
            self.elapsed = self.elapsed.clamp(lo, hi);
            self.arm_marker();
        }
    }

    /// Jump to `progress` of the full duration. Ignored outside the play range.
    pub fn set_current_progress(&mut self, progress: f32) {
        if !progress.is_finite() || !self.play_range.contains(progress) {
            warn!("{}: progress {progress} outside play range ignored", self.id);
            return;
        }
        let (lo, hi) = self.range_seconds();
        let target = progress * self.duration;
        self.elapsed = if self.mirrored() { lo + hi - target } else { target };
        self.finish_deferred = false;
        for animator in &mut self.animators {
            animator.progress_offset = 0.0;
        }
        if self.state != PlayState::Stopped {
            self.arm_marker();
        }
    }

    pub fn set_end_action(&mut self, action: EndAction) {
        self.end_action = action;
    }

    pub fn set_disconnect_action(&mut self, action: EndAction) {
        self.disconnect_action = action;
    }

    pub fn set_default_alpha(&mut self, alpha: impl Into<AlphaFunction>) {
        self.default_alpha = alpha.into();
    }

    /// Notify when playback crosses `progress`. 0 turns the notification off.
    pub fn set_progress_notification(&mut self, progress: f32) {
        if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
            warn!("{}: progress notification {progress} ignored", self.id);
            return;
        }
        self.progress_marker = (progress > 0.0).then_some(progress);
        if self.state != PlayState::Stopped {
            self.arm_marker();
        } else {
            self.marker_armed = false;
        }
    }

    /// Below this progress, values are blended from what the properties held
    /// when play started.
    pub fn set_blend_point(&mut self, progress: f32) {
        if !progress.is_finite() {
            warn!("{}: blend point {progress} ignored", self.id);
            return;
        }
        if !(0.0..=1.0).contains(&progress) {
            warn!("{}: blend point {progress} clamped to [0,1]", self.id);
        }
        self.blend_point = progress.clamp(0.0, 1.0);
    }

    // ---- authoring -----------------------------------------------------

    pub fn animate_to(
        &mut self,
        property: PropertyRef,
        target: Value,
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        self.add_animator(property, AnimatorSource::To(target), cfg, sink)
    }

    /// Relative animation; chains on the targets of earlier animators.
    pub fn animate_by(
        &mut self,
        property: PropertyRef,
        relative: Value,
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        self.add_animator(property, AnimatorSource::By(relative), cfg, sink)
    }

    /// Rotate by `radians` about `axis`; unlike `animate_by` this can turn
    /// more than half a revolution.
    pub fn animate_rotation_by(
        &mut self,
        property: PropertyRef,
        radians: f32,
        axis: [f32; 3],
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        self.add_animator(property, AnimatorSource::RotateBy { radians, axis }, cfg, sink)
    }

    pub fn animate_between(
        &mut self,
        property: PropertyRef,
        key_frames: impl Into<Arc<KeyFrames>>,
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        let source = AnimatorSource::Between {
            key_frames: key_frames.into(),
            interpolation: cfg.interpolation,
        };
        self.add_animator(property, source, cfg, sink)
    }

    /// Move `position` along `path`. With an orientation `(property, forward)`,
    /// also turn `forward` onto the path tangent.
    pub fn animate_path(
        &mut self,
        position: PropertyRef,
        orientation: Option<(PropertyRef, Vec3)>,
        path: impl Into<Arc<Path>>,
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        let path = path.into();
        if !path.is_complete() {
            return Err(AnimationError::IncompletePath);
        }
        let position_source = AnimatorSource::PathPosition(Arc::clone(&path));
        let rotation = orientation
            .filter(|(_, forward)| forward.iter().any(|c| *c != 0.0))
            .map(|(property, forward)| (property, AnimatorSource::PathRotation { path, forward }));

        // Validate both before adding either.
        self.validate(position, &position_source, sink)?;
        if let Some((property, source)) = &rotation {
            self.validate(*property, source, sink)?;
        }
        self.add_animator(position, position_source, cfg.clone(), sink)?;
        if let Some((property, source)) = rotation {
            self.add_animator(property, source, cfg, sink)?;
        }
        Ok(())
    }

    /// Set a boolean property to true once `delay` seconds have elapsed.
    pub fn show(&mut self, property: PropertyRef, delay: f32, sink: &dyn PropertySink) -> Result<()> {
        let cfg = AnimatorCfg::default().with_delay(delay, 0.0);
        self.add_animator(property, AnimatorSource::To(Value::Bool(true)), cfg, sink)
    }

    /// Set a boolean property to false once `delay` seconds have elapsed.
    pub fn hide(&mut self, property: PropertyRef, delay: f32, sink: &dyn PropertySink) -> Result<()> {
        let cfg = AnimatorCfg::default().with_delay(delay, 0.0);
        self.add_animator(property, AnimatorSource::To(Value::Bool(false)), cfg, sink)
    }

    fn validate(
        &self,
        property: PropertyRef,
        source: &AnimatorSource,
        sink: &dyn PropertySink,
    ) -> Result<Value> {
        let baseline = sink
            .read_baseline(property.key())
            .ok_or(AnimationError::UnknownProperty {
                owner: property.owner,
                index: property.index,
            })?;
        check_target(property, &baseline, source.kind()?)?;
        Ok(baseline)
    }

    fn add_animator(
        &mut self,
        property: PropertyRef,
        source: AnimatorSource,
        cfg: AnimatorCfg,
        sink: &dyn PropertySink,
    ) -> Result<()> {
        let baseline = self.validate(property, &source, sink)?;
        let period = cfg
            .period
            .unwrap_or_else(|| TimePeriod::new(self.duration))
            .validated()?;
        let alpha = cfg.alpha.unwrap_or(self.default_alpha);
        let animator = Animator::new(property, source, period, alpha);

        let key = property.key();
        let base = self
            .targets
            .get(&key)
            .map(|(_, v)| v.clone())
            .unwrap_or(baseline);
        if let Some(target) = animator.final_value(&base) {
            self.targets.insert(key, (self.authoring.next(), target));
        }
        if period.end() > self.duration {
            debug!(
                "{}: duration extended {} -> {}",
                self.id,
                self.duration,
                period.end()
            );
            self.duration = period.end();
        }
        self.animators.push(animator);
        Ok(())
    }

    // ---- ticking -------------------------------------------------------

    pub(crate) fn tick(&mut self, dt: f32, scope: &mut TickScope<'_>) {
        for job in std::mem::take(&mut self.pending) {
            job.run(scope);
        }

        match self.state {
            PlayState::Stopped => return,
            PlayState::Paused => {
                if self.session_started {
                    self.evaluate(false, scope);
                }
                return;
            }
            PlayState::Playing => {}
        }

        let mut dt = dt;
        if self.delay_remaining > 0.0 {
            if dt < self.delay_remaining {
                self.delay_remaining -= dt;
                return;
            }
            dt -= self.delay_remaining;
            self.delay_remaining = 0.0;
            self.session_started = true;
            debug!("{}: delayed play starts", self.id);
        }

        if self.finish_deferred {
            self.finish(scope);
            return;
        }

        let first = std::mem::replace(&mut self.first_tick, false);
        self.elapsed += dt * self.speed_factor;
        trace!("{}: elapsed {:.4}s loop {}", self.id, self.elapsed, self.current_loop);
        self.check_marker(scope.events);

        match self.wrap_or_finish() {
            Step::Running => self.evaluate(false, scope),
            Step::Looped => {
                debug!("{}: looped, current loop {}", self.id, self.current_loop);
                for animator in &mut self.animators {
                    animator.progress_offset = 0.0;
                }
                // Every pass gets its notification, even when the wrap
                // already carried the playhead past the marker.
                self.marker_armed = self.marker_seconds().is_some();
                self.check_marker(scope.events);
                self.evaluate(false, scope);
            }
            Step::Finished if first => {
                // The first frame after play is never the finishing one.
                self.finish_deferred = true;
                self.evaluate(false, scope);
            }
            Step::Finished => self.finish(scope),
        }
    }

    fn finish(&mut self, scope: &mut TickScope<'_>) {
        self.finish_deferred = false;
        match self.end_action {
            EndAction::Discard => {
                for animator in self.animators.iter().filter(|a| a.applied && !a.detached) {
                    scope.accum.revert(animator.property().key());
                }
            }
            EndAction::Bake | EndAction::BakeFinal => self.evaluate(true, scope),
        }
        self.played_count += 1;
        if self.loop_count > 0 {
            self.current_loop = self.loop_count;
        }
        let (lo, _) = self.range_seconds();
        self.elapsed = lo;
        self.state = PlayState::Stopped;
        self.session_started = false;
        self.marker_armed = false;
        debug!("{}: finished", self.id);
        scope.events.push(AnimationEvent::Finished { animation: self.id });
    }

    /// Apply every animator at the current position.
    fn evaluate(&mut self, bake: bool, scope: &mut TickScope<'_>) {
        let position = self.position();
        let progress = self.current_progress();
        let capture = std::mem::replace(&mut self.capture_blend, false);
        let blending = self.blend_point > 0.0 && progress < self.blend_point;

        let before = self.animators.len();
        self.animators
            .retain(|a| scope.sink.read_baseline(a.property().key()).is_some());
        if self.animators.len() != before {
            debug!(
                "{}: dropped {} orphaned animators",
                self.id,
                before - self.animators.len()
            );
        }

        let disconnect_action = self.disconnect_action;
        let mut touched: Vec<PropertyKey> = Vec::new();
        for animator in self.animators.iter_mut() {
            let property = animator.property();
            let key = property.key();
            if !scope.is_connected(property.owner) {
                if !animator.detached {
                    detach(animator, disconnect_action, scope);
                }
                continue;
            }
            if animator.detached {
                reattach(animator, position);
            }
            let Some(p) = animator.progress_at(position) else {
                continue;
            };
            let Some(running) = scope.accum.running(key, scope.sink) else {
                continue;
            };
            if capture {
                self.blend_baselines
                    .entry(key)
                    .or_insert_with(|| running.clone());
            }
            let Some(value) = animator.apply(&running, p) else {
                continue;
            };
            animator.current_progress = p;
            animator.applied = true;
            if bake {
                scope.accum.bake(key, value);
            } else {
                scope.accum.set(key, value);
            }
            scope.applied += 1;
            if !touched.contains(&key) {
                touched.push(key);
            }
        }

        if blending {
            let t = progress / self.blend_point;
            for key in touched {
                let (Some(base), Some(value)) =
                    (self.blend_baselines.get(&key), scope.accum.value(key).cloned())
                else {
                    continue;
                };
                if let Some(mixed) = blend_values(base, &value, t) {
                    if bake {
                        scope.accum.bake(key, mixed);
                    } else {
                        scope.accum.set(key, mixed);
                    }
                }
            }
        }
    }
}

fn detach(animator: &mut Animator, action: EndAction, scope: &mut TickScope<'_>) {
    animator.detached = true;
    if !animator.applied {
        return;
    }
    let key = animator.property().key();
    match action {
        EndAction::Discard => scope.accum.revert(key),
        EndAction::Bake | EndAction::BakeFinal => {
            let progress = if action == EndAction::BakeFinal {
                1.0
            } else {
                animator.current_progress
            };
            let baked = scope
                .accum
                .running(key, scope.sink)
                .and_then(|running| animator.apply(&running, progress));
            if let Some(value) = baked {
                scope.accum.bake(key, value);
            }
        }
    }
    debug!("{:?} detached with {:?}", animator.property(), action);
}

/// Resume a reconnected animator from the progress it froze at.
fn reattach(animator: &mut Animator, position: f32) {
    animator.detached = false;
    if animator.applied {
        let raw = animator.period().progress_at(position).unwrap_or(0.0);
        animator.progress_offset = animator.current_progress - raw;
    }
}
