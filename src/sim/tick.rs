//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Commands
//! coming from outside (pause, restart, stage loading) are methods on
//! [`GameState`] at the bottom of this file; they change phase at once,
//! while paddle and launch input is buffered until the next tick.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    apply_wall_hits, detect_walls, enforce_min_vertical, find_brick_hit, paddle_contact,
    resolve_brick_bounce, resolve_paddle_hit, separate, snap_above_paddle, tunneled_through_paddle,
};
use super::events::GameEvent;
use super::pickups::{catch_powerup, spawn_kirimi, update_kirimi};
use super::session::{BallLossOutcome, GamePhase};
use super::skills::{Skill, steer_toward, sub_ball_rebound};
use super::state::{Brick, GameState};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::direction_from_degrees;
use crate::error::{ConfigError, require_positive};
use crate::ranking::GameSummary;
use crate::stage::{BrickLayout, StageData, StageProgress, StageTable};
use crate::tuning::Tuning;

/// Longest frame the stepper will try to catch up on
const MAX_FRAME_DT: f32 = 0.1;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Absolute paddle X (mouse/touch position or an autoplayer)
    pub target_x: Option<f32>,
    /// Keyboard-style movement, -1 left to 1 right
    pub move_axis: f32,
    /// Launch the attached ball
    pub launch: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if !state.session.simulation_active() {
        return;
    }

    let pending = std::mem::take(&mut state.pending);
    let input = TickInput {
        target_x: input.target_x.or(pending.target_x),
        move_axis: input.move_axis,
        launch: input.launch || pending.launch,
    };

    let phase_before = state.session.phase();
    state.time_ticks += 1;
    state.events.set_tick(state.time_ticks);

    step(state, &input, dt);
    sync_phase(state, phase_before);
}

fn step(state: &mut GameState, input: &TickInput, dt: f32) {
    // Paddle
    if let Some(x) = input.target_x {
        state.paddle.set_x(x);
    }
    if input.move_axis != 0.0 {
        let x = state.paddle.pos.x + input.move_axis.clamp(-1.0, 1.0) * state.tuning.paddle_speed * dt;
        state.paddle.set_x(x);
    }

    if state.session.phase() == GamePhase::Countdown {
        state.ball.update_attached(&state.paddle);
        if state.countdown.update(dt, &mut state.events) {
            state.session.countdown_finished(&mut state.events);
        }
        return;
    }

    // Main ball
    if state.ball.is_launched() {
        step_main_ball(state, dt);
    } else {
        state.ball.update_attached(&state.paddle);
        let phase = state.session.phase();
        if input.launch && matches!(phase, GamePhase::Ready | GamePhase::Bonus) {
            launch_ball(state);
        }
    }
    if state.session.phase().is_terminal() {
        return;
    }

    step_sub_balls(state, dt);
    if state.session.phase().is_terminal() {
        return;
    }

    step_kirimi(state, dt);
    step_bonus_fish(state, dt);

    state.combo.update(dt);
    state.session.update_time(dt, &mut state.events);
}

fn launch_ball(state: &mut GameState) {
    let angle = state
        .rng
        .random_range(state.tuning.launch_angle_min..=state.tuning.launch_angle_max);
    state.ball.launch(direction_from_degrees(angle));
    log::debug!("Ball launched at {:.1} degrees", angle);
    state.events.emit(GameEvent::BallLaunched);
    state.session.launched(&mut state.events);
}

fn step_main_ball(state: &mut GameState, dt: f32) {
    let radius = state.ball.radius;
    let speed = state.ball.speed;
    let min_ratio = state.tuning.rebound.min_vertical_ratio;

    let mut vel = enforce_min_vertical(state.ball.vel, speed, min_ratio);
    let mut pos = state.ball.pos + vel * dt;
    let mut brick_hit = None;

    // One bounce source per tick
    if tunneled_through_paddle(pos, vel, radius, &state.paddle, state.tuning.rebound.tunnel_margin) {
        log::warn!("Ball tunneled into the paddle at {:?}, snapping back", pos);
        snap_above_paddle(&mut pos, radius, &state.paddle);
        vel = resolve_paddle_hit(pos, &state.paddle.rect(), speed, &state.tuning.rebound);
    } else {
        let hits = detect_walls(pos, vel, radius, &state.field);
        if hits.any() {
            apply_wall_hits(&mut pos, &mut vel, radius, &state.field, hits);
            state.combo.on_wall_hit();
        } else if paddle_contact(pos, vel, radius, &state.paddle) {
            vel = resolve_paddle_hit(pos, &state.paddle.rect(), speed, &state.tuning.rebound);
            pos.y = pos.y.max(state.paddle.top() + radius);
        } else if let Some((idx, contact)) = find_brick_hit(pos, radius, &state.bricks) {
            separate(&mut pos, &contact);
            vel = resolve_brick_bounce(
                vel,
                contact.normal,
                state.tuning.rebound.brick_bounce,
                speed,
                min_ratio,
            );
            brick_hit = Some(idx);
        }
    }

    state.ball.pos = pos;
    state.ball.vel = vel;

    if let Some(idx) = brick_hit {
        damage_brick(state, idx);
    }
    collect_pickups(state, pos, radius);

    if pos.y + radius < state.field.bottom() {
        lose_ball(state);
    }
}

fn lose_ball(state: &mut GameState) {
    state.combo.reset(&mut state.events);
    let outcome = state.session.on_ball_lost(&mut state.events);
    state
        .ball
        .attach(&state.paddle, state.tuning.ball_launch_offset);

    match outcome {
        BallLossOutcome::Respawn | BallLossOutcome::Free => {
            state.events.emit(GameEvent::BallReset);
        }
        BallLossOutcome::GameOver | BallLossOutcome::Ignored => {}
    }
}

fn step_sub_balls(state: &mut GameState, dt: f32) {
    let min_ratio = state.tuning.rebound.min_vertical_ratio;
    let mb = &state.tuning.multiball;
    let (strong, x_scale) = (mb.strong_rebound, mb.rebound_x_scale);
    let homing = mb.homing.then_some((mb.homing_blend, mb.homing_max_turn * dt));

    // Balls spawned during this loop start moving next tick
    let count = state.multiball.sub_balls.len();
    for i in 0..count {
        let mut ball = state.multiball.sub_balls[i].clone();
        if let Some((blend, max_turn)) = homing.filter(|_| ball.vel.y > 0.0) {
            if let Some(target) = nearest_brick(ball.pos, &state.bricks) {
                ball.vel = steer_toward(ball.vel, target - ball.pos, blend, max_turn);
            }
        }
        ball.pos += ball.vel * dt;
        let mut brick_hit = None;

        let hits = detect_walls(ball.pos, ball.vel, ball.radius, &state.field);
        if hits.any() {
            apply_wall_hits(&mut ball.pos, &mut ball.vel, ball.radius, &state.field, hits);
        } else if paddle_contact(ball.pos, ball.vel, ball.radius, &state.paddle) {
            let vel = sub_ball_rebound(ball.vel, ball.speed, strong, x_scale);
            ball.vel = enforce_min_vertical(vel, ball.speed, min_ratio);
        } else if let Some((idx, contact)) = find_brick_hit(ball.pos, ball.radius, &state.bricks) {
            separate(&mut ball.pos, &contact);
            ball.vel = resolve_brick_bounce(
                ball.vel,
                contact.normal,
                state.tuning.rebound.brick_bounce,
                ball.speed,
                min_ratio,
            );
            brick_hit = Some(idx);
        }

        let (pos, radius) = (ball.pos, ball.radius);
        state.multiball.sub_balls[i] = ball;

        if let Some(idx) = brick_hit {
            damage_brick(state, idx);
        }
        collect_pickups(state, pos, radius);
    }

    state.multiball.remove_escaped(&state.field, &mut state.events);
}

/// Center of the closest standing brick (first wins on ties)
fn nearest_brick(pos: Vec2, bricks: &[Brick]) -> Option<Vec2> {
    let mut best: Option<(f32, Vec2)> = None;
    for brick in bricks.iter().filter(|b| b.active) {
        let d = brick.rect.center.distance_squared(pos);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, brick.rect.center));
        }
    }
    best.map(|(_, center)| center)
}

/// Apply one hit to a brick and score it if destroyed
fn damage_brick(state: &mut GameState, idx: usize) {
    let damage = state.tuning.brick_damage;
    let Some(brick) = state.bricks.get_mut(idx) else {
        return;
    };
    if !brick.damage(damage) {
        return;
    }
    let (base, position) = (brick.score, brick.rect.center);

    let awarded = state.combo.on_brick_destroyed(base, &mut state.events);
    state.events.emit(GameEvent::BrickDestroyed {
        score: awarded,
        position,
    });
    state.session.add_score(awarded as u64, &mut state.events);

    if state.multiball.charge(&state.tuning.multiball, &mut state.events) {
        for _ in 0..state.tuning.multiball.spawn_count {
            let id = state.next_entity_id();
            state.multiball.spawn(
                id,
                &mut state.rng,
                &state.tuning.multiball,
                &state.field,
                &mut state.events,
            );
        }
    }

    state.session.add_destroyed_bricks(1, &mut state.events);
}

/// Power-ups and bonus fish are consumed on contact without a bounce
fn collect_pickups(state: &mut GameState, pos: Vec2, radius: f32) {
    if let Some(origin) = catch_powerup(&mut state.powerups, pos, radius) {
        log::debug!("Power-up caught at {:?}", origin);
        state.events.emit(GameEvent::PowerUpCaught { position: origin });

        let ids: Vec<u32> = (0..state.tuning.kirimi.spawn_count)
            .map(|_| state.next_entity_id())
            .collect();
        let pieces = spawn_kirimi(origin, &ids, &mut state.rng, &state.tuning.kirimi);
        state.kirimi.extend(pieces);
    }

    if let Some(position) = state.bonus.catch(pos, radius) {
        let points = state.tuning.bonus.fish_points;
        state
            .events
            .emit(GameEvent::BonusFishCaught { points, position });
        state.session.add_score(points as u64, &mut state.events);
    }
}

fn step_kirimi(state: &mut GameState, dt: f32) {
    if state.kirimi.is_empty() {
        return;
    }
    let catchers: Vec<(Vec2, f32)> = state
        .multiball
        .sub_balls
        .iter()
        .map(|b| (b.pos, b.radius))
        .collect();

    let collected = update_kirimi(
        &mut state.kirimi,
        &state.paddle,
        &catchers,
        &state.field,
        &state.tuning.kirimi,
        dt,
    );
    for points in collected {
        state.events.emit(GameEvent::KirimiCollected(points));
        state.session.add_score(points as u64, &mut state.events);
    }
}

fn step_bonus_fish(state: &mut GameState, dt: f32) {
    let due = state.bonus.update(dt, &state.field, &state.tuning.bonus);
    for _ in 0..due {
        let id = state.next_entity_id();
        state
            .bonus
            .spawn(id, &mut state.rng, &state.field, &state.tuning.bonus);
    }
}

/// Start or stop the fish school when the session moved in or out of Bonus
fn sync_phase(state: &mut GameState, before: GamePhase) {
    let now = state.session.phase();
    if now == before {
        return;
    }
    if now == GamePhase::Bonus && !state.bonus.is_active() {
        log::info!("Bonus round started");
        state.bonus.start();
    } else if now.is_terminal() {
        state.bonus.clear();
    }
}

/// Accumulates frame time and runs whole [`SIM_DT`] ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `frame_dt` covers (at most [`MAX_SUBSTEPS`])
    ///
    /// `launch` is one-shot: it is only fed to the first tick.
    pub fn advance(&mut self, state: &mut GameState, input: &TickInput, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut input = input.clone();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            input.launch = false;
        }
        substeps
    }

    /// Leftover fraction of a tick, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

// === Commands ===

impl GameState {
    /// Build a game with `stage` loaded, waiting on the title screen
    pub fn with_stage(seed: u64, tuning: Tuning, stage: &StageData) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let mut state = Self::new(seed, tuning);
        state.load_stage(stage)?;
        Ok(state)
    }

    /// Build a run over a stage table, starting on its first stage
    ///
    /// Every stage is checked against the field up front so later stage
    /// changes cannot fail.
    pub fn with_stages(seed: u64, tuning: Tuning, table: StageTable) -> Result<Self, ConfigError> {
        let mut state = Self::with_stage(seed, tuning, table.first())?;
        for stage in table.iter() {
            let layout = stage.layout()?;
            state.check_layout(layout.brick_count(), stage.time_limit, &layout)?;
        }
        state.progress = Some(StageProgress::new(table));
        Ok(state)
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase()
    }

    pub fn summary(&self) -> GameSummary {
        self.session.summary()
    }

    /// Lay out a stage and configure the session for it
    pub fn load_stage(&mut self, stage: &StageData) -> Result<(), ConfigError> {
        let layout = stage.layout()?;
        log::info!(
            "Loading stage {} \"{}\" ({} bricks, {} power-ups)",
            stage.id,
            stage.name,
            layout.brick_count(),
            layout.powerup_count()
        );
        self.configure_stage(layout.brick_count(), stage.time_limit, layout)
    }

    /// Install a layout. Fails without touching the current game
    ///
    /// Returns to the title screen when called mid-run.
    pub fn configure_stage(
        &mut self,
        total_bricks: u32,
        time_limit: f32,
        layout: BrickLayout,
    ) -> Result<(), ConfigError> {
        // A game built with `new` has not had its tuning checked yet
        self.tuning.validate()?;
        self.check_layout(total_bricks, time_limit, &layout)?;

        self.layout = Some(layout);
        self.session.configure(total_bricks, time_limit);
        self.countdown.cancel();
        self.combo.reset(&mut self.events);
        if self.session.phase() != GamePhase::Title {
            self.session.return_to_title(&mut self.events);
        }
        self.reset_entities();
        Ok(())
    }

    fn check_layout(
        &self,
        total_bricks: u32,
        time_limit: f32,
        layout: &BrickLayout,
    ) -> Result<(), ConfigError> {
        require_positive("time_limit", time_limit)?;
        let count = layout.brick_count();
        if count == 0 {
            return Err(ConfigError::EmptyLayout);
        }
        if total_bricks != count {
            return Err(ConfigError::BrickCountMismatch {
                declared: total_bricks,
                layout: count,
            });
        }

        let extent = layout.extent();
        let bottom = layout.top() - extent.y;
        if extent.x > self.field.width
            || layout.top() > self.field.top()
            || bottom <= self.paddle.top() + self.ball.radius
        {
            return Err(ConfigError::LayoutTooLarge {
                width: extent.x,
                height: extent.y,
            });
        }
        Ok(())
    }

    /// Title -> Countdown. Needs a stage
    pub fn request_start(&mut self) -> bool {
        if !self.has_stage() {
            log::warn!("Start requested with no stage loaded");
            return false;
        }
        if self.session.phase() != GamePhase::Title {
            return false;
        }
        self.reset_entities();
        self.combo.reset(&mut self.events);
        self.session.start(&mut self.events);
        self.countdown.start(&mut self.events);
        true
    }

    /// Fresh run straight to Ready. From the title screen this is a start
    pub fn request_restart(&mut self) -> bool {
        if self.session.phase() == GamePhase::Title {
            return self.request_start();
        }
        if !self.has_stage() {
            return false;
        }
        self.countdown.cancel();
        self.combo.reset(&mut self.events);
        self.session.restart(&mut self.events);
        self.reset_entities();
        true
    }

    /// Back to the title screen. Skills are dropped and a stage table
    /// rewinds to its first stage
    pub fn request_return_to_title(&mut self) {
        self.countdown.cancel();
        self.combo.reset(&mut self.events);
        self.session.return_to_title(&mut self.events);
        self.skills.clear();
        self.apply_skills();

        let rewind = match self.progress.as_mut() {
            Some(progress) if progress.number() > 1 => {
                progress.reset();
                Some(progress.current().clone())
            }
            _ => None,
        };
        match rewind {
            Some(first) => {
                if let Err(err) = self.load_stage(&first) {
                    log::warn!("Could not reload stage {}: {}", first.id, err);
                    self.reset_entities();
                }
            }
            None => self.reset_entities(),
        }
    }

    /// Replay the current stage from its countdown after a result screen
    pub fn request_retry_stage(&mut self) -> bool {
        if !self.session.phase().is_terminal() {
            return false;
        }
        log::info!("Retrying stage");
        self.countdown.cancel();
        self.combo.reset(&mut self.events);
        self.session.return_to_title(&mut self.events);
        self.skills.discard_offer();
        self.request_start()
    }

    /// Whether a cleared stage can lead to another one
    pub fn has_next_stage(&self) -> bool {
        self.progress.as_ref().is_some_and(|p| !p.is_last())
    }

    /// Draw skills to pick from after a cleared stage
    ///
    /// Empty when the stage is not cleared, there is no next stage or every
    /// skill is already owned.
    pub fn request_skill_offer(&mut self) -> Vec<Skill> {
        if self.session.phase() != GamePhase::GameClear || !self.has_next_stage() {
            return Vec::new();
        }
        let count = self.tuning.skills.choice_count;
        let offer = self.skills.make_offer(&mut self.rng, count).to_vec();
        if offer.is_empty() {
            log::info!("Every skill already acquired");
        } else {
            self.events.emit(GameEvent::SkillsOffered(offer.clone()));
        }
        offer
    }

    /// Take one skill from the current offer
    pub fn choose_skill(&mut self, skill: Skill) -> bool {
        if !self.skills.choose(skill) {
            return false;
        }
        self.apply_skills();
        self.events.emit(GameEvent::SkillAcquired(skill));
        true
    }

    /// Cleared stage -> countdown of the next stage in the table
    ///
    /// After the last stage (or with no table) this goes back to the title
    /// screen and returns false. Score and lives start fresh each stage.
    pub fn request_next_stage(&mut self) -> Result<bool, ConfigError> {
        if self.session.phase() != GamePhase::GameClear {
            return Ok(false);
        }
        let Some(next) = self.progress.as_ref().and_then(|p| p.peek_next()).cloned() else {
            log::info!("Final stage cleared, returning to title");
            self.request_return_to_title();
            return Ok(false);
        };

        self.load_stage(&next)?;
        self.skills.discard_offer();
        if let Some(progress) = self.progress.as_mut() {
            progress.advance();
            log::info!("Advancing to stage {}", progress.progress_text());
            self.events.emit(GameEvent::StageAdvanced {
                id: next.id,
                number: progress.number(),
                total: progress.total(),
            });
        }
        Ok(self.request_start())
    }

    pub fn request_pause(&mut self) -> bool {
        self.session.pause(&mut self.events)
    }

    pub fn request_resume(&mut self) -> bool {
        self.session.resume(&mut self.events)
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.session.phase() == GamePhase::Paused {
            self.request_resume()
        } else {
            self.request_pause()
        }
    }

    /// Buffered until the next tick
    pub fn set_paddle_target_x(&mut self, x: f32) {
        self.pending.target_x = Some(x);
    }

    /// Buffered until the next tick
    pub fn request_launch(&mut self) {
        self.pending.launch = true;
    }
}
