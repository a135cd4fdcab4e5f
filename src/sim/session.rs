//! Session flow: phases, lives, clock, score and brick accounting
//!
//! Every phase change goes through [`Session`] so there is exactly one
//! place that decides whether the simulation runs or is frozen.

use serde::{Deserialize, Serialize};

use super::events::{EventBus, GameEvent};
use crate::ranking::GameSummary;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Attract screen, nothing simulated
    Title,
    /// 3-2-1-go before play starts
    Countdown,
    /// Ball attached to paddle, waiting for launch input
    Ready,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Fever time after the last brick
    Bonus,
    /// Ran out of lives
    GameOver,
    /// Stage finished (all bricks gone or time up)
    GameClear,
}

impl GamePhase {
    /// Whether ticks advance the world in this phase
    pub fn simulation_active(self) -> bool {
        matches!(
            self,
            GamePhase::Countdown | GamePhase::Ready | GamePhase::Playing | GamePhase::Bonus
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::GameClear)
    }

    /// Whether the clock runs in this phase
    pub fn is_timed(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::Bonus)
    }
}

/// Where the session goes once every brick is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompletionTarget {
    #[default]
    Bonus,
    GameClear,
}

/// What a lost ball did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallLossOutcome {
    /// Lives remain; the ball goes back on the paddle
    Respawn,
    /// That was the last life
    GameOver,
    /// Bonus phase: no life is taken
    Free,
    /// Not in a phase where the ball can be lost
    Ignored,
}

/// Canonical session state
#[derive(Debug, Clone)]
pub struct Session {
    phase: GamePhase,
    /// Phase to return to when unpausing
    paused_from: Option<GamePhase>,
    score: u64,
    lives: u32,
    initial_lives: u32,
    time_limit: f32,
    remaining_time: f32,
    total_bricks: u32,
    destroyed_bricks: u32,
    completion: CompletionTarget,
    /// All bricks gone; guards against a second completion
    completed: bool,
    time_bonus_per_second: u64,
    time_bonus_applied: bool,
    bonus_duration: f32,
    bonus_remaining: f32,
}

impl Session {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Title,
            paused_from: None,
            score: 0,
            lives: tuning.initial_lives,
            initial_lives: tuning.initial_lives,
            time_limit: tuning.time_limit,
            remaining_time: tuning.time_limit,
            total_bricks: 0,
            destroyed_bricks: 0,
            completion: tuning.completion,
            completed: false,
            time_bonus_per_second: tuning.time_bonus_per_second,
            time_bonus_applied: false,
            bonus_duration: tuning.bonus.duration,
            bonus_remaining: 0.0,
        }
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn simulation_active(&self) -> bool {
        self.phase.simulation_active()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    pub fn time_limit(&self) -> f32 {
        self.time_limit
    }

    pub fn total_bricks(&self) -> u32 {
        self.total_bricks
    }

    pub fn destroyed_bricks(&self) -> u32 {
        self.destroyed_bricks
    }

    pub fn bonus_remaining(&self) -> f32 {
        self.bonus_remaining
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            lives_remaining: self.lives,
            destroyed_bricks: self.destroyed_bricks,
            total_bricks: self.total_bricks,
            remaining_time: self.remaining_time,
        }
    }

    // === Configuration ===

    /// Set the brick total and clock for the next run
    pub fn configure(&mut self, total_bricks: u32, time_limit: f32) {
        self.total_bricks = total_bricks;
        self.time_limit = time_limit;
        self.remaining_time = time_limit;
        self.destroyed_bricks = 0;
        self.completed = false;
    }

    // === Transitions ===

    fn set_phase(&mut self, to: GamePhase, events: &mut EventBus) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        events.emit(GameEvent::PhaseChanged { from, to });
    }

    /// Zero the score, refill lives and clock, forget destroyed bricks
    pub fn reset(&mut self, events: &mut EventBus) {
        self.score = 0;
        self.lives = self.initial_lives;
        self.remaining_time = self.time_limit;
        self.destroyed_bricks = 0;
        self.completed = false;
        self.time_bonus_applied = false;
        self.bonus_remaining = 0.0;
        self.paused_from = None;

        events.emit(GameEvent::ScoreChanged(self.score));
        events.emit(GameEvent::LivesChanged(self.lives));
        events.emit(GameEvent::TimeChanged(self.remaining_time));
    }

    /// Title -> Countdown with fresh counters
    pub fn start(&mut self, events: &mut EventBus) -> bool {
        if self.phase != GamePhase::Title {
            return false;
        }
        self.reset(events);
        self.set_phase(GamePhase::Countdown, events);
        true
    }

    /// Any phase -> Ready with fresh counters
    pub fn restart(&mut self, events: &mut EventBus) {
        self.reset(events);
        self.set_phase(GamePhase::Ready, events);
    }

    /// Any phase -> Title with fresh counters
    pub fn return_to_title(&mut self, events: &mut EventBus) {
        self.reset(events);
        self.set_phase(GamePhase::Title, events);
        events.emit(GameEvent::ReturnedToTitle);
    }

    /// Countdown finished
    pub fn countdown_finished(&mut self, events: &mut EventBus) {
        if self.phase == GamePhase::Countdown {
            self.set_phase(GamePhase::Ready, events);
        }
    }

    /// Ball left the paddle. Ready -> Playing
    pub fn launched(&mut self, events: &mut EventBus) {
        if self.phase == GamePhase::Ready {
            self.set_phase(GamePhase::Playing, events);
        }
    }

    pub fn pause(&mut self, events: &mut EventBus) -> bool {
        if !self.phase.simulation_active() {
            return false;
        }
        self.paused_from = Some(self.phase);
        self.set_phase(GamePhase::Paused, events);
        events.emit(GameEvent::Paused);
        true
    }

    pub fn resume(&mut self, events: &mut EventBus) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        let to = self.paused_from.take().unwrap_or(GamePhase::Playing);
        self.set_phase(to, events);
        events.emit(GameEvent::Resumed);
        true
    }

    /// The main ball dropped below the floor
    pub fn on_ball_lost(&mut self, events: &mut EventBus) -> BallLossOutcome {
        match self.phase {
            GamePhase::Bonus => {
                log::debug!("Ball lost during bonus, no life taken");
                events.emit(GameEvent::BallLost {
                    lives_remaining: self.lives,
                });
                BallLossOutcome::Free
            }
            GamePhase::Playing => {
                self.lives = self.lives.saturating_sub(1);
                log::info!("Ball lost, {} lives left", self.lives);
                events.emit(GameEvent::LivesChanged(self.lives));
                events.emit(GameEvent::BallLost {
                    lives_remaining: self.lives,
                });

                if self.lives == 0 {
                    self.set_phase(GamePhase::GameOver, events);
                    events.emit(GameEvent::GameOver(self.summary()));
                    BallLossOutcome::GameOver
                } else {
                    self.set_phase(GamePhase::Ready, events);
                    BallLossOutcome::Respawn
                }
            }
            _ => BallLossOutcome::Ignored,
        }
    }

    pub fn add_score(&mut self, points: u64, events: &mut EventBus) {
        if points == 0 {
            return;
        }
        self.score += points;
        events.emit(GameEvent::ScoreChanged(self.score));
    }

    /// Count destroyed bricks; returns true if this call completed the stage
    ///
    /// Counts past the total are clamped and logged. Completion fires once.
    pub fn add_destroyed_bricks(&mut self, count: u32, events: &mut EventBus) -> bool {
        if count == 0 {
            return false;
        }
        if self.completed {
            log::warn!(
                "Ignoring {} destroyed brick(s) after completion ({}/{})",
                count,
                self.destroyed_bricks,
                self.total_bricks
            );
            return false;
        }

        let wanted = self.destroyed_bricks.saturating_add(count);
        if wanted > self.total_bricks {
            log::warn!(
                "Destroyed bricks would exceed total ({} > {}), clamping",
                wanted,
                self.total_bricks
            );
        }
        self.destroyed_bricks = wanted.min(self.total_bricks);

        let done = self.total_bricks > 0
            && self.destroyed_bricks == self.total_bricks
            && matches!(self.phase, GamePhase::Ready | GamePhase::Playing);
        if !done {
            return false;
        }

        self.completed = true;
        log::info!("All {} bricks destroyed", self.total_bricks);
        events.emit(GameEvent::AllBricksDestroyed);

        match self.completion {
            CompletionTarget::Bonus => {
                self.bonus_remaining = self.bonus_duration;
                self.set_phase(GamePhase::Bonus, events);
            }
            CompletionTarget::GameClear => self.finish_clear(events),
        }
        true
    }

    /// Advance the clocks. Only runs while playing or in the bonus phase
    pub fn update_time(&mut self, dt: f32, events: &mut EventBus) {
        if !self.phase.is_timed() {
            return;
        }

        self.remaining_time = (self.remaining_time - dt).max(0.0);
        events.emit(GameEvent::TimeChanged(self.remaining_time));

        if self.remaining_time <= 0.0 {
            log::info!("Time up");
            events.emit(GameEvent::TimeUp);
            self.finish_clear(events);
            return;
        }

        if self.phase == GamePhase::Bonus {
            self.bonus_remaining = (self.bonus_remaining - dt).max(0.0);
            if self.bonus_remaining <= 0.0 {
                log::info!("Bonus phase over");
                self.finish_clear(events);
            }
        }
    }

    /// Score `floor(remaining) * per_second` once per run
    fn apply_time_bonus(&mut self, events: &mut EventBus) {
        if self.time_bonus_applied {
            return;
        }
        self.time_bonus_applied = true;

        let bonus = self.remaining_time.floor().max(0.0) as u64 * self.time_bonus_per_second;
        if bonus > 0 {
            log::info!("Time bonus +{}", bonus);
            events.emit(GameEvent::TimeBonus(bonus));
            self.add_score(bonus, events);
        }
    }

    fn finish_clear(&mut self, events: &mut EventBus) {
        if self.phase.is_terminal() {
            return;
        }
        self.apply_time_bonus(events);
        self.set_phase(GamePhase::GameClear, events);
        events.emit(GameEvent::GameClear(self.summary()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(completion: CompletionTarget) -> (Session, EventBus) {
        let tuning = Tuning {
            initial_lives: 3,
            completion,
            ..Default::default()
        };
        let mut s = Session::new(&tuning);
        s.configure(10, 60.0);
        (s, EventBus::new())
    }

    fn playing(completion: CompletionTarget) -> (Session, EventBus) {
        let (mut s, mut bus) = session(completion);
        s.restart(&mut bus);
        s.launched(&mut bus);
        bus.drain();
        (s, bus)
    }

    fn count(bus: &mut EventBus, pred: impl Fn(&GameEvent) -> bool) -> usize {
        bus.drain().iter().filter(|e| pred(&e.event)).count()
    }

    #[test]
    fn test_simulation_active_by_phase() {
        assert!(GamePhase::Playing.simulation_active());
        assert!(GamePhase::Bonus.simulation_active());
        assert!(GamePhase::Ready.simulation_active());
        assert!(GamePhase::Countdown.simulation_active());
        assert!(!GamePhase::Paused.simulation_active());
        assert!(!GamePhase::GameOver.simulation_active());
        assert!(!GamePhase::GameClear.simulation_active());
        assert!(!GamePhase::Title.simulation_active());
    }

    #[test]
    fn test_title_start_goes_to_countdown() {
        let (mut s, mut bus) = session(CompletionTarget::Bonus);
        assert_eq!(s.phase(), GamePhase::Title);
        assert!(s.start(&mut bus));
        assert_eq!(s.phase(), GamePhase::Countdown);
        assert!(!s.start(&mut bus));
        s.countdown_finished(&mut bus);
        assert_eq!(s.phase(), GamePhase::Ready);
    }

    #[test]
    fn test_lives_exhaustion() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);

        assert_eq!(s.on_ball_lost(&mut bus), BallLossOutcome::Respawn);
        assert_eq!(s.phase(), GamePhase::Ready);
        assert_eq!(s.lives(), 2);

        s.launched(&mut bus);
        assert_eq!(s.on_ball_lost(&mut bus), BallLossOutcome::Respawn);
        assert_eq!(s.lives(), 1);

        s.launched(&mut bus);
        bus.drain();
        assert_eq!(s.on_ball_lost(&mut bus), BallLossOutcome::GameOver);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.lives(), 0);
        assert_eq!(count(&mut bus, |e| matches!(e, GameEvent::GameOver(_))), 1);

        // Terminal: further losses do nothing
        assert_eq!(s.on_ball_lost(&mut bus), BallLossOutcome::Ignored);
    }

    #[test]
    fn test_completion_exactly_once() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);

        assert!(!s.add_destroyed_bricks(9, &mut bus));
        assert!(s.add_destroyed_bricks(1, &mut bus));
        assert_eq!(s.phase(), GamePhase::Bonus);

        // Stragglers
        assert!(!s.add_destroyed_bricks(1, &mut bus));
        assert!(!s.add_destroyed_bricks(3, &mut bus));
        assert_eq!(s.destroyed_bricks(), 10);
        assert_eq!(
            count(&mut bus, |e| matches!(e, GameEvent::AllBricksDestroyed)),
            1
        );
    }

    #[test]
    fn test_over_completion_clamped() {
        let (mut s, mut bus) = playing(CompletionTarget::GameClear);
        s.add_destroyed_bricks(8, &mut bus);
        assert!(s.add_destroyed_bricks(5, &mut bus));
        assert_eq!(s.destroyed_bricks(), 10);
        assert_eq!(s.phase(), GamePhase::GameClear);
    }

    #[test]
    fn test_direct_clear_applies_time_bonus_once() {
        let (mut s, mut bus) = playing(CompletionTarget::GameClear);
        s.update_time(5.5, &mut bus);
        s.add_destroyed_bricks(10, &mut bus);
        assert_eq!(s.phase(), GamePhase::GameClear);
        // floor(54.5) * 10
        assert_eq!(s.score(), 540);

        s.add_destroyed_bricks(1, &mut bus);
        assert_eq!(s.score(), 540);
        assert_eq!(count(&mut bus, |e| matches!(e, GameEvent::TimeBonus(_))), 1);
    }

    #[test]
    fn test_bonus_timer_ends_in_clear() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);
        s.add_destroyed_bricks(10, &mut bus);
        assert_eq!(s.phase(), GamePhase::Bonus);

        for _ in 0..9 {
            s.update_time(1.0, &mut bus);
        }
        assert_eq!(s.phase(), GamePhase::Bonus);
        s.update_time(1.0, &mut bus);
        assert_eq!(s.phase(), GamePhase::GameClear);
        // 60 - 10 seconds left
        assert_eq!(s.score(), 500);

        bus.drain();
        s.update_time(1.0, &mut bus);
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_time_up_routes_to_clear_with_bricks_left() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);
        s.add_destroyed_bricks(3, &mut bus);
        s.update_time(61.0, &mut bus);
        assert_eq!(s.phase(), GamePhase::GameClear);
        assert_eq!(s.remaining_time(), 0.0);
        let events: Vec<_> = bus.drain().into_iter().map(|e| e.event).collect();
        assert!(events.contains(&GameEvent::TimeUp));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::GameOver(_))));
    }

    #[test]
    fn test_clock_frozen_outside_play() {
        let (mut s, mut bus) = session(CompletionTarget::Bonus);
        s.restart(&mut bus);
        s.update_time(5.0, &mut bus);
        assert_eq!(s.remaining_time(), 60.0);
    }

    #[test]
    fn test_pause_resume_returns_to_previous_phase() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);
        s.add_destroyed_bricks(10, &mut bus);

        assert!(s.pause(&mut bus));
        assert_eq!(s.phase(), GamePhase::Paused);
        assert!(!s.simulation_active());
        assert!(!s.pause(&mut bus));

        assert!(s.resume(&mut bus));
        assert_eq!(s.phase(), GamePhase::Bonus);
        assert!(!s.resume(&mut bus));
    }

    #[test]
    fn test_ball_lost_in_bonus_is_free() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);
        s.add_destroyed_bricks(10, &mut bus);
        bus.drain();
        assert_eq!(s.on_ball_lost(&mut bus), BallLossOutcome::Free);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.phase(), GamePhase::Bonus);
        let fired: Vec<_> = bus.drain().into_iter().map(|e| e.event).collect();
        assert_eq!(fired, vec![GameEvent::BallLost { lives_remaining: 3 }]);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (mut s, mut bus) = playing(CompletionTarget::GameClear);
        s.add_score(42, &mut bus);
        s.on_ball_lost(&mut bus);
        s.add_destroyed_bricks(10, &mut bus);
        bus.drain();

        s.restart(&mut bus);
        assert_eq!(s.phase(), GamePhase::Ready);
        assert_eq!(s.score(), 0);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.destroyed_bricks(), 0);
        assert_eq!(s.remaining_time(), 60.0);
        assert!(!s.is_complete());

        let events: Vec<_> = bus.drain().into_iter().map(|e| e.event).collect();
        assert!(events.contains(&GameEvent::ScoreChanged(0)));
        assert!(events.contains(&GameEvent::LivesChanged(3)));
    }

    #[test]
    fn test_return_to_title() {
        let (mut s, mut bus) = playing(CompletionTarget::Bonus);
        s.return_to_title(&mut bus);
        assert_eq!(s.phase(), GamePhase::Title);
        let events: Vec<_> = bus.drain().into_iter().map(|e| e.event).collect();
        assert!(events.contains(&GameEvent::ReturnedToTitle));
    }
}
