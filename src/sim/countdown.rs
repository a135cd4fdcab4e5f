//! 3-2-1-go sequencing before a run

use super::events::{EventBus, GameEvent};
use crate::tuning::CountdownTuning;

/// First number shown
const COUNT_FROM: u32 = 3;

#[derive(Debug, Clone)]
pub struct Countdown {
    count_interval: f32,
    go_display_time: f32,
    /// Number currently showing (0 = "go")
    step: u32,
    timer: f32,
    running: bool,
}

impl Countdown {
    pub fn new(tuning: &CountdownTuning) -> Self {
        Self {
            count_interval: tuning.count_interval,
            go_display_time: tuning.go_display_time,
            step: COUNT_FROM,
            timer: 0.0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number on screen while running
    pub fn current(&self) -> Option<u32> {
        self.running.then_some(self.step)
    }

    pub fn start(&mut self, events: &mut EventBus) {
        self.step = COUNT_FROM;
        self.timer = self.count_interval;
        self.running = true;
        events.emit(GameEvent::CountdownStep(self.step));
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Advance; returns true on the tick the "go" display ends
    pub fn update(&mut self, dt: f32, events: &mut EventBus) -> bool {
        if !self.running {
            return false;
        }

        self.timer -= dt;
        while self.timer <= 0.0 {
            if self.step == 0 {
                self.running = false;
                return true;
            }
            self.step -= 1;
            events.emit(GameEvent::CountdownStep(self.step));
            self.timer += if self.step == 0 {
                self.go_display_time
            } else {
                self.count_interval
            };
        }
        false
    }
}
