//! Outbound game events
//!
//! The simulation never talks to presentation directly. It pushes typed
//! events onto an [`EventBus`] owned by the [`GameState`](super::GameState):
//! - listeners registered with [`EventBus::subscribe`] see each event as it fires
//! - everything also lands in a pending queue that a frame loop can [`EventBus::drain`]
//!
//! Events are fire-and-forget. Each logical occurrence is emitted at most once.

use glam::Vec2;

use super::session::GamePhase;
use super::skills::Skill;
use crate::ranking::GameSummary;

/// Everything the core reports to the outside world
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // === Ball ===
    BallLaunched,
    /// Main ball fell out; during the bonus round lives are unchanged
    BallLost { lives_remaining: u32 },
    /// Ball re-attached to the paddle after a loss
    BallReset,

    // === Bricks ===
    BrickDestroyed { score: u32, position: Vec2 },
    AllBricksDestroyed,

    // === Combo ===
    ComboChanged { count: u32, multiplier: f32 },
    ComboEnded { previous: u32 },

    // === Session ===
    ScoreChanged(u64),
    LivesChanged(u32),
    /// Remaining main-clock time. Fires every playing tick
    TimeChanged(f32),
    TimeUp,
    PhaseChanged { from: GamePhase, to: GamePhase },
    GameOver(GameSummary),
    GameClear(GameSummary),
    Paused,
    Resumed,
    ReturnedToTitle,
    /// 3, 2, 1, then 0 for "go"
    CountdownStep(u32),
    /// Remaining seconds converted to score when the session clears
    TimeBonus(u64),

    // === Extras ===
    MultiBallGaugeChanged(u32),
    SubBallSpawned(usize),
    SubBallLost(usize),
    PowerUpCaught { position: Vec2 },
    KirimiCollected(u32),
    BonusFishCaught { points: u32, position: Vec2 },

    // === Progression ===
    SkillsOffered(Vec<Skill>),
    SkillAcquired(Skill),
    /// Next stage loaded; `number` is 1-based
    StageAdvanced { id: u32, number: usize, total: usize },
}

/// An event stamped with the simulation tick it fired on
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    pub tick: u64,
    pub event: GameEvent,
}

/// Something that wants to hear about events as they happen
pub trait EventListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> EventListener for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Typed event hub with explicit listener registration
pub struct EventBus {
    listeners: Vec<(ListenerId, Box<dyn EventListener>)>,
    pending: Vec<BusEvent>,
    tick: u64,
    next_listener: u32,
    /// Whether emitted events are queued for [`drain`](Self::drain)
    queue_enabled: bool,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .field("tick", &self.tick)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            pending: Vec::new(),
            tick: 0,
            next_listener: 1,
            queue_enabled: true,
        }
    }

    /// Register a listener. It receives every event until unsubscribed
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was unknown
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Turn the pending queue on or off (listeners are always notified)
    pub fn set_queue_enabled(&mut self, enabled: bool) {
        self.queue_enabled = enabled;
        if !enabled {
            self.pending.clear();
        }
    }

    /// Set the tick stamped onto subsequent events
    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Fire an event: notify listeners in registration order, then queue it
    pub fn emit(&mut self, event: GameEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_event(&event);
        }
        if self.queue_enabled {
            self.pending.push(BusEvent {
                tick: self.tick,
                event,
            });
        }
    }

    /// Pending events without consuming them
    pub fn peek(&self) -> &[BusEvent] {
        &self.pending
    }

    /// Take all pending events
    pub fn drain(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_and_drain() {
        let mut bus = EventBus::new();
        bus.set_tick(42);
        bus.emit(GameEvent::BallLaunched);
        bus.emit(GameEvent::ScoreChanged(3));

        assert!(bus.has_pending());
        assert_eq!(bus.peek().len(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tick, 42);
        assert_eq!(events[1].event, GameEvent::ScoreChanged(3));
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let sink = Rc::clone(&seen);
        let id = bus.subscribe(move |e: &GameEvent| sink.borrow_mut().push(e.clone()));
        assert_eq!(bus.listener_count(), 1);

        bus.emit(GameEvent::TimeUp);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(GameEvent::AllBricksDestroyed);

        assert_eq!(*seen.borrow(), vec![GameEvent::TimeUp]);
        assert_eq!(bus.drain().len(), 2);
    }

    #[test]
    fn test_queue_disabled_still_notifies() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = Rc::clone(&count);
        bus.subscribe(move |_: &GameEvent| *c.borrow_mut() += 1);

        bus.set_queue_enabled(false);
        bus.emit(GameEvent::BallReset);

        assert_eq!(*count.borrow(), 1);
        assert!(!bus.has_pending());
    }
}
