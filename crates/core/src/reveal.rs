//! Timed reveal of a picked hero.
//!
//! `Idle -> Spinning -> Decelerating -> Revealed`, with `close` returning to
//! `Idle` from anywhere and `pick_again` going from `Revealed` straight back to
//! `Spinning`. All timers live in one queue that is cleared on every
//! transition, and a fired timer only acts if the phase it was scheduled for is
//! still current.

use crate::{
    Entity, Event, EventBus, Millis, PickError, RandomSelector, RevealTiming, RngState, TimerQueue,
    MAX_SELECTION,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealPhase {
    #[default]
    Idle,
    Spinning,
    Decelerating,
    Revealed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevealError {
    #[error(transparent)]
    Pick(#[from] PickError),
    #[error("winner {0} is not part of the reveal pool")]
    WinnerOutsidePool(String),
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: RevealPhase,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealTimer {
    Motion,
    SpinDone,
    SlowDone,
}

/// One confetti piece of the completion burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Particle {
    /// Horizontal position, percent of the overlay width.
    pub column: u8,
    pub delay_ms: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glide {
    from: usize,
    distance: usize,
    started_at: Millis,
    duration: Millis,
}

#[derive(Debug, Clone)]
pub struct RevealSession {
    pool: Vec<Entity>,
    track: Vec<Entity>,
    winner_slot: usize,
    winner: Entity,
    offset: usize,
    glide: Option<Glide>,
    displayed: Option<Entity>,
    particles: Vec<Particle>,
    round: u32,
    revealed_at: Option<Millis>,
}

impl RevealSession {
    fn new(pool: Vec<Entity>, winner: Entity, repeats: usize, round: u32) -> Self {
        let mut track = Vec::with_capacity(pool.len() * repeats.max(1));
        for _ in 0..repeats.max(1) {
            track.extend(pool.iter().cloned());
        }
        let winner_slot = (track.len() / 2 + 2).min(track.len() - 1);
        track[winner_slot] = winner.clone();
        Self {
            pool,
            track,
            winner_slot,
            winner,
            offset: 0,
            glide: None,
            displayed: None,
            particles: Vec::new(),
            round,
            revealed_at: None,
        }
    }

    pub fn pool(&self) -> &[Entity] {
        &self.pool
    }

    pub fn track(&self) -> &[Entity] {
        &self.track
    }

    pub fn winner_slot(&self) -> usize {
        self.winner_slot
    }

    pub fn winner(&self) -> &Entity {
        &self.winner
    }

    /// The committed result. Only set once the reveal completes.
    pub fn displayed(&self) -> Option<&Entity> {
        self.displayed.as_ref()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn revealed_at(&self) -> Option<Millis> {
        self.revealed_at
    }

    /// Track row resting at the center marker at `now`.
    pub fn position(&self, now: Millis) -> usize {
        let len = self.track.len();
        match self.glide {
            Some(glide) => {
                let elapsed = now.saturating_sub(glide.started_at).min(glide.duration);
                let t = if glide.duration == 0 {
                    1.0
                } else {
                    elapsed as f64 / glide.duration as f64
                };
                let eased = 1.0 - (1.0 - t).powi(3);
                let travelled = (glide.distance as f64 * eased).round() as usize;
                (glide.from + travelled) % len
            }
            None => self.offset % len,
        }
    }

    fn is_consistent(&self) -> bool {
        (1..=MAX_SELECTION).contains(&self.pool.len())
            && self.pool.iter().any(|entity| entity.same_as(&self.winner))
    }
}

#[derive(Debug)]
pub struct RevealSequencer {
    timing: RevealTiming,
    phase: RevealPhase,
    session: Option<RevealSession>,
    timers: TimerQueue<RevealTimer>,
    confetti: RngState,
    rounds: u32,
}

impl RevealSequencer {
    pub fn new(timing: RevealTiming, confetti: RngState) -> Self {
        Self {
            timing,
            phase: RevealPhase::Idle,
            session: None,
            timers: TimerQueue::new(),
            confetti,
            rounds: 0,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&RevealSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.phase != RevealPhase::Idle
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn timing(&self) -> &RevealTiming {
        &self.timing
    }

    /// Starts a reveal of `winner` over a snapshot of the selection.
    pub fn start(
        &mut self,
        pool: Vec<Entity>,
        winner: Entity,
        now: Millis,
        events: &mut EventBus,
    ) -> Result<(), RevealError> {
        if self.phase != RevealPhase::Idle {
            return Err(RevealError::InvalidTransition {
                action: "start a reveal",
                phase: self.phase,
            });
        }
        if !(1..=MAX_SELECTION).contains(&pool.len()) {
            return Err(PickError::InvalidState {
                len: pool.len(),
                max: MAX_SELECTION,
            }
            .into());
        }
        if !pool.iter().any(|entity| entity.same_as(&winner)) {
            return Err(RevealError::WinnerOutsidePool(winner.name));
        }
        self.spin(pool, winner, now, events);
        Ok(())
    }

    /// Draws a new winner from the same pool and spins again.
    pub fn pick_again(
        &mut self,
        selector: &mut RandomSelector,
        now: Millis,
        events: &mut EventBus,
    ) -> Result<&Entity, RevealError> {
        if self.phase != RevealPhase::Revealed {
            return Err(RevealError::InvalidTransition {
                action: "pick again",
                phase: self.phase,
            });
        }
        let Some(session) = self.session.take() else {
            self.fail_closed("revealed without a session", events);
            return Err(RevealError::InvalidTransition {
                action: "pick again",
                phase: RevealPhase::Idle,
            });
        };
        let pool = session.pool;
        let winner = match selector.pick(&pool) {
            Ok(winner) => winner.clone(),
            Err(err) => {
                self.fail_closed(&err.to_string(), events);
                return Err(err.into());
            }
        };
        self.spin(pool, winner, now, events);
        self.session
            .as_ref()
            .map(RevealSession::winner)
            .ok_or(RevealError::InvalidTransition {
                action: "pick again",
                phase: self.phase,
            })
    }

    /// Cancels every timer and drops the session. Safe from any phase.
    pub fn close(&mut self, events: &mut EventBus) {
        self.timers.clear();
        self.session = None;
        if self.phase != RevealPhase::Idle {
            self.phase = RevealPhase::Idle;
            debug!("reveal closed");
            events.push(Event::RevealClosed);
        }
    }

    /// Fails closed when the live selection can no longer back a reveal.
    pub fn on_selection_changed(&mut self, selection: &[Entity], events: &mut EventBus) {
        if self.is_active() && selection.is_empty() {
            self.fail_closed("selection emptied during reveal", events);
        }
    }

    /// Runs every timer due at or before `now`.
    pub fn advance(&mut self, now: Millis, events: &mut EventBus) {
        while let Some(fired) = self.timers.pop_due(now) {
            debug_assert!(self.session.as_ref().is_some_and(RevealSession::is_consistent));
            match (fired.kind, self.phase) {
                (RevealTimer::Motion, RevealPhase::Spinning) => {
                    let step = self.timing.motion_step;
                    if let Some(session) = self.session.as_mut() {
                        session.offset = (session.offset + step) % session.track.len();
                    }
                }
                (RevealTimer::SpinDone, RevealPhase::Spinning) => self.decelerate(fired.due, events),
                (RevealTimer::SlowDone, RevealPhase::Decelerating) => {
                    self.reveal(fired.due, events)
                }
                (kind, phase) => debug!(?kind, ?phase, "dropping stale reveal timer"),
            }
        }
    }

    fn spin(&mut self, pool: Vec<Entity>, winner: Entity, now: Millis, events: &mut EventBus) {
        self.timers.clear();
        self.rounds += 1;
        self.session = Some(RevealSession::new(
            pool,
            winner,
            self.timing.track_repeats,
            self.rounds,
        ));
        self.timers
            .every(now, self.timing.motion_tick_ms, RevealTimer::Motion);
        self.timers
            .once(now, self.timing.spin_ms, RevealTimer::SpinDone);
        self.enter(RevealPhase::Spinning, events);
    }

    fn decelerate(&mut self, now: Millis, events: &mut EventBus) {
        self.timers.clear();
        if let Some(session) = self.session.as_mut() {
            let len = session.track.len();
            let from = session.offset % len;
            // One full lap before settling on the winner.
            let distance = (session.winner_slot + len - from) % len + len;
            session.glide = Some(Glide {
                from,
                distance,
                started_at: now,
                duration: self.timing.decelerate_ms,
            });
            session.offset = session.winner_slot;
        }
        self.timers
            .once(now, self.timing.decelerate_ms, RevealTimer::SlowDone);
        self.enter(RevealPhase::Decelerating, events);
    }

    fn reveal(&mut self, now: Millis, events: &mut EventBus) {
        self.timers.clear();
        let particles = self.burst();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.displayed = Some(session.winner.clone());
        session.particles = particles;
        session.revealed_at = Some(now);
        let name = session.winner.name.clone();
        let round = session.round;
        self.enter(RevealPhase::Revealed, events);
        events.push(Event::WinnerRevealed { name, round });
    }

    fn burst(&mut self) -> Vec<Particle> {
        (0..self.timing.particle_count)
            .map(|idx| Particle {
                column: (self.confetti.next_u64() % 100) as u8,
                delay_ms: idx as Millis * self.timing.particle_stagger_ms,
            })
            .collect()
    }

    fn enter(&mut self, phase: RevealPhase, events: &mut EventBus) {
        debug!(from = ?self.phase, to = ?phase, "reveal phase");
        self.phase = phase;
        events.push(Event::PhaseEntered { phase });
    }

    fn fail_closed(&mut self, reason: &str, events: &mut EventBus) {
        warn!(reason, phase = ?self.phase, "reveal failed closed");
        self.close(events);
        events.push(Event::RevealFailedClosed {
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(name: &str) -> Entity {
        Entity::new(name, format!("img/{name}.png"))
    }

    fn abc() -> Vec<Entity> {
        vec![hero("A"), hero("B"), hero("C")]
    }

    fn sequencer() -> RevealSequencer {
        RevealSequencer::new(RevealTiming::default(), RngState::from_seed(9))
    }

    fn phases(events: &mut EventBus) -> Vec<RevealPhase> {
        events
            .drain()
            .filter_map(|event| match event {
                Event::PhaseEntered { phase } => Some(phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn walks_through_every_phase_and_shows_the_winner() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("B"), 0, &mut events).expect("start");
        assert_eq!(seq.phase(), RevealPhase::Spinning);
        assert!(seq.session().and_then(RevealSession::displayed).is_none());

        seq.advance(1_199, &mut events);
        assert_eq!(seq.phase(), RevealPhase::Spinning);
        seq.advance(1_200, &mut events);
        assert_eq!(seq.phase(), RevealPhase::Decelerating);
        seq.advance(2_299, &mut events);
        assert_eq!(seq.phase(), RevealPhase::Decelerating);
        seq.advance(2_300, &mut events);
        assert_eq!(seq.phase(), RevealPhase::Revealed);

        let session = seq.session().expect("session");
        assert_eq!(session.displayed(), Some(&hero("B")));
        assert_eq!(session.particles().len(), 30);
        assert_eq!(session.position(2_300), session.winner_slot());
        assert_eq!(&session.track()[session.winner_slot()], &hero("B"));
        assert_eq!(seq.pending_timers(), 0);
        assert_eq!(
            phases(&mut events),
            vec![
                RevealPhase::Spinning,
                RevealPhase::Decelerating,
                RevealPhase::Revealed
            ]
        );
    }

    #[test]
    fn fast_forward_in_one_step_reaches_revealed() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("C"), 500, &mut events).expect("start");
        seq.advance(60_000, &mut events);
        assert_eq!(seq.phase(), RevealPhase::Revealed);
        let fired: Vec<Event> = events.drain().collect();
        assert!(!fired
            .iter()
            .any(|event| matches!(event, Event::RevealFailedClosed { .. })));
        let entered = fired
            .iter()
            .filter(|event| matches!(event, Event::PhaseEntered { .. }))
            .count();
        assert_eq!(entered, 3);
    }

    #[test]
    fn track_repeats_pool_and_holds_winner() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("A"), 0, &mut events).expect("start");
        let session = seq.session().expect("session");
        assert_eq!(session.track().len(), 45);
        assert_eq!(session.winner_slot(), 24);
        assert_eq!(session.track()[24], hero("A"));
        assert!(session
            .track()
            .iter()
            .all(|entity| session.pool().contains(entity)));
    }

    #[test]
    fn motion_only_runs_while_spinning() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("A"), 0, &mut events).expect("start");
        seq.advance(100, &mut events);
        let session = seq.session().expect("session");
        assert_eq!(session.position(100), 2);
        seq.advance(1_200, &mut events);
        let resting = seq.session().expect("session").position(10_000);
        assert_eq!(resting, 24);
    }

    #[test]
    fn deceleration_glides_forward_to_the_winner() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("B"), 0, &mut events).expect("start");
        seq.advance(1_200, &mut events);
        let session = seq.session().expect("session");
        assert_eq!(session.position(1_200), 24);
        assert_ne!(session.position(1_750), 24);
        assert_eq!(session.position(2_300), session.winner_slot());
        assert_eq!(session.position(9_000), session.winner_slot());
    }

    #[test]
    fn pick_again_spins_over_the_same_pool() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        let mut selector = RandomSelector::seeded(5);
        seq.start(abc(), hero("B"), 0, &mut events).expect("start");
        seq.advance(5_000, &mut events);
        let _ = events.drain().count();

        for round in 0..20 {
            let now = 10_000 + round * 5_000;
            let winner = seq
                .pick_again(&mut selector, now, &mut events)
                .expect("pick again")
                .clone();
            assert!(abc().contains(&winner));
            assert_eq!(seq.phase(), RevealPhase::Spinning);
            seq.advance(now + 2_300, &mut events);
            let session = seq.session().expect("session");
            assert_eq!(session.displayed(), Some(&winner));
            assert_eq!(session.pool(), abc().as_slice());
        }
    }

    #[test]
    fn pick_again_requires_a_revealed_winner() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        let mut selector = RandomSelector::seeded(5);
        assert!(matches!(
            seq.pick_again(&mut selector, 0, &mut events),
            Err(RevealError::InvalidTransition { .. })
        ));
        seq.start(abc(), hero("B"), 0, &mut events).expect("start");
        assert!(seq.pick_again(&mut selector, 10, &mut events).is_err());
        assert_eq!(seq.phase(), RevealPhase::Spinning);
    }

    #[test]
    fn second_start_while_active_is_rejected() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("B"), 0, &mut events).expect("start");
        let again = seq.start(abc(), hero("C"), 10, &mut events);
        assert!(matches!(again, Err(RevealError::InvalidTransition { .. })));
        seq.advance(5_000, &mut events);
        assert_eq!(
            seq.session().and_then(RevealSession::displayed),
            Some(&hero("B"))
        );
    }

    #[test]
    fn close_from_any_phase_cancels_all_timers() {
        for close_at in [0, 600, 1_500, 2_300] {
            let mut events = EventBus::default();
            let mut seq = sequencer();
            seq.start(abc(), hero("A"), 0, &mut events).expect("start");
            seq.advance(close_at, &mut events);
            seq.close(&mut events);
            assert_eq!(seq.pending_timers(), 0);
            let _ = events.drain().count();
            seq.advance(100_000, &mut events);
            assert_eq!(seq.phase(), RevealPhase::Idle);
            assert!(seq.session().is_none());
            assert!(events.is_empty(), "close at {close_at}");
        }
    }

    #[test]
    fn close_is_idempotent() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.close(&mut events);
        seq.start(abc(), hero("A"), 0, &mut events).expect("start");
        seq.close(&mut events);
        seq.close(&mut events);
        let closes = events
            .drain()
            .filter(|event| *event == Event::RevealClosed)
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn invalid_pools_never_start() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        assert!(matches!(
            seq.start(Vec::new(), hero("A"), 0, &mut events),
            Err(RevealError::Pick(PickError::InvalidState { len: 0, .. }))
        ));
        let eleven: Vec<Entity> = (0..11).map(|idx| hero(&format!("h{idx}"))).collect();
        assert!(seq.start(eleven, hero("h0"), 0, &mut events).is_err());
        assert_eq!(
            seq.start(abc(), hero("Z"), 0, &mut events),
            Err(RevealError::WinnerOutsidePool("Z".to_string()))
        );
        assert_eq!(seq.phase(), RevealPhase::Idle);
        assert_eq!(seq.pending_timers(), 0);
    }

    #[test]
    fn emptied_selection_fails_closed() {
        let mut events = EventBus::default();
        let mut seq = sequencer();
        seq.start(abc(), hero("A"), 0, &mut events).expect("start");
        seq.on_selection_changed(&[hero("A")], &mut events);
        assert_eq!(seq.phase(), RevealPhase::Spinning);
        seq.on_selection_changed(&[], &mut events);
        assert_eq!(seq.phase(), RevealPhase::Idle);
        assert_eq!(seq.pending_timers(), 0);
        assert!(events
            .drain()
            .any(|event| matches!(event, Event::RevealFailedClosed { .. })));
    }
}
