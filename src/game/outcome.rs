//! # Game Outcome
//!
//! End-of-game flags and the flare queue, shared between the simulation and
//! its collaborators.
//!
//! The flags are atomics so the scheduler and UI can poll them without taking
//! the simulation lock. Only the simulation sets them.

use crate::config::FLARE_FRAMES;
use crate::Position;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Why a flare was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlareKind {
    LevelUp,
    FinalChallenge,
    BossArrived,
    Victory,
}

/// A transient highlight the renderer draws over tiles for a few frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flare {
    pub kind: FlareKind,
    pub origin: Position,
    pub radius: i32,
    /// Frames left to show
    pub frames: u32,
}

impl Flare {
    pub fn new(kind: FlareKind, origin: Position, radius: i32) -> Self {
        Self {
            kind,
            origin,
            radius,
            frames: FLARE_FRAMES,
        }
    }
}

/// Plain copy of the outcome flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSnapshot {
    pub final_challenge: bool,
    pub all_enemies_dead: bool,
    pub player_dead: bool,
    pub player_quit: bool,
    pub game_over: bool,
    pub killed_by: Option<String>,
}

/// Game-over bookkeeping.
#[derive(Debug, Default)]
pub struct GameOutcome {
    final_challenge: AtomicBool,
    all_enemies_dead: AtomicBool,
    player_dead: AtomicBool,
    player_quit: AtomicBool,
    game_over: AtomicBool,
    killed_by: Mutex<Option<String>>,
    flares: Mutex<VecDeque<Flare>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl GameOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.load(Ordering::SeqCst)
    }

    pub fn is_final_challenge(&self) -> bool {
        self.final_challenge.load(Ordering::SeqCst)
    }

    pub fn all_enemies_dead(&self) -> bool {
        self.all_enemies_dead.load(Ordering::SeqCst)
    }

    pub fn player_dead(&self) -> bool {
        self.player_dead.load(Ordering::SeqCst)
    }

    pub fn player_quit(&self) -> bool {
        self.player_quit.load(Ordering::SeqCst)
    }

    pub fn killed_by(&self) -> Option<String> {
        guard(&self.killed_by).clone()
    }

    /// Starts the finale. Returns true only for the call that flipped the flag.
    pub fn trigger_final_challenge(&self) -> bool {
        !self.final_challenge.swap(true, Ordering::SeqCst)
    }

    /// Records the player's death. The first killer recorded wins.
    pub fn record_player_death(&self, killer: Option<&str>) {
        {
            let mut killed_by = guard(&self.killed_by);
            if killed_by.is_none() {
                *killed_by = killer.map(str::to_string);
            }
        }
        self.player_dead.store(true, Ordering::SeqCst);
        self.game_over.store(true, Ordering::SeqCst);
    }

    pub fn record_victory(&self) {
        self.all_enemies_dead.store(true, Ordering::SeqCst);
        self.game_over.store(true, Ordering::SeqCst);
    }

    pub fn record_quit(&self) {
        self.player_quit.store(true, Ordering::SeqCst);
        self.game_over.store(true, Ordering::SeqCst);
    }

    pub fn push_flare(&self, flare: Flare) {
        guard(&self.flares).push_back(flare);
    }

    /// The flare the renderer should currently show.
    pub fn active_flare(&self) -> Option<Flare> {
        guard(&self.flares).front().copied()
    }

    /// Counts one rendered frame against the active flare, dropping it when spent.
    pub fn advance_flare(&self) -> Option<Flare> {
        let mut flares = guard(&self.flares);
        let front = flares.front_mut()?;
        front.frames = front.frames.saturating_sub(1);
        if front.frames == 0 {
            flares.pop_front()
        } else {
            Some(*front)
        }
    }

    pub fn pop_flare(&self) -> Option<Flare> {
        guard(&self.flares).pop_front()
    }

    pub fn snapshot(&self) -> OutcomeSnapshot {
        OutcomeSnapshot {
            final_challenge: self.is_final_challenge(),
            all_enemies_dead: self.all_enemies_dead(),
            player_dead: self.player_dead(),
            player_quit: self.player_quit(),
            game_over: self.is_game_over(),
            killed_by: self.killed_by(),
        }
    }
}
