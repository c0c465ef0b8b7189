//! # Runtime
//!
//! Drives a [`Simulation`] from independently clocked tokio tasks.
//!
//! Every task goes through one [`GameHandle`], which serializes access with a
//! single coarse lock held for exactly one entry point at a time. The tasks
//! stop on their own once the game is over or the kill flag is raised.
//!
//! ```no_run
//! use bramble::{Controls, GameHandle, GameRules, Session, Simulation, Timings};
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> bramble::BrambleResult<()> {
//! let rules = GameRules::default();
//! let timings = Timings::from_rules(&rules);
//! let handle = GameHandle::new(Simulation::new(rules, 42)?);
//! let (keys, rx) = mpsc::channel(16);
//! let (frames, mut frame_rx) = mpsc::unbounded_channel();
//!
//! let session = Session::start(&handle, Controls::wasd(), rx, frames, timings);
//! keys.send('q').await.ok();
//! session.join().await;
//! while let Some(frame) = frame_rx.recv().await {
//!     println!("{}", frame);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config;
use crate::{
    BrambleError, BrambleResult, Controls, FrameSnapshot, GameOutcome, GameRules, Simulation,
};
use log::{debug, error, info, warn};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Stop and pause switches shared by every loop.
#[derive(Debug, Default)]
pub struct ControlFlags {
    kill: AtomicBool,
    pause: AtomicBool,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every loop to exit at its next check.
    pub fn request_kill(&self) {
        self.kill.store(true, Ordering::SeqCst);
    }

    pub fn is_killed(&self) -> bool {
        self.kill.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.pause.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }
}

/// Shared access to one running game.
///
/// Cloning is cheap; all clones drive the same simulation.
#[derive(Debug, Clone)]
pub struct GameHandle {
    sim: Arc<Mutex<Simulation>>,
    outcome: Arc<GameOutcome>,
    flags: Arc<ControlFlags>,
}

impl GameHandle {
    pub fn new(sim: Simulation) -> Self {
        let outcome = sim.outcome();
        Self {
            sim: Arc::new(Mutex::new(sim)),
            outcome,
            flags: Arc::new(ControlFlags::new()),
        }
    }

    /// Runs `f` with exclusive access to the simulation.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{GameHandle, GameRules, Simulation};
    ///
    /// let handle = GameHandle::new(Simulation::new(GameRules::default(), 3).unwrap());
    /// let cycle = handle.with_lock(|sim| {
    ///     sim.npc_cycle();
    ///     sim.cycle()
    /// });
    /// assert_eq!(cycle.unwrap(), 1);
    /// ```
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> BrambleResult<R> {
        let mut sim = self.sim.lock().map_err(|_| BrambleError::LockPoisoned)?;
        Ok(f(&mut sim))
    }

    /// Runs `f` with shared access to the simulation.
    pub fn read<R>(&self, f: impl FnOnce(&Simulation) -> R) -> BrambleResult<R> {
        let sim = self.sim.lock().map_err(|_| BrambleError::LockPoisoned)?;
        Ok(f(&sim))
    }

    pub fn snapshot(&self) -> BrambleResult<FrameSnapshot> {
        self.read(Simulation::snapshot)
    }

    /// Outcome flags, readable without the lock.
    pub fn outcome(&self) -> &GameOutcome {
        &self.outcome
    }

    pub fn flags(&self) -> &ControlFlags {
        &self.flags
    }

    /// Whether loops should exit.
    pub fn should_stop(&self) -> bool {
        self.flags.is_killed() || self.outcome.is_game_over()
    }
}

/// Loop cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub npc_interval: Duration,
    pub regen_interval: Duration,
    pub frame_interval: Duration,
    pub input_poll: Duration,
}

impl Timings {
    pub fn from_rules(rules: &GameRules) -> Self {
        Self {
            npc_interval: Duration::from_millis(rules.npc_interval_ms.max(1)),
            regen_interval: Duration::from_millis(rules.regen_interval_ms.max(1)),
            frame_interval: Duration::from_millis(1000 / config::TARGET_FPS.max(1)),
            input_poll: Duration::from_millis(config::INPUT_POLL_MILLIS),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_rules(&GameRules::default())
    }
}

/// Receives rendered frames.
pub trait FrameSink: Send + 'static {
    fn present(&mut self, frame: &FrameSnapshot) -> BrambleResult<()>;
}

impl FrameSink for mpsc::UnboundedSender<FrameSnapshot> {
    fn present(&mut self, frame: &FrameSnapshot) -> BrambleResult<()> {
        self.send(frame.clone())
            .map_err(|_| BrambleError::InvalidState("frame receiver dropped".to_string()))
    }
}

/// Writes every frame as text, separated by a blank line.
#[derive(Debug)]
pub struct TextSink<W> {
    out: W,
}

impl<W: Write + Send + 'static> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> FrameSink for TextSink<W> {
    fn present(&mut self, frame: &FrameSnapshot) -> BrambleResult<()> {
        writeln!(self.out, "{}\n", frame)?;
        self.out.flush()?;
        Ok(())
    }
}

fn ticker(period: Duration) -> time::Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Runs one locked step, killing the session if the lock is poisoned.
fn locked_step(handle: &GameHandle, name: &str, step: impl FnOnce(&mut Simulation)) -> bool {
    match handle.with_lock(step) {
        Ok(()) => true,
        Err(e) => {
            error!("{} loop stopping: {}", name, e);
            handle.flags.request_kill();
            false
        }
    }
}

/// Feeds key presses from `keys` into the simulation.
///
/// Waits at most `poll` for each key so the stop flags are re-checked. Exits
/// when the game ends, the kill flag is set or every sender is dropped.
pub fn spawn_input_loop(
    handle: GameHandle,
    controls: Controls,
    mut keys: mpsc::Receiver<char>,
    poll: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !handle.should_stop() {
            let key = match time::timeout(poll, keys.recv()).await {
                Ok(Some(key)) => key,
                Ok(None) => {
                    debug!("Input channel closed");
                    break;
                }
                Err(_) => continue,
            };
            if handle.flags.is_paused() {
                continue;
            }
            if !locked_step(&handle, "input", |sim| {
                sim.player_input(key, &controls);
            }) {
                break;
            }
        }
        debug!("Input loop finished");
    })
}

/// One NPC cycle plus cleanup every `period`.
pub fn spawn_npc_loop(handle: GameHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = ticker(period);
        loop {
            tick.tick().await;
            if handle.should_stop() {
                break;
            }
            if handle.flags.is_paused() {
                continue;
            }
            if !locked_step(&handle, "npc", |sim| {
                sim.npc_cycle();
                sim.cleanup();
            }) {
                break;
            }
        }
        debug!("NPC loop finished");
    })
}

/// Regeneration, level-ups and cleanup every `period`.
pub fn spawn_regen_loop(handle: GameHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = ticker(period);
        // the first tick fires immediately
        tick.tick().await;
        loop {
            tick.tick().await;
            if handle.should_stop() {
                break;
            }
            if handle.flags.is_paused() {
                continue;
            }
            if !locked_step(&handle, "regen", |sim| {
                sim.apply_passive_regen();
                sim.apply_level_ups();
                sim.cleanup();
            }) {
                break;
            }
        }
        debug!("Regen loop finished");
    })
}

/// Hands a snapshot to `sink` every `period`, then one last frame once the
/// game is over.
pub fn spawn_render_loop<S: FrameSink>(
    handle: GameHandle,
    mut sink: S,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = ticker(period);
        loop {
            tick.tick().await;
            if handle.flags.is_killed() {
                break;
            }
            let finished = handle.outcome.is_game_over();
            if handle.flags.is_paused() && !finished {
                continue;
            }
            let frame = match handle.snapshot() {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Render loop stopping: {}", e);
                    handle.flags.request_kill();
                    break;
                }
            };
            handle.outcome.advance_flare();
            if let Err(e) = sink.present(&frame) {
                warn!("Render sink rejected a frame: {}", e);
                break;
            }
            if finished {
                break;
            }
        }
        debug!("Render loop finished");
    })
}

/// The four loops of one game.
#[derive(Debug)]
pub struct Session {
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Spawns the input, NPC, regeneration and render loops.
    pub fn start<S: FrameSink>(
        handle: &GameHandle,
        controls: Controls,
        keys: mpsc::Receiver<char>,
        sink: S,
        timings: Timings,
    ) -> Self {
        info!(
            "Starting session: npc every {:?}, regen every {:?}",
            timings.npc_interval, timings.regen_interval
        );
        let tasks = vec![
            spawn_input_loop(handle.clone(), controls, keys, timings.input_poll),
            spawn_npc_loop(handle.clone(), timings.npc_interval),
            spawn_regen_loop(handle.clone(), timings.regen_interval),
            spawn_render_loop(handle.clone(), sink, timings.frame_interval),
        ];
        Self { tasks }
    }

    /// Waits for every loop to exit.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Loop task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActorTemplate, Faction, Grid, Position, TrapDamage};
    use tokio_test::{assert_err, assert_ok};

    const SHORT: Duration = Duration::from_millis(5);

    fn arena_handle(rules: GameRules) -> GameHandle {
        let grid = Grid::import_from(
            &["############", "#..........#", "#..........#", "#..........#", "############"],
            false,
            true,
            TrapDamage::Flat(5),
        )
        .unwrap();
        GameHandle::new(Simulation::with_grid(grid, rules, 3, Position::new(1, 1)).unwrap())
    }

    fn fast_timings() -> Timings {
        Timings {
            npc_interval: SHORT,
            regen_interval: SHORT,
            frame_interval: SHORT,
            input_poll: SHORT,
        }
    }

    async fn finish(task: JoinHandle<()>) {
        let joined = time::timeout(Duration::from_secs(5), task).await;
        assert_ok!(assert_ok!(joined));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let handle = arena_handle(GameRules::for_testing());
        let sim = Arc::clone(&handle.sim);
        let _ = std::thread::spawn(move || {
            let _guard = sim.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();

        assert!(matches!(
            handle.with_lock(|sim| sim.cycle()),
            Err(BrambleError::LockPoisoned)
        ));
        assert_err!(handle.snapshot());
    }

    #[test]
    fn test_flags() {
        let flags = ControlFlags::new();
        assert!(!flags.is_killed());
        flags.set_paused(true);
        assert!(flags.is_paused());
        flags.request_kill();
        assert!(flags.is_killed());
    }

    #[tokio::test]
    async fn test_input_loop_applies_keys_until_quit() {
        let handle = arena_handle(GameRules::for_testing());
        let (keys, rx) = mpsc::channel(8);
        let task = spawn_input_loop(handle.clone(), Controls::wasd(), rx, SHORT);

        for key in ['d', 'd', 's', 'q'] {
            keys.send(key).await.unwrap();
        }
        finish(task).await;

        let player_at = handle.read(|sim| sim.player().map(|p| p.position)).unwrap();
        assert_eq!(player_at, Some(Position::new(3, 2)));
        assert!(handle.outcome().player_quit());
    }

    #[tokio::test]
    async fn test_input_loop_exits_when_senders_drop() {
        let handle = arena_handle(GameRules::for_testing());
        let (keys, rx) = mpsc::channel(1);
        let task = spawn_input_loop(handle.clone(), Controls::wasd(), rx, SHORT);
        drop(keys);
        finish(task).await;
        assert!(!handle.outcome().is_game_over());
    }

    #[tokio::test]
    async fn test_paused_npc_loop_does_no_work_and_stops_on_kill() {
        let handle = arena_handle(GameRules::for_testing());
        handle.flags().set_paused(true);
        let task = spawn_npc_loop(handle.clone(), SHORT);

        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handle.read(|sim| sim.cycle()).unwrap(), 0);

        handle.flags().set_paused(false);
        time::sleep(Duration::from_millis(30)).await;
        handle.flags().request_kill();
        finish(task).await;
        assert!(handle.read(|sim| sim.cycle()).unwrap() > 0);
    }

    #[tokio::test]
    async fn test_npc_loop_ends_the_game() {
        let handle = arena_handle(GameRules::for_testing());
        let brute = ActorTemplate {
            damage: 500,
            stamina: 500,
            hostile_to: vec![Faction::Player],
            ..ActorTemplate::default()
        };
        handle
            .with_lock(|sim| sim.spawn_npc(&brute, Faction::Enemy, Position::new(2, 1)))
            .unwrap()
            .unwrap();

        finish(spawn_npc_loop(handle.clone(), SHORT)).await;
        assert!(handle.outcome().player_dead());
        assert_eq!(handle.outcome().killed_by().as_deref(), Some("Creature"));
    }

    #[tokio::test]
    async fn test_render_loop_sends_final_frame() {
        let handle = arena_handle(GameRules::for_testing());
        let (frames, mut rx) = mpsc::unbounded_channel();
        let task = spawn_render_loop(handle.clone(), frames, SHORT);

        time::sleep(Duration::from_millis(20)).await;
        handle
            .with_lock(|sim| sim.player_input('q', &Controls::wasd()))
            .unwrap();
        finish(task).await;

        let mut last = None;
        while let Ok(frame) = rx.try_recv() {
            last = Some(frame);
        }
        let last = last.expect("at least one frame");
        assert!(last.outcome.player_quit);
        assert!(last.to_string().ends_with("Quit"));
    }

    #[tokio::test]
    async fn test_session_runs_to_completion() {
        let handle = arena_handle(GameRules::for_testing());
        let (keys, rx) = mpsc::channel(8);
        let sink = TextSink::new(Vec::new());
        let session = Session::start(&handle, Controls::wasd(), rx, sink, fast_timings());

        keys.send('d').await.unwrap();
        keys.send('q').await.unwrap();
        assert_ok!(time::timeout(Duration::from_secs(5), session.join()).await);
        assert!(handle.should_stop());
    }

    #[test]
    fn test_text_sink_writes_frames() {
        let handle = arena_handle(GameRules::for_testing());
        let mut sink = TextSink::new(Vec::new());
        sink.present(&handle.snapshot().unwrap()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("############\n#@"));
    }

    #[test]
    fn test_with_lock_from_blocking_context() {
        let handle = arena_handle(GameRules::for_testing());
        let moved = tokio_test::block_on(async {
            handle.with_lock(|sim| sim.player_input('d', &Controls::wasd()))
        });
        assert_eq!(moved.unwrap(), Some(crate::MoveOutcome::Moved));
    }
}
