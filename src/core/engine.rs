use crate::config::{GameConfig, StyleChoice};
use crate::core::clock::Clock;
use crate::core::feedback::{Feedback, FeedbackSink};
use crate::core::transport::{Pulse, Transport};
use crate::error::{Error, Result};
use crate::game::scores::SessionResult;
use crate::game::session::{Game, GameEvent};
use crate::game::snapshot::SessionSnapshot;
use crate::game::style::MusicStyle;
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Who drives ticks and sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Background timer threads at the session's tempo and sweep period.
    #[default]
    Realtime,
    /// No timers. The caller drives the session with
    /// [`EngineHandle::tick`] and [`EngineHandle::sweep`].
    Manual,
}

// --- Engine Commands ---
enum Command {
    Start { level: u32, style: StyleChoice, now: f64 },
    Stop { now: f64 },
    PressStart { x: f64, y: f64 },
    PressEnd { x: f64, y: f64, now: f64 },
    Pulse(Pulse),
    ManualTick { now: f64 },
    ManualSweep { now: f64 },
    Snapshot(Sender<SessionSnapshot>),
    Result(Sender<Option<SessionResult>>),
    Shutdown,
}

impl From<Pulse> for Command {
    fn from(pulse: Pulse) -> Self {
        Command::Pulse(pulse)
    }
}

/// Owns the running game. Lives on its own thread and applies commands one
/// at a time; nothing else touches the session.
pub struct Engine {
    config: GameConfig,
    clock: Arc<dyn Clock>,
    sink: Box<dyn FeedbackSink>,
    rng: StdRng,
    mode: TransportMode,
    commands: Sender<Command>,
    generation: u64,
    game: Game,
    transport: Option<Transport>,
    next_manual_tick: u64,
    finished_at: Option<DateTime<Local>>,
}

impl Engine {
    /// Starts the engine thread and returns the handle that talks to it.
    /// `seed` feeds every random choice the engine makes (styles, gestures).
    pub fn spawn(
        config: GameConfig,
        clock: Arc<dyn Clock>,
        sink: Box<dyn FeedbackSink>,
        seed: u64,
        mode: TransportMode,
    ) -> Result<EngineHandle> {
        config.validate()?;
        let (tx, rx) = mpsc::channel();
        let engine = Engine::new(config, Arc::clone(&clock), sink, seed, mode, tx.clone());
        let thread = thread::Builder::new()
            .name("tapsync-engine".to_string())
            .spawn(move || engine.run(rx))?;
        info!("Game engine started ({:?} transport).", mode);
        Ok(EngineHandle {
            commands: tx,
            clock,
            thread: Some(thread),
        })
    }

    fn new(
        config: GameConfig,
        clock: Arc<dyn Clock>,
        sink: Box<dyn FeedbackSink>,
        seed: u64,
        mode: TransportMode,
        commands: Sender<Command>,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let idle = config.session_config(config.start_level, MusicStyle::default());
        let game = Game::seeded(idle, rng.random());
        Self {
            config,
            clock,
            sink,
            rng,
            mode,
            commands,
            generation: 0,
            game,
            transport: None,
            next_manual_tick: 0,
            finished_at: None,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        while let Ok(command) = commands.recv() {
            if !self.apply(command) {
                break;
            }
        }
        self.halt_transport();
        debug!("Game engine thread exiting.");
    }

    /// Returns false when the engine should exit.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Start { level, style, now } => self.start(level, style, now),
            Command::Stop { now } => self.stop(now),
            Command::PressStart { x, y } => {
                self.handle_event(GameEvent::PressStart { x, y });
            }
            Command::PressEnd { x, y, now } => {
                self.handle_event(GameEvent::PressEnd { x, y, now });
            }
            Command::Pulse(Pulse::Tick { generation, tick, now }) => {
                if self.is_current(generation) {
                    self.tick(tick, now);
                }
            }
            Command::Pulse(Pulse::Sweep { generation, now }) => {
                if self.is_current(generation) {
                    self.handle_event(GameEvent::Sweep { now });
                }
            }
            Command::ManualTick { now } => {
                if self.accepts_manual("tick") {
                    let tick = self.next_manual_tick;
                    self.next_manual_tick += 1;
                    self.tick(tick, now);
                }
            }
            Command::ManualSweep { now } => {
                if self.accepts_manual("sweep") {
                    self.handle_event(GameEvent::Sweep { now });
                }
            }
            Command::Snapshot(reply) => {
                let now = self.clock.now_ms();
                let _ = reply.send(SessionSnapshot::capture(self.game.session(), now));
            }
            Command::Result(reply) => {
                let result = match (self.game.session().is_over(), self.finished_at) {
                    (true, Some(at)) => Some(SessionResult::from_session(self.game.session(), at)),
                    _ => None,
                };
                let _ = reply.send(result);
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn start(&mut self, level: u32, choice: StyleChoice, now: f64) {
        if self.game.session().is_playing() {
            info!("Start requested mid-session; stopping the current one first.");
            self.stop(now);
        }

        let style = match choice {
            StyleChoice::Fixed(style) => style,
            StyleChoice::Random => MusicStyle::random(&mut self.rng),
        };
        let session_config = self.config.session_config(level, style);
        let tick_period_ms = session_config.tick_period_ms();
        let sweep_period_ms = session_config.sweep_period_ms;

        self.generation += 1;
        self.game = Game::seeded(session_config, self.rng.random());
        self.next_manual_tick = 0;
        self.finished_at = None;
        self.game.start(now);

        if self.mode == TransportMode::Realtime {
            match Transport::start(
                self.generation,
                tick_period_ms,
                sweep_period_ms,
                Arc::clone(&self.clock),
                self.commands.clone(),
            ) {
                Ok(transport) => self.transport = Some(transport),
                Err(e) => {
                    error!("Failed to start transport timers: {}", e);
                    self.handle_event(GameEvent::Stop { now });
                }
            }
        }
    }

    fn stop(&mut self, now: f64) {
        // Timers are joined before the session is marked ended.
        self.halt_transport();
        self.handle_event(GameEvent::Stop { now });
    }

    fn tick(&mut self, tick: u64, now: f64) {
        let feedback = self.game.handle(GameEvent::Tick { tick, now });
        if self.game.session().is_over() {
            self.halt_transport();
        }
        self.dispatch(feedback);
    }

    fn handle_event(&mut self, event: GameEvent) {
        let feedback = self.game.handle(event);
        self.dispatch(feedback);
    }

    fn dispatch(&mut self, feedback: Vec<Feedback>) {
        for signal in &feedback {
            if let Feedback::SessionEnded(_) = signal {
                self.finished_at = Some(Local::now());
            }
            self.sink.emit(signal);
        }
    }

    fn halt_transport(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.stop();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                "Dropping pulse from stale generation {} (current {})",
                generation, self.generation
            );
            return false;
        }
        true
    }

    fn accepts_manual(&self, what: &str) -> bool {
        if self.mode != TransportMode::Manual {
            warn!("Ignoring manual {} on a realtime transport.", what);
            return false;
        }
        true
    }
}

/// The caller's side of the engine. Input calls are stamped with the shared
/// clock before they are queued. Dropping the handle shuts the engine down.
pub struct EngineHandle {
    commands: Sender<Command>,
    clock: Arc<dyn Clock>,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Starts a session at `level`. A session already in progress is stopped
    /// first.
    pub fn start_game(&self, level: u32, style: StyleChoice) -> Result<()> {
        self.send(Command::Start {
            level,
            style,
            now: self.clock.now_ms(),
        })
    }

    pub fn stop_game(&self) -> Result<()> {
        self.send(Command::Stop { now: self.clock.now_ms() })
    }

    pub fn press_start(&self, x: f64, y: f64) -> Result<()> {
        self.send(Command::PressStart { x, y })
    }

    pub fn press_end(&self, x: f64, y: f64) -> Result<()> {
        self.send(Command::PressEnd {
            x,
            y,
            now: self.clock.now_ms(),
        })
    }

    /// Advances a [`TransportMode::Manual`] session by one tick.
    pub fn tick(&self) -> Result<()> {
        self.send(Command::ManualTick { now: self.clock.now_ms() })
    }

    /// Runs the expiry sweep on a [`TransportMode::Manual`] session.
    pub fn sweep(&self) -> Result<()> {
        self.send(Command::ManualSweep { now: self.clock.now_ms() })
    }

    /// A view of the session after every command queued before this call.
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(Command::Snapshot)
    }

    /// The final tally, once the current session has ended.
    pub fn result(&self) -> Result<Option<SessionResult>> {
        self.request(Command::Result)
    }

    /// Stops any running session and waits for the engine thread to exit.
    pub fn shutdown(mut self) -> Result<()> {
        self.join()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::EngineGone)
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = mpsc::channel();
        self.send(make(tx))?;
        rx.recv().map_err(|_| Error::EngineGone)
    }

    fn join(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.commands.send(Command::Shutdown);
        thread.join().map_err(|_| Error::EngineGone)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            warn!("Game engine did not shut down cleanly: {}", e);
        }
    }
}
