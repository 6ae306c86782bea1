use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tagarena_core::net::messages::NetEvent;
use tagarena_game::events::{EventSink, GameEvent};
use tagarena_game::input::{Direction, InputSource, KeyboardState, MoveIntent};
use tagarena_game::{SessionSnapshot, TagSession};

/// Commands sent from the embedder to the session tick loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// An inbound frame from the room service, already decoded.
    Net(NetEvent),
    /// Switch between foreground and background tick cadence.
    SetBackground(bool),
    Stop,
}

/// Tick cadences for the session loop. Background mode keeps the round
/// timer honest while the window is hidden without burning frames.
#[derive(Debug, Clone, Copy)]
pub struct TickRates {
    pub foreground_hz: f32,
    pub background_hz: f32,
}

impl Default for TickRates {
    fn default() -> Self {
        Self {
            foreground_hz: 60.0,
            background_hz: 30.0,
        }
    }
}

impl TickRates {
    fn period(&self, background: bool) -> Duration {
        let hz = if background {
            self.background_hz
        } else {
            self.foreground_hz
        };
        Duration::from_secs_f32(1.0 / hz)
    }
}

/// Cloneable handle onto a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Forward an inbound frame to the session. Returns false once the
    /// loop has exited.
    pub fn send_net(&self, event: NetEvent) -> bool {
        self.commands.send(SessionCommand::Net(event)).is_ok()
    }

    pub fn set_background(&self, background: bool) {
        let _ = self
            .commands
            .send(SessionCommand::SetBackground(background));
    }

    pub fn stop(&self) {
        let _ = self.commands.send(SessionCommand::Stop);
    }

    /// Latest snapshot published by the loop.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until the loop publishes a new snapshot. Returns false once
    /// the loop has exited.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }
}

/// Spawn a session tick loop as a tokio task. The session is owned by the
/// task; everything else talks to it through the returned handle.
pub fn spawn_session(session: TagSession, rates: TickRates) -> (SessionHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (snap_tx, snap_rx) = watch::channel(session.snapshot());

    let task = tokio::spawn(run_session(session, rates, cmd_rx, snap_tx));

    (
        SessionHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
        },
        task,
    )
}

async fn run_session(
    mut session: TagSession,
    rates: TickRates,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
) {
    let mut background = false;
    let mut interval = tokio::time::interval(rates.period(background));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Steps are measured on the session clock and capped, so a stalled
    // task cannot teleport players when it resumes. Deadlines catch up on
    // their own since they are absolute timestamps.
    let max_step_ms = (session.config().max_step_secs * 1000.0) as u64;
    let mut last = session.now_ms();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = session.now_ms();
                let dt = now.saturating_sub(last).min(max_step_ms);
                last = now;
                session.update(dt as f32 / 1000.0);
                if snapshots.send(session.snapshot()).is_err() {
                    break;
                }
            }
            cmd = commands.recv() => {
                match cmd {
                    Some(SessionCommand::Net(event)) => session.handle_net_event(event),
                    Some(SessionCommand::SetBackground(flag)) => {
                        if flag != background {
                            background = flag;
                            interval = tokio::time::interval(rates.period(background));
                            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                            tracing::debug!(background, "Session tick cadence changed");
                        }
                    }
                    Some(SessionCommand::Stop) | None => break,
                }
            }
        }
    }
}

/// Event sink that forwards session notifications onto a channel, so UI
/// code can consume them outside the tick task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Game event receiver dropped");
        }
    }
}

/// Keyboard state shared between an input thread and the session loop.
/// The UI holds one clone and feeds key transitions; the session polls
/// the other once per tick.
#[derive(Debug, Default, Clone)]
pub struct SharedInput {
    keys: Arc<Mutex<KeyboardState>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, dir: Direction) {
        self.keys.lock().unwrap().press(dir);
    }

    pub fn release(&self, dir: Direction) {
        self.keys.lock().unwrap().release(dir);
    }

    pub fn press_boost(&self) {
        self.keys.lock().unwrap().press_boost();
    }

    pub fn release_boost(&self) {
        self.keys.lock().unwrap().release_boost();
    }

    /// Drop all pressed state, as when the window loses focus.
    pub fn clear(&self) {
        self.keys.lock().unwrap().clear();
    }
}

impl InputSource for SharedInput {
    fn move_intent(&mut self) -> MoveIntent {
        self.keys.lock().unwrap().move_intent()
    }

    fn consume_boost_press(&mut self) -> bool {
        self.keys.lock().unwrap().consume_boost_press()
    }
}
