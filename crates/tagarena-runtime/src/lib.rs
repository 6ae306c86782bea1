//! Tokio driver for Tag Arena sessions.
//!
//! [`game_loop`] ticks a [`tagarena_game::TagSession`] on an interval and
//! exposes it through command and snapshot channels, so embedders never
//! touch the simulation from more than one task. [`hub`] is an in-process
//! room service with the same fan-out contract as the realtime backend:
//! peers exchange encoded frames, never shared state.

pub mod game_loop;
pub mod hub;

pub use game_loop::{
    ChannelSink, SessionCommand, SessionHandle, SharedInput, TickRates, spawn_session,
};
pub use hub::{HubTransport, LocalHub};
