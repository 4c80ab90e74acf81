//! Avatar Sync - client-side multiplayer state synchronization
//!
//! Keeps a local avatar driven by keyboard input and mirror copies of every
//! other connected player in sync over a relay:
//! - Local input and pose selection for the player's own avatar
//! - Remote avatar lifecycle keyed by relay-assigned identity
//! - Smoothed remote poses with motion-derived animation
//! - Named-event protocol to and from the relay

pub mod app;
pub mod config;
pub mod game;
pub mod util;
pub mod ws;
