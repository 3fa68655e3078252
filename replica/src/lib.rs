//! Headless replica of the authoritative game state.
//!
//! A replica mirrors the server's ordered broadcast stream into a local
//! view, and - when it is the display for a player - integrates that
//! player's physics from relayed controller tilt and publishes the result
//! back to the authority. Rendering sits on top of [`view::ReplicaView`];
//! nothing in this crate draws anything.

pub mod connection;
pub mod pilot;
pub mod view;
