//! Client for the river-claiming punter game.
//!
//! The server hands out a map of sites and rivers with a few mines; every
//! punter claims one river per turn. This crate speaks the length-prefixed
//! JSON protocol, keeps a local copy of the map and picks a river to claim
//! each turn, either over a persistent TCP connection or as a stateless
//! one-shot process that round-trips its state through the server.

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod punter;
pub mod session;
pub mod strategy;
pub mod transport;

pub use crate::error::{Error, Result};
