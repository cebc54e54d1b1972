//! Chat Relay - Real-time direct messaging backend
//!
//! One-to-one messaging with presence and typing indicators. Each process
//! keeps at most one WebSocket connection per user; processes share a
//! Redis online set and fan events out over Redis pub/sub so a message
//! reaches its receiver whichever process holds their socket.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
