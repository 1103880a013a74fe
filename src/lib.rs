//! Club Gate - paid access to a private chat group
//!
//! This crate runs a chat bot that sells time-limited membership of one
//! group: users pick a tier and send a payment receipt, an administrator
//! approves it, and the bot hands out single-use invite links, gates join
//! requests, and removes members whose access has lapsed.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
