//! KeyVault Library
//!
//! Operator console and credential gateway for firewall API key generation.

pub mod app;
pub mod directory;
pub mod errors;
pub mod filesys;
pub mod gateway;
pub mod health;
pub mod http;
pub mod keys;
pub mod logs;
pub mod session;
pub mod storage;
pub mod utils;
pub mod workers;
