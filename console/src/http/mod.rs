//! HTTP client for the gateway

pub mod client;
