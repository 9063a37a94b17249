//! API key request workflow

pub mod extract;
pub mod ip;
pub mod result;
pub mod workflow;
