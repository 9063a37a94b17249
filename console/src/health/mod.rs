//! Gateway health monitoring

pub mod probe;
