//! Background workers

pub mod liveness;
