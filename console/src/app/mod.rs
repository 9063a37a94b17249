//! Application wiring and run loops

pub mod options;
pub mod run;
