//! Key gateway
//!
//! The backend the console talks to: holds appliance credentials and
//! exchanges them for API keys on request.

pub mod error;
pub mod handlers;
pub mod keygen;
pub mod serve;
pub mod vault;
