pub mod chat;
pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod stream;
pub mod trace;

pub use error::{Error, Result};
