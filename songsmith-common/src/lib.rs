//! # Songsmith Common Library
//!
//! Shared code for the Songsmith workspace:
//! - Error type (`Error`, `Result`)
//! - TOML configuration schema and atomic write-back
//! - Operating language (`Language`)
//! - Event types (`SongEvent`) and the broadcast `EventBus`

pub mod config;
pub mod error;
pub mod events;
pub mod language;

pub use error::{Error, Result};
pub use language::Language;
