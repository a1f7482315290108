//! # lexi-settings
//!
//! Configuration management with layered sources for the Lexi engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`LexiSettings::default()`]
//! 2. **User file** — JSON, deep-merged over defaults
//! 3. **Environment variables** — `LEXI_*` overrides (highest priority)
//!
//! There is no global singleton: loaders return a value that callers inject
//! into the services that need it.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path};
pub use types::*;
