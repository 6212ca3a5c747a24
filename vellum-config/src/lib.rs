//! Configuration for the Vellum daemon.
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file. [`ConfigLoader`] gathers them into [`EnvConfig`], validates
//! and defaults each value, applies guard rails, and returns an immutable
//! [`Config`] together with any [`ConfigWarnings`] worth logging.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{Config, ConfigMetadata};
pub use sources::EnvConfig;
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};
