//! Supervisor configuration.
//!
//! This module provides:
//! - The shared [`RetryPolicy`] applied to every stage attempt
//! - [`SupervisorConfig`], loaded from defaults, a JSON file and the environment

mod policy;
mod settings;

pub use policy::{BackoffStrategy, JitterStrategy, RetryPolicy};
pub use settings::{SupervisorConfig, ENV_PREFIX};
