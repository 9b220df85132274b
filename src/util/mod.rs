//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;

pub use config::Config;
pub use context::{Env, GlobalContext, ProcessEnv};
pub use diagnostic::Diagnostic;
