//! Core traits for beans managed by the container.

mod bean;
mod lifecycle;

pub use bean::{Bean, Component, Provides};
pub use lifecycle::{Closeable, ContextAware, Initializing};
