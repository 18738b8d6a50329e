//! Client-side orchestration for the structure viewer.
//!
//! Everything here is single-threaded and executor-agnostic: futures are
//! `!Send` and are handed to whatever local spawner the host provides
//! (`spawn_local` in the browser, a plain queue in tests). The rendering
//! engine, script injection and the HTTP client are reached only through the
//! traits in [`engine`], [`loader`] and [`selection`].

pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod selection;

#[cfg(test)]
mod testing;

pub use binding::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use loader::*;
pub use orchestrator::*;
pub use selection::*;
