//! Command handlers
//!
//! This module contains the implementation logic behind the CLI flags.

mod completions;
mod resolve;
mod utils;

pub use completions::handle_completions;
pub use resolve::handle_resolve;
