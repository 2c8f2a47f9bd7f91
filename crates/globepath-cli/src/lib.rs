//! globepath CLI library.
//!
//! Rendering of graph summaries, routes and engine events for the `globepath`
//! binary, kept in a library so the formatting can be unit tested.

pub mod console;
pub mod output;
pub mod terminal;
