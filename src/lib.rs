//! A small interactive command interpreter.
//!
//! Each line read from the user is resolved either to one of five built-in
//! operations (`cd`, `echo`, `exit`, `help`, `history`) or to an external
//! program, optionally joined with a second command through a single `|`.
//! A session-lifetime history of every entered line is kept and torn down
//! when the session ends: through `exit`, an interrupt, or an idle timeout.
//!
//! The main entry point is [`Interpreter`]. The [`lifecycle`] module installs
//! the signal handling that ends a session asynchronously.

mod builtin;
pub mod command;
pub mod config;
pub mod error;
mod external;
pub mod history;
mod interpreter;
mod lexer;
pub mod lifecycle;
mod parser;
mod pipeline;
pub mod session;
mod signal;
#[cfg(test)]
mod test_support;

pub use builtin::{Builtin, Scope};
pub use interpreter::{Flow, Interpreter};
pub use parser::Limits;
pub use pipeline::PipelineReport;
