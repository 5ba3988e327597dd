//! A very small interactive shell.
//!
//! A line comes in from the terminal or a script, gets split into
//! arguments with quoting and bracket grouping, is expanded one
//! argument at a time, and ends up at a builtin or an external
//! program. [`Interpreter`] drives that loop; [`Session`] holds the
//! state commands share between lines.

pub mod builtin;
pub mod config;
pub mod expand;
pub mod external;
pub mod interpreter;
pub mod lexer;
pub mod prompt;
pub mod session;

pub use interpreter::Interpreter;
pub use session::Session;
