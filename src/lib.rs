//! # Poly REPL client
//!
//! An interactive read-eval-print client for a remote Poly evaluator. The user
//! types an expression, the client echoes it immediately, sends it to the
//! evaluator, and renders the returned result or error.
//!
//! ## Evaluation Pipeline
//!
//! ```text
//! input → EvaluationSession::submit ─┬─ echo:    Cell::Input            (synchronous)
//!                                    └─ outcome: POST eval → map_response
//!                                                → Cell::Result | Cell::Error
//! ```
//!
//! - Cells and rendering ([`cell`])
//! - Wire types ([`protocol`]) and the evaluator transport ([`client`])
//! - Response mapping ([`mapper`])
//! - Two-phase submission ([`session`])
//! - Trigger and cell list wiring ([`orchestrator`]), terminal loop ([`repl`])
//!
//! Every failure except a blank submission ends up as an error cell delivered
//! through the outcome; nothing escapes the pipeline as a panic.

pub mod cell;
pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod protocol;
pub mod repl;
pub mod session;

// Re-exports
pub use cell::{Cell, CellCategory, HtmlRenderer, Renderer, TerminalRenderer};
pub use error::*;
pub use session::{EvaluationSession, Submission};
