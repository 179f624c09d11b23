//! Gateway side of the pipeline.
//!
//! `handler.rs` converts each slash command interaction into an [`Invocation`](crate::dispatch::Invocation)
//! with [`invocation_from`] and hands the pipeline an [`InteractionResponder`] to reply through.

pub mod invocation;
pub mod responder;

pub use invocation::{invocation_from, subcommand_path};
pub use responder::InteractionResponder;
