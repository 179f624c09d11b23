// Library entry so integration tests and the binary share the same modules.
pub mod commands;
pub mod config;
pub mod constants;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod interactions;
pub mod model;
pub mod services;
pub mod telemetry;

pub use dispatch::{CommandDescriptor, CommandHandler, CommandManager, Context, Dispatch};
pub use model::AppState;
