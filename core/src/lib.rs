//! Session core for an LLM player that drives a text-based terminal game.
//!
//! The [`session::Session`] owns the conversation history and the model's
//! key-value memory, talks to the OpenAI Responses API, and feeds extracted
//! commands into a game running behind the [`terminal::GameIo`] seam. The
//! remaining modules are the leaves it is built from: screen diffing, command
//! tag extraction, tool dispatch, the HTTP client, and the PTY-backed game
//! wrapper.

pub mod ansi;
pub mod client;
pub mod command_tag;
pub mod config;
pub mod error;
pub mod history;
pub mod memory;
mod openai_tools;
pub mod screen_diff;
pub mod session;
pub mod terminal;
pub mod transcript;

pub use autoquest_protocol::TokenUsage;
pub use config::Config;
pub use error::PlayerErr;
pub use error::Result;
pub use session::Session;
pub use session::SessionEvent;
pub use history::TurnResult;
