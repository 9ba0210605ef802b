//! Causerie is a terminal chat client for OpenAI-compatible chat APIs with a
//! persistent, multi-session history.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns sessions, preferences, the model gateway and the
//!   application object that every user action goes through.
//! - [`commands`] implements slash-command parsing and execution for the
//!   chat loop.
//! - [`cli`] parses arguments, wires the application together and runs the
//!   chat loop or one-shot commands.
//! - [`auth`] resolves, stores and removes the API key.
//! - [`api`] defines the chat-completions payloads sent over the wire.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod utils;
