pub mod app;
pub mod config;
pub mod connectivity;
pub mod gateway;
pub mod image;
pub mod keyring;
pub mod message;
pub mod persistence;
pub mod session;
pub mod session_store;
pub mod single_flight;
pub mod status;
pub mod style;
pub mod voice;
