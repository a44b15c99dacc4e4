pub mod analyzer;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod requester;
pub mod server;
