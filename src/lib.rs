#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod listing;
pub mod model;
pub mod registry;
pub mod store;
