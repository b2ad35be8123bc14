pub mod calendar;
pub mod color;
pub mod config;
pub mod cosmetics;
pub mod cycle;
pub mod db;
pub mod error;
pub mod flair;
pub mod forum;
pub mod header;
pub mod http;
pub mod imgur;
pub mod ingest;
pub mod io;
pub mod ranking;
pub mod reddit;
pub mod resolver;
pub mod splice;
pub mod store;
pub mod templates;
pub mod types;

#[cfg(test)]
mod testutil;

pub use error::{ContestError, Result};
