pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod server;
pub mod service;
pub mod utils;

pub use config::Config;
pub use error::ForgeError;
