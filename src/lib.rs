pub mod config;
pub mod errors;
pub mod files;
pub mod host;
pub mod mount;
pub mod services;
