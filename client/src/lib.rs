pub mod caller;
pub mod config;
pub mod deploy;
