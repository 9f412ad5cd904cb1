pub mod collector;
pub mod config;
pub mod executor;
pub mod protocol;
pub mod sampler;
pub mod server;
pub mod socket;
