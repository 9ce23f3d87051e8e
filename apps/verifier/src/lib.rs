pub mod client;
pub mod config;
pub mod errors;
pub mod keywords;
pub mod models;
pub mod normalize;
pub mod projector;
pub mod session;
pub mod status;
pub mod views;

#[cfg(test)]
mod testing;
