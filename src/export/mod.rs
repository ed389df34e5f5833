pub mod config;
pub mod emit;
pub mod output;
pub mod session;
pub mod textures;
