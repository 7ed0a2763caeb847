pub mod config;
pub mod patterns;
