// ABOUTME: Library root for jroll - exposes the engines and their substrate.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod engine;
pub mod error;
pub mod jail;
pub mod plan;
pub mod remote;
pub mod resolve;
pub mod types;
