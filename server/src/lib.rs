pub mod config;
pub mod network;
pub mod service;
