pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod global;
pub mod logs;
pub mod processing;
pub mod recorder;
pub mod scheduler;
pub mod twitch;
