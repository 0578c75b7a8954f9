pub mod ai;
pub mod config;
pub mod relay;
pub mod ui;
pub mod utils;
