pub mod app;
pub mod chat;
pub mod components;
pub mod settings;

pub use app::{PlantChatApp, Theme};
