pub mod builder;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod node;
pub mod payload;
pub mod state_machine;
