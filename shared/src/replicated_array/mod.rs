pub mod change;
pub mod config;
pub mod error;
pub mod message;
pub mod replicated_array;
