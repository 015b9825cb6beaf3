pub mod context;
pub mod module;
