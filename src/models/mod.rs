pub mod ai;
pub mod conversation;
pub mod settings;
pub mod stock;
