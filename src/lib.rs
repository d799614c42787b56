pub mod card;
pub mod catalog;
pub mod config;
pub mod data;
pub mod filter;
pub mod planner;
pub mod render;
pub mod selection;
pub mod server;
pub mod types;
