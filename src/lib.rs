pub mod catalog;
pub mod config;
pub mod dag;
pub mod executor;
pub mod output;
pub mod planner;
pub mod provider;
pub mod resource;
pub mod sizing;
pub mod stack;
pub mod state;
