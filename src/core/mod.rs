pub mod builder;
pub mod config;
pub mod constants;
pub mod engine;
pub mod geo;
pub mod projection;
pub mod view;
