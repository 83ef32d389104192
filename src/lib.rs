pub mod config;
pub mod data;
pub mod debounce;
pub mod docs;
pub mod hit;
pub mod projection;
pub mod regions;
pub mod render;
pub mod scale;
pub mod server;
pub mod types;
pub mod view;
