pub mod compositions;
pub mod config;
pub mod jobs;
pub mod render;
