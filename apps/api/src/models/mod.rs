pub mod ai_config;
pub mod application;
pub mod job;
pub mod resume;
pub mod search;
