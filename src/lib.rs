pub mod config;
pub mod extract;
pub mod output;
pub mod report;
pub mod sanitize;
pub mod transcript;
