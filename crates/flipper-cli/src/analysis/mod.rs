pub mod config;
pub mod report;
pub mod run;
pub mod summary;
