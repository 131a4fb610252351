pub mod backup;
pub mod challenge;
pub mod config;
pub mod history;
pub mod profile;
pub mod quest;
pub mod reset;
pub mod status;
pub mod task;
