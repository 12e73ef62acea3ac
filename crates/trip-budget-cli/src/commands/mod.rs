pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod dates;
pub mod delete;
pub mod export;
pub mod list;
pub mod summary;
pub mod sync;
