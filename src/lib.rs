pub mod config;
pub mod console;
pub mod datetime;
pub mod filter;
pub mod permissions;
pub mod project;
pub mod reducers;
pub mod session;
pub mod time_entry;
pub mod timelog;
pub mod timelog_api;
pub mod timelog_command;
pub mod user_management;
pub mod user_profile;
pub mod users_command;
