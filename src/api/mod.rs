//! API module
//!
//! Contains HTTP request handlers for the member and photo endpoints

pub mod photos;
pub mod users;
pub mod utils;
