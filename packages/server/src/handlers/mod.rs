pub mod auth;
pub mod history;
pub mod upload;
