pub(crate) mod cache;
pub mod config;
pub mod error;
pub mod models;
pub(crate) mod scoring;
pub mod validator;
