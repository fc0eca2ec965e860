pub mod args;
pub mod models;
