pub mod builder;
pub mod client;
pub mod headers;
pub mod models;
pub mod urls;
