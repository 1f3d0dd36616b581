pub mod errors;
pub mod observability;
pub mod openapi;
pub mod routes;
pub mod startup;

pub use startup::run_with_config;
