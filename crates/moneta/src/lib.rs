pub mod agent;
pub mod bridge;
pub mod context;
pub mod errors;
pub mod models;
pub mod providers;
pub mod retrieval;
