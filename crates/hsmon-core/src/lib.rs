pub mod config;
pub mod logging;

// Progress engine
pub mod keyspace;
pub mod model;
pub mod monitor;
pub mod progress;
pub mod render;

// Coordinator access
pub mod fetch;
pub mod retry;
