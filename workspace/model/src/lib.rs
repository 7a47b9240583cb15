pub mod cascade;
pub mod entities;
pub mod schema;

// Re-export tracing for use in this crate
pub use tracing;
