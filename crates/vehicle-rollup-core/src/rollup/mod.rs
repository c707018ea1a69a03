pub mod aggregate;
pub mod metrics;
pub mod record;
pub mod segment;
