pub mod adapter;

#[cfg(feature = "trend")]
pub mod trend;
