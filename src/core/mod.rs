pub mod aggregate;
pub mod edit;
pub mod engine;
pub mod log;
pub mod mapping;
pub mod mirror;
pub mod normalize;
pub mod period;
pub mod scheduler;
pub mod tracker;
