pub mod role;
pub mod row;
pub mod source_config;
pub mod task;
