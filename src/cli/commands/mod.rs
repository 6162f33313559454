pub mod config;
pub mod connect;
pub mod disconnect;
pub mod edit;
pub mod facets;
pub mod init;
pub mod log;
pub mod map;
pub mod period;
pub mod rows;
pub mod tables;
pub mod task;
pub mod timer;
pub mod watch;
