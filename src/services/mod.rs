pub mod classifier;
pub mod notify;
pub mod statistics;
pub mod watch;
