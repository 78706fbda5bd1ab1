pub mod logger;
pub mod config;

pub use logger::{init_logger, Logger};
pub use config::{RetryPolicy, RouterSettings};
