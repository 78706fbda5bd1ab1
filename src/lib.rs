// Library interface of the distance vector router: wire protocol, transport
// endpoints, routing core and the configuration it starts from.

pub mod client;
pub mod server;
pub mod core;
pub mod protocol;
pub mod utils;
pub mod error;
pub mod types;
pub mod read_config;
pub mod tasks;
pub mod init;

pub use error::{AppError, Result};
pub use types::{Link, RouterId, RouterIdentity, INFINITY};
