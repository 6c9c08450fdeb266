pub mod cache;
pub mod elasticsearch;
pub mod models;
pub mod time_serde;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
