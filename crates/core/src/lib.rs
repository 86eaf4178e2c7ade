pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod normalize;
pub mod policy;

pub use error::CancelError;
