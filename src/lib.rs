pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use db::Database;
pub use error::{ServiceError, ServiceResult};
pub use services::ContactService;
