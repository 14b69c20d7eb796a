pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod otp;
pub mod proto;
pub mod search;
pub mod services;
pub mod shortlink;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
