pub mod audit;
pub mod pool;

pub use audit::record_audit;
pub use pool::{create_pool, PoolSettings};
