pub mod pool;
pub mod schema;
pub mod suppression;

pub use pool::DbPool;
