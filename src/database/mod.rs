pub mod sqlx;
pub mod store;

pub use store::Store;
