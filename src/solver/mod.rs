pub mod genetic;

pub use genetic::search::solve;
pub use genetic::{SolverParams, ValidationError};
