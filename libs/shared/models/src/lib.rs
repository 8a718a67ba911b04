pub mod clinic;
pub mod error;
pub mod facts;

pub use clinic::*;
pub use error::AppError;
pub use facts::*;
