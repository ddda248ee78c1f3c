pub mod audit;
pub mod error;
pub mod normalize;
pub mod result;

pub use audit::{HasTimestamps, Timestamps};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
