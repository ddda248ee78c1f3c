//! Error mapping extension trait, carried from the teacher's
//! `infrastructure::database::repository_ext` to avoid repeating
//! `.map_err(AppError::Database)` across every repository method.

use tracing::error;

use crate::shared::{AppError, AppResult};

pub trait RepositoryErrorExt<T> {
    fn map_db_error(self, operation: &str, entity: &str) -> AppResult<T>;
}

impl<T> RepositoryErrorExt<T> for Result<T, sqlx::Error> {
    fn map_db_error(self, operation: &str, entity: &str) -> AppResult<T> {
        self.map_err(|e| {
            error!(operation, entity, error = %e, "database error");
            AppError::Database(e)
        })
    }
}
