use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate
            }
            _ => DatabaseError::Sqlx(err),
        }
    }
}
