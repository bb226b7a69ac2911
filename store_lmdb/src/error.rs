use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("corrupt record: {0}")]
    Corruption(String),

    #[error("unsupported schema: {0}")]
    Schema(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<ratings_store::StoreError> for LmdbError {
    fn from(e: ratings_store::StoreError) -> Self {
        use ratings_store::StoreError;
        match e {
            StoreError::NotFound(what) => LmdbError::NotFound(what),
            StoreError::Serialization(msg) => LmdbError::Serialization(msg),
            StoreError::Corruption(msg) => LmdbError::Corruption(msg),
            other => LmdbError::Heed(other.to_string()),
        }
    }
}

impl From<LmdbError> for ratings_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(what) => ratings_store::StoreError::NotFound(what),
            LmdbError::Serialization(msg) => ratings_store::StoreError::Serialization(msg),
            LmdbError::Corruption(msg) => ratings_store::StoreError::Corruption(msg),
            other => ratings_store::StoreError::Backend(other.to_string()),
        }
    }
}
