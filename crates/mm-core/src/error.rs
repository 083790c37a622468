/// Errors surfaced by snapshot decoding and the storage boundary.
///
/// Mutations on a live tree never fail; an invalid target is a no-op.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary snapshot encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("binary snapshot decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl Error {
    /// True for errors caused by the snapshot contents rather than by the
    /// storage collaborator. These are the ones a loader may recover from
    /// by starting over with a default diagram.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedSnapshot(_) | Error::Json(_) | Error::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
