use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Fewer bytes remain than a fixed-width field or a declared blob requires.
    #[error("input truncated")]
    TruncatedInput,
    /// Marshal target cannot hold the encoded structure.
    #[error("buffer too short to be written")]
    BufferTooShort,
    /// A discriminant, box header or size bookkeeping field contradicts the
    /// record layout.
    #[error("malformed hint record")]
    InvalidFormat,
    /// Declared counts or lengths are inconsistent with the declared or
    /// available sample size.
    #[error("invalid hint media")]
    InvalidMedia,
    /// The protocol type is not one of the known hint protocols.
    #[error("unsupported hint protocol")]
    UnsupportedProtocol,
    /// The operation is not defined for this packet variant.
    #[error("operation not supported by this packet type")]
    InvalidOperation,
    /// An owned buffer could not be grown to the declared length.
    #[error("allocation failure")]
    OutOfMemory,

    #[error("{0}")]
    Util(#[from] util::Error),

    #[error("{0}")]
    Other(String),
}

impl From<Error> for util::Error {
    fn from(e: Error) -> Self {
        util::Error::from_std(e)
    }
}

impl PartialEq<util::Error> for Error {
    fn eq(&self, other: &util::Error) -> bool {
        if let Some(down) = other.downcast_ref::<Error>() {
            return self == down;
        }
        false
    }
}
