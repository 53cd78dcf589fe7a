use std::error;
use std::fmt;
use std::result;

/// Errors reported by operations whose preconditions are validated at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// A join was attempted where some key of the left map is not less than every key of the
    /// right map.
    OverlappingRanges,
    /// A join was attempted between maps whose priorities come from different allocators, so
    /// their priorities are not guaranteed to be distinct.
    AllocatorMismatch,
}

pub type Result<T> = result::Result<T, Error>;

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OverlappingRanges => write!(
                f,
                "cannot join: every key of the left map must be less than every key of the right map",
            ),
            Error::AllocatorMismatch => write!(
                f,
                "cannot join: maps draw priorities from different allocators",
            ),
        }
    }
}
