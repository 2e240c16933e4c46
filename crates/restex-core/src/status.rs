//! Status taxonomy shared by the manager and its host collaborators.
//!
//! Every operation reports a status instead of panicking. Failures are carried
//! as [`Error`]; the two success codes are carried as [`Outcome`].

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};

use crate::ffi::*;

/// Every status code the manager itself produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum Status {
    Ok = S_OK,
    AlreadyInitialized = S_FALSE,
    NullPointer = E_POINTER,
    InvalidArgument = E_INVALIDARG,
    InsufficientBuffer = E_NOT_SUFFICIENT_BUFFER,
    NotValidState = E_NOT_VALID_STATE,
    OutOfMemory = E_OUTOFMEMORY,
    NotImplemented = E_NOTIMPL,
    NoInterface = E_NOINTERFACE,
    Fail = E_FAIL,
}

impl Status {
    pub fn hresult(self) -> HRESULT {
        // ToPrimitive on a fieldless #[repr(i32)] enum never fails.
        self.to_i32().unwrap_or(E_FAIL)
    }

    pub fn from_hresult(hr: HRESULT) -> Option<Self> {
        Self::from_i32(hr)
    }
}

/// Successful result of a state transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation did what was asked (`S_OK`).
    Applied,
    /// The operation was already done earlier and was accepted as a no-op
    /// (`S_FALSE`).
    AlreadyInitialized,
}

impl Outcome {
    pub fn hresult(self) -> HRESULT {
        match self {
            Outcome::Applied => Status::Ok.hresult(),
            Outcome::AlreadyInitialized => Status::AlreadyInitialized.hresult(),
        }
    }
}

/// Failure of a manager or device operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// A required pointer or slice was missing.
    #[error("required pointer argument was null")]
    NullPointer,
    /// Malformed shape: bad dimension count, zero extent, unknown format,
    /// stride too small, or arithmetic overflow.
    #[error("invalid argument")]
    InvalidArgument,
    /// The buffer size does not match the declared layout.
    #[error("buffer size does not match the declared layout")]
    InsufficientBuffer,
    /// The operation's prerequisite transition has not happened.
    #[error("object is not in a valid state for this call")]
    NotValidState,
    #[error("out of memory")]
    OutOfMemory,
    #[error("not implemented")]
    NotImplemented,
    #[error("no such interface")]
    NoInterface,
    #[error("unspecified failure")]
    Fail,
    /// Any other failure code, passed through from the host device as-is.
    // Signed hex formatting prints the two's complement bits.
    #[error("device call failed with {0:#010X}")]
    Device(HRESULT),
}

impl Error {
    pub fn hresult(self) -> HRESULT {
        match self {
            Error::NullPointer => Status::NullPointer.hresult(),
            Error::InvalidArgument => Status::InvalidArgument.hresult(),
            Error::InsufficientBuffer => Status::InsufficientBuffer.hresult(),
            Error::NotValidState => Status::NotValidState.hresult(),
            Error::OutOfMemory => Status::OutOfMemory.hresult(),
            Error::NotImplemented => Status::NotImplemented.hresult(),
            Error::NoInterface => Status::NoInterface.hresult(),
            Error::Fail => Status::Fail.hresult(),
            Error::Device(hr) => hr,
        }
    }

    /// Map a failure code back to an [`Error`].
    ///
    /// Success codes are not errors; they map to [`Error::Device`] so the raw
    /// value is still preserved.
    pub fn from_hresult(hr: HRESULT) -> Self {
        match Status::from_hresult(hr) {
            Some(Status::NullPointer) => Error::NullPointer,
            Some(Status::InvalidArgument) => Error::InvalidArgument,
            Some(Status::InsufficientBuffer) => Error::InsufficientBuffer,
            Some(Status::NotValidState) => Error::NotValidState,
            Some(Status::OutOfMemory) => Error::OutOfMemory,
            Some(Status::NotImplemented) => Error::NotImplemented,
            Some(Status::NoInterface) => Error::NoInterface,
            Some(Status::Fail) => Error::Fail,
            Some(Status::Ok) | Some(Status::AlreadyInitialized) | None => Error::Device(hr),
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Collapse a result into the raw code returned across the binary boundary.
pub fn to_hresult(result: Result<Outcome>) -> HRESULT {
    match result {
        Ok(outcome) => outcome.hresult(),
        Err(err) => err.hresult(),
    }
}

/// Interpret a raw code returned across the binary boundary.
pub fn check(hr: HRESULT) -> Result<Outcome> {
    match hr {
        S_FALSE => Ok(Outcome::AlreadyInitialized),
        hr if SUCCEEDED(hr) => Ok(Outcome::Applied),
        hr => Err(Error::from_hresult(hr)),
    }
}
