//! Conversions between the crate's status/identifier types and the
//! `windows` crate's, for hosts written against the Windows SDK bindings.

use restex_core::{check, to_hresult, Error, Guid, Outcome, Result};
use windows::core::{GUID, HRESULT};

pub fn to_windows_guid(guid: &Guid) -> GUID {
    GUID::from_u128(guid.to_u128())
}

pub fn from_windows_guid(guid: &GUID) -> Guid {
    Guid::from_u128(guid.to_u128())
}

/// Collapse a manager result into a Windows `HRESULT`.
pub fn to_windows_hresult(result: Result<Outcome>) -> HRESULT {
    HRESULT(to_hresult(result))
}

pub fn from_windows_hresult(hr: HRESULT) -> Result<Outcome> {
    check(hr.0)
}

/// Map a failure reported by a `windows` API call, keeping its status code.
pub fn device_error(err: &windows::core::Error) -> Error {
    Error::from_hresult(err.code().0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use restex_core::ffi::{E_INVALIDARG, IID_RESOURCE_TEXTURE_MANAGER, S_FALSE};

    #[test]
    fn guid_layouts_agree() {
        let converted = to_windows_guid(&IID_RESOURCE_TEXTURE_MANAGER);
        assert_eq!(converted.data1, IID_RESOURCE_TEXTURE_MANAGER.data1);
        assert_eq!(converted.data4, IID_RESOURCE_TEXTURE_MANAGER.data4);
        assert_eq!(from_windows_guid(&converted), IID_RESOURCE_TEXTURE_MANAGER);
    }

    #[test]
    fn hresults_keep_their_codes() {
        assert_eq!(
            to_windows_hresult(Ok(Outcome::AlreadyInitialized)),
            HRESULT(S_FALSE)
        );
        assert_eq!(
            from_windows_hresult(HRESULT(E_INVALIDARG)),
            Err(Error::InvalidArgument)
        );
        let err = windows::core::Error::from_hresult(HRESULT(E_INVALIDARG));
        assert_eq!(device_error(&err), Error::InvalidArgument);
    }
}
