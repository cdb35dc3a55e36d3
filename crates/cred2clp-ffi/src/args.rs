use std::ffi::CStr;

use crate::error;
use crate::types::*;

/// Convert a required C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn required_str_arg<'a>(
    value: *const CLINT8,
    name: &str,
) -> Result<&'a str, CLINT32> {
    if value.is_null() {
        return Err(error::invalid_ptr(format!("{name} cannot be null")));
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    as_cstr
        .to_str()
        .map_err(|_| error::invalid_ptr(format!("{name} must be valid UTF-8")))
}

/// Borrow a caller buffer of `len` bytes.
///
/// # Safety
/// If non-null, `data` must be writable for `len` bytes for the call.
pub(crate) unsafe fn buffer_arg<'a>(
    data: *mut CLINT8,
    len: CLINT64,
    name: &str,
) -> Result<&'a mut [u8], CLINT32> {
    if data.is_null() || len <= 0 {
        return Err(error::invalid_ptr(format!("{name} is null or empty")));
    }
    let len = usize::try_from(len).map_err(|_| error::invalid_ptr(format!("{name} too large")))?;
    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Ok(unsafe { std::slice::from_raw_parts_mut(data.cast::<u8>(), len) })
}

/// Borrow a read-only caller buffer of `len` bytes.
///
/// # Safety
/// If non-null, `data` must be readable for `len` bytes for the call.
pub(crate) unsafe fn bytes_arg<'a>(
    data: *const CLINT8,
    len: CLINT64,
    name: &str,
) -> Result<&'a [u8], CLINT32> {
    if data.is_null() || len <= 0 {
        return Err(error::invalid_ptr(format!("{name} is null or empty")));
    }
    let len = usize::try_from(len).map_err(|_| error::invalid_ptr(format!("{name} too large")))?;
    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Ok(unsafe { std::slice::from_raw_parts(data.cast::<u8>(), len) })
}

/// `text` as NUL-terminated bytes; interior NULs become `?`.
pub(crate) fn c_text(text: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = text
        .bytes()
        .map(|b| if b == 0 { b'?' } else { b })
        .collect();
    bytes.push(0);
    bytes
}

/// CLProtocol size negotiation: copy `bytes` (NUL included) into `out` if it
/// fits, else report the size needed.
///
/// # Safety
/// `size` must be null or valid for reads and writes; `out` must be null or
/// writable for `*size` bytes.
pub(crate) unsafe fn copy_out(bytes: &[u8], out: *mut CLINT8, size: *mut CLUINT32) -> CLINT32 {
    if size.is_null() {
        return error::invalid_ptr("buffer size pointer cannot be null");
    }
    let Ok(needed) = CLUINT32::try_from(bytes.len()) else {
        return error::invalid_ptr("result does not fit a 32-bit size");
    };

    // SAFETY: `size` is non-null and valid per the caller's contract.
    let available = unsafe { *size };
    if out.is_null() || available < needed {
        // SAFETY: As above.
        unsafe { *size = needed };
        return CL_ERR_BUFFER_TOO_SMALL;
    }

    // SAFETY: `out` holds at least `needed` bytes and cannot overlap our data.
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out.cast::<u8>(), bytes.len());
        *size = needed;
    }
    CL_ERR_NO_ERR
}

/// Write a 4-byte little-endian value into a parameter buffer.
pub(crate) fn put_u32(buf: &mut [u8], value: CLUINT32) {
    buf[..4].copy_from_slice(&value.to_le_bytes());
}

/// Read a 4-byte little-endian value from a parameter buffer.
pub(crate) fn get_u32(buf: &[u8]) -> CLUINT32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[..4]);
    CLUINT32::from_le_bytes(word)
}
