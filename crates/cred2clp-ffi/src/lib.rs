//! CLProtocol C-ABI exports for the C-RED2 adapter.
//!
//! A GenICam CLProtocol host loads this library, probes each frame grabber
//! port with `clpProbeDevice`, and then reads and writes registers through
//! the returned cookie. All state lives in one process-wide engine.

#![allow(non_snake_case, non_camel_case_types)]

mod args;
mod error;
mod logging;
mod plugin;
mod serial;
pub mod types;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use cred2clp_session::EngineError;
use tracing::{debug, info};

use crate::args::{buffer_arg, bytes_arg, c_text, copy_out, get_u32, put_u32, required_str_arg};
use crate::plugin::engine;
use crate::serial::HostSerial;
pub use crate::types::*;

/// CLProtocol version implemented by this adapter.
pub const CLP_VERSION_MAJOR: CLUINT32 = 1;
pub const CLP_VERSION_MINOR: CLUINT32 = 1;

fn ffi_boundary(export: &str, f: impl FnOnce() -> CLINT32) -> CLINT32 {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::panicked(export);
            CL_ERR_INVALID_PTR
        }
    }
}

/// Unwrap an argument check, returning its status code from the export.
macro_rules! try_arg {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(code) => return code,
        }
    };
}

/// Unwrap an engine result, returning the mapped status code from the export.
macro_rules! try_engine {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return error::code_for(&err),
        }
    };
}

/// # Safety
/// `serial` must be null or point to a live `ISerial` for the call.
unsafe fn serial_arg(serial: *mut ISerial) -> Result<HostSerial, CLINT32> {
    // SAFETY: Forwarded from the caller.
    unsafe { HostSerial::new(serial) }.ok_or_else(|| error::invalid_ptr("serial interface is null"))
}

fn timeout(ms: CLUINT32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

fn require_session(cookie: CLUINT32) -> Result<(), CLINT32> {
    engine().session(cookie).map(|_| ()).map_err(|err| {
        let code = error::code_for(&err);
        engine().record_failure(err);
        code
    })
}

/// Initialise the library and register the host logger.
#[no_mangle]
pub extern "C" fn clpInitLib(logger: clp_logger_t, log_level: CLP_LOG_LEVEL_VALUE) -> CLINT32 {
    ffi_boundary("clpInitLib", || {
        logging::set_logger(logger);
        logging::set_log_level(log_level);
        logging::install();
        info!(version = env!("CARGO_PKG_VERSION"), "CLProtocol adapter initialized");
        CL_ERR_NO_ERR
    })
}

/// Release every session and the cached register description.
#[no_mangle]
pub extern "C" fn clpCloseLib() -> CLINT32 {
    ffi_boundary("clpCloseLib", || {
        engine().close();
        CL_ERR_NO_ERR
    })
}

/// Device templates this adapter answers to.
///
/// # Safety
/// `pShortDeviceTemplates` must be null or writable for `*pBufferSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpGetShortDeviceIDTemplates(
    pShortDeviceTemplates: *mut CLINT8,
    pBufferSize: *mut CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetShortDeviceIDTemplates", || {
        let templates = c_text(&engine().short_device_id_templates());
        // SAFETY: Forwarded from the caller.
        unsafe { copy_out(&templates, pShortDeviceTemplates, pBufferSize) }
    })
}

/// Open a session if the template names this adapter's device.
///
/// The device ID buffer is checked before anything else, so a size query
/// never opens a session.
///
/// # Safety
/// `pSerial` must point to a live `ISerial`. `pDeviceIDTemplate` must be a
/// NUL-terminated string. `pDeviceID` must be null or writable for
/// `*pBufferSize` bytes. `pBufferSize` and `pCookie` must be valid.
#[no_mangle]
pub unsafe extern "C" fn clpProbeDevice(
    pSerial: *mut ISerial,
    pDeviceIDTemplate: *const CLINT8,
    pDeviceID: *mut CLINT8,
    pBufferSize: *mut CLUINT32,
    pCookie: *mut CLUINT32,
    TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpProbeDevice", || {
        if pBufferSize.is_null() || pCookie.is_null() {
            return error::invalid_ptr("invalid probe arguments");
        }
        // SAFETY: Forwarded from the caller.
        let templates = try_arg!(unsafe { required_str_arg(pDeviceIDTemplate, "device template") });
        let mut serial = try_arg!(unsafe { serial_arg(pSerial) });

        let expected = c_text(&engine().config().identity.device_id());
        // SAFETY: Checked non-null above.
        let available = unsafe { *pBufferSize };
        if pDeviceID.is_null() || (available as usize) < expected.len() {
            // SAFETY: As above.
            unsafe { *pBufferSize = expected.len() as CLUINT32 };
            return CL_ERR_BUFFER_TOO_SMALL;
        }

        debug!(templates, timeout_ms = TimeOut, "probe");
        let probed = try_engine!(engine().probe(&mut serial, templates));
        // SAFETY: Buffer size was checked above; pointers are valid per the contract.
        let rc = unsafe { copy_out(&c_text(&probed.device_id), pDeviceID, pBufferSize) };
        if rc != CL_ERR_NO_ERR {
            let _ = engine().disconnect(probed.handle.get());
            return rc;
        }
        // SAFETY: Checked non-null above.
        unsafe { *pCookie = probed.handle.get() };
        CL_ERR_NO_ERR
    })
}

/// Tab-separated XML IDs for the session's device.
///
/// # Safety
/// `pXMLIDs` must be null or writable for `*pBufferSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpGetXMLIDs(
    _pSerial: *mut ISerial,
    Cookie: CLUINT32,
    pXMLIDs: *mut CLINT8,
    pBufferSize: *mut CLUINT32,
    _TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetXMLIDs", || {
        let ids = try_engine!(engine().xml_ids(Cookie));
        // SAFETY: Forwarded from the caller.
        unsafe { copy_out(&c_text(&ids), pXMLIDs, pBufferSize) }
    })
}

/// The register description for `pXMLID`, NUL included.
///
/// # Safety
/// `pXMLID` must be a NUL-terminated string. `pXMLBuffer` must be null or
/// writable for `*pBufferSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpGetXMLDescription(
    _pSerial: *mut ISerial,
    Cookie: CLUINT32,
    pXMLID: *const CLINT8,
    pXMLBuffer: *mut CLINT8,
    pBufferSize: *mut CLUINT32,
    _TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetXMLDescription", || {
        try_arg!(require_session(Cookie));
        if pBufferSize.is_null() {
            return error::invalid_ptr("buffer size pointer cannot be null");
        }
        // SAFETY: Forwarded from the caller.
        let xml_id = try_arg!(unsafe { required_str_arg(pXMLID, "XML ID") });
        let document = try_engine!(engine().description(Cookie, xml_id));
        // SAFETY: Forwarded from the caller.
        unsafe { copy_out(document.as_bytes_with_nul(), pXMLBuffer, pBufferSize) }
    })
}

/// Read a register into `pBuffer`.
///
/// # Safety
/// `pSerial` must point to a live `ISerial`. `pBuffer` must be writable for
/// `BufferSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpReadRegister(
    pSerial: *mut ISerial,
    Cookie: CLUINT32,
    Address: CLINT64,
    pBuffer: *mut CLINT8,
    BufferSize: CLINT64,
    TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpReadRegister", || {
        try_arg!(require_session(Cookie));
        // SAFETY: Forwarded from the caller.
        let buf = try_arg!(unsafe { buffer_arg(pBuffer, BufferSize, "buffer") });
        let mut serial = try_arg!(unsafe { serial_arg(pSerial) });
        error::status(engine().read_register(
            Cookie,
            Address as u64,
            &mut serial,
            timeout(TimeOut),
            buf,
        ))
    })
}

/// Write `pBuffer` to a register.
///
/// # Safety
/// `pSerial` must point to a live `ISerial`. `pBuffer` must be readable for
/// `BufferSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpWriteRegister(
    pSerial: *mut ISerial,
    Cookie: CLUINT32,
    Address: CLINT64,
    pBuffer: *const CLINT8,
    BufferSize: CLINT64,
    TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpWriteRegister", || {
        try_arg!(require_session(Cookie));
        // SAFETY: Forwarded from the caller.
        let payload = try_arg!(unsafe { bytes_arg(pBuffer, BufferSize, "buffer") });
        let mut serial = try_arg!(unsafe { serial_arg(pSerial) });
        error::status(engine().write_register(
            Cookie,
            Address as u64,
            payload,
            &mut serial,
            timeout(TimeOut),
        ))
    })
}

/// Writes complete synchronously, so there is never a pending write.
#[no_mangle]
pub extern "C" fn clpContinueWriteRegister(
    _pSerial: *mut ISerial,
    Cookie: CLUINT32,
    _ContinueWaiting: BOOL8,
    _TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpContinueWriteRegister", || {
        try_arg!(require_session(Cookie));
        engine().record_failure(EngineError::InvalidArgument(
            "no register write is pending".to_string(),
        ));
        CL_ERR_INVALID_REFERENCE
    })
}

/// Text of the most recent failure.
///
/// # Safety
/// `errorText` must be null or writable for `*errorTextSize` bytes.
#[no_mangle]
pub unsafe extern "C" fn clpGetErrorText(
    errorCode: CLINT32,
    errorText: *mut CLINT8,
    errorTextSize: *mut CLUINT32,
    _Cookie: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetErrorText", || {
        if errorTextSize.is_null() {
            return CL_ERR_INVALID_PTR;
        }
        // The most recent failure wins; the code only names a fallback.
        let mut text = engine().last_error();
        if text.is_empty() {
            text = describe_code(errorCode).to_string();
        }
        // SAFETY: Forwarded from the caller.
        unsafe { copy_out(&c_text(&text), errorText, errorTextSize) }
    })
}

fn describe_code(code: CLINT32) -> &'static str {
    match code {
        CL_ERR_NO_ERR => "no error",
        CL_ERR_BUFFER_TOO_SMALL => "buffer too small",
        CL_ERR_TIMEOUT => "timeout",
        CL_ERR_INVALID_REFERENCE => "invalid reference",
        CL_ERR_BAUD_RATE_NOT_SUPPORTED => "baud rate not supported",
        CL_ERR_OUT_OF_MEMORY => "out of memory",
        CL_ERR_INVALID_DEVICEID => "invalid device ID",
        CL_ERR_INVALID_COOKIE => "invalid cookie",
        CL_ERR_INVALID_PTR => "invalid pointer",
        CL_ERR_NO_XMLDESCRIPTION_FOUND => "no XML description found",
        CL_ERR_PARAM_NOT_SUPPORTED => "parameter not supported",
        CL_ERR_PARAM_DATA_SIZE => "parameter data size",
        CL_ERR_PARAM_DATA_VALUE => "parameter data value",
        _ => "unknown error",
    }
}

/// Close a session.
#[no_mangle]
pub extern "C" fn clpDisconnect(Cookie: CLUINT32) -> CLINT32 {
    ffi_boundary("clpDisconnect", || error::status(engine().disconnect(Cookie)))
}

/// # Safety
/// Either pointer may be null; non-null pointers must be writable.
#[no_mangle]
pub unsafe extern "C" fn clpGetCLProtocolVersion(
    pVersionMajor: *mut CLUINT32,
    pVersionMinor: *mut CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetCLProtocolVersion", || {
        // SAFETY: Null-checked; validity per the caller's contract.
        unsafe {
            if !pVersionMajor.is_null() {
                *pVersionMajor = CLP_VERSION_MAJOR;
            }
            if !pVersionMinor.is_null() {
                *pVersionMinor = CLP_VERSION_MINOR;
            }
        }
        CL_ERR_NO_ERR
    })
}

const CALLBACK_SIZE: usize = std::mem::size_of::<usize>();

/// Read a library or session parameter.
///
/// # Safety
/// `pBuffer` must be writable for `BufferSize` bytes. `pSerial` must point
/// to a live `ISerial` when reading `CLP_DEVICE_SUPPORTED_BAUDRATES`.
#[no_mangle]
pub unsafe extern "C" fn clpGetParam(
    pSerial: *mut ISerial,
    param: CLP_PARAMS,
    Cookie: CLUINT32,
    pBuffer: *mut CLINT8,
    BufferSize: CLINT64,
    _TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetParam", || {
        if pBuffer.is_null() || BufferSize < 4 {
            return CL_ERR_PARAM_DATA_SIZE;
        }
        // SAFETY: Non-null and at least 4 bytes per the check above.
        let buf = unsafe { std::slice::from_raw_parts_mut(pBuffer.cast::<u8>(), BufferSize as usize) };

        match param {
            CLP_LOG_LEVEL => put_u32(buf, logging::log_level()),
            CLP_LOG_CALLBACK => {
                if buf.len() < CALLBACK_SIZE {
                    return CL_ERR_PARAM_DATA_SIZE;
                }
                let address = logging::logger().map_or(0usize, |f| f as usize);
                buf[..CALLBACK_SIZE].copy_from_slice(&address.to_ne_bytes());
            }
            CLP_DEVICE_BAUDERATE => {
                let rate = try_engine!(engine().baud_rate(Cookie));
                put_u32(buf, rate.mask());
            }
            CLP_DEVICE_SUPPORTED_BAUDRATES => {
                try_arg!(require_session(Cookie));
                // SAFETY: Forwarded from the caller.
                let mut serial = try_arg!(unsafe { serial_arg(pSerial) });
                let rates = try_engine!(engine().supported_baud_rates(Cookie, &mut serial));
                put_u32(buf, rates.mask());
            }
            _ => return CL_ERR_PARAM_NOT_SUPPORTED,
        }
        CL_ERR_NO_ERR
    })
}

/// Change a library or session parameter.
///
/// # Safety
/// `pBuffer` must be readable for `BufferSize` bytes. `pSerial` must point
/// to a live `ISerial` when setting `CLP_DEVICE_BAUDERATE`. A callback
/// written through `CLP_LOG_CALLBACK` must be null or a valid logger.
#[no_mangle]
pub unsafe extern "C" fn clpSetParam(
    pSerial: *mut ISerial,
    param: CLP_PARAMS,
    Cookie: CLUINT32,
    pBuffer: *const CLINT8,
    BufferSize: CLINT64,
    _TimeOut: CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpSetParam", || {
        if pBuffer.is_null() || BufferSize < 4 {
            return CL_ERR_PARAM_DATA_SIZE;
        }
        // SAFETY: Non-null and at least 4 bytes per the check above.
        let buf = unsafe { std::slice::from_raw_parts(pBuffer.cast::<u8>(), BufferSize as usize) };

        match param {
            CLP_LOG_LEVEL => logging::set_log_level(get_u32(buf)),
            CLP_LOG_CALLBACK => {
                if buf.len() < CALLBACK_SIZE {
                    return CL_ERR_PARAM_DATA_SIZE;
                }
                let mut word = [0u8; CALLBACK_SIZE];
                word.copy_from_slice(&buf[..CALLBACK_SIZE]);
                let address = usize::from_ne_bytes(word);
                let logger: clp_logger_t = if address == 0 {
                    None
                } else {
                    // SAFETY: The host passes a logger function pointer (or
                    // null) through this parameter, per the caller's contract.
                    Some(unsafe { std::mem::transmute::<usize, LoggerFn>(address) })
                };
                logging::set_logger(logger);
                logging::install();
            }
            CLP_DEVICE_BAUDERATE => {
                try_arg!(require_session(Cookie));
                // SAFETY: Forwarded from the caller.
                let mut serial = try_arg!(unsafe { serial_arg(pSerial) });
                return error::status(engine().set_baud_rate(Cookie, &mut serial, get_u32(buf)));
            }
            CLP_DEVICE_SUPPORTED_BAUDRATES => return CL_ERR_PARAM_NOT_SUPPORTED,
            _ => return CL_ERR_PARAM_NOT_SUPPORTED,
        }
        CL_ERR_NO_ERR
    })
}

/// Whether `param` is handled by `clpGetParam`/`clpSetParam`.
#[no_mangle]
pub extern "C" fn clpIsParamSupported(param: CLP_PARAMS) -> CLINT32 {
    match param {
        CLP_LOG_LEVEL | CLP_LOG_CALLBACK | CLP_DEVICE_BAUDERATE | CLP_DEVICE_SUPPORTED_BAUDRATES => {
            CL_ERR_NO_ERR
        }
        _ => CL_ERR_PARAM_NOT_SUPPORTED,
    }
}

/// The device raises no events; always times out with no data.
///
/// # Safety
/// `pBufferSize` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn clpGetEventData(
    Cookie: CLUINT32,
    _pBuffer: *mut CLINT8,
    pBufferSize: *mut CLUINT32,
) -> CLINT32 {
    ffi_boundary("clpGetEventData", || {
        try_arg!(require_session(Cookie));
        if !pBufferSize.is_null() {
            // SAFETY: Null-checked; validity per the caller's contract.
            unsafe { *pBufferSize = 0 };
        }
        CL_ERR_TIMEOUT
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::ffi::{c_void, CStr};
    use std::os::raw::c_char;
    use std::sync::{Mutex, PoisonError};

    use super::*;
    use crate::plugin::test_lock as lock;

    #[repr(C)]
    struct FakeSerial {
        base: ISerial,
        reads: VecDeque<Vec<u8>>,
        last_write: Vec<u8>,
        fail_writes: bool,
        supported: CLUINT32,
        baud_calls: Vec<CLUINT32>,
    }

    static FAKE_VTBL: ISerialVtbl = ISerialVtbl {
        cl_serial_read: fake_read,
        cl_serial_write: fake_write,
        cl_get_supported_baud_rates: fake_supported,
        cl_set_baud_rate: fake_set_baud,
    };

    unsafe fn fake<'a>(this: *mut ISerial) -> &'a mut FakeSerial {
        unsafe { &mut *this.cast::<FakeSerial>() }
    }

    unsafe extern "C" fn fake_read(
        this: *mut ISerial,
        buffer: *mut CLINT8,
        size: *mut CLUINT32,
        _timeout: CLUINT32,
    ) -> CLINT32 {
        let fake = unsafe { fake(this) };
        let Some(data) = fake.reads.pop_front() else {
            return CL_ERR_TIMEOUT;
        };
        let n = data.len().min(unsafe { *size } as usize);
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), buffer.cast::<u8>(), n);
            *size = n as CLUINT32;
        }
        CL_ERR_NO_ERR
    }

    unsafe extern "C" fn fake_write(
        this: *mut ISerial,
        buffer: *mut CLINT8,
        size: *mut CLUINT32,
        _timeout: CLUINT32,
    ) -> CLINT32 {
        let fake = unsafe { fake(this) };
        if fake.fail_writes {
            return CL_ERR_TIMEOUT;
        }
        let data = unsafe { std::slice::from_raw_parts(buffer.cast::<u8>(), *size as usize) };
        fake.last_write = data.to_vec();
        CL_ERR_NO_ERR
    }

    unsafe extern "C" fn fake_supported(this: *mut ISerial, rates: *mut CLUINT32) -> CLINT32 {
        let fake = unsafe { fake(this) };
        unsafe { *rates = fake.supported };
        CL_ERR_NO_ERR
    }

    unsafe extern "C" fn fake_set_baud(this: *mut ISerial, rate: CLUINT32) -> CLINT32 {
        let fake = unsafe { fake(this) };
        fake.baud_calls.push(rate);
        if fake.supported & rate == 0 {
            return CL_ERR_BAUD_RATE_NOT_SUPPORTED;
        }
        CL_ERR_NO_ERR
    }

    impl FakeSerial {
        fn new() -> Box<Self> {
            Box::new(Self {
                base: ISerial { vtbl: &FAKE_VTBL },
                reads: VecDeque::new(),
                last_write: Vec::new(),
                fail_writes: false,
                supported: 0x01 | 0x10,
                baud_calls: Vec::new(),
            })
        }

        fn ptr(&mut self) -> *mut ISerial {
            (self as *mut FakeSerial).cast()
        }

        fn reply(&mut self, text: &str) {
            self.reads.push_back(format!("{text}\r\nfli-cli>").into_bytes());
        }

        fn last_write(&self) -> String {
            String::from_utf8_lossy(&self.last_write).into_owned()
        }
    }

    fn probe(serial: &mut FakeSerial, template: &str) -> (CLINT32, CLUINT32, String) {
        let template = format!("{template}\0");
        let mut device_id = [0 as c_char; 256];
        let mut size = device_id.len() as CLUINT32;
        let mut cookie = 0;
        let rc = unsafe {
            clpProbeDevice(
                serial.ptr(),
                template.as_ptr().cast(),
                device_id.as_mut_ptr(),
                &mut size,
                &mut cookie,
                100,
            )
        };
        let id = unsafe { CStr::from_ptr(device_id.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        (rc, cookie, id)
    }

    fn read(serial: &mut FakeSerial, cookie: CLUINT32, address: i64, buf: &mut [u8]) -> CLINT32 {
        unsafe {
            clpReadRegister(
                serial.ptr(),
                cookie,
                address,
                buf.as_mut_ptr().cast(),
                buf.len() as i64,
                5,
            )
        }
    }

    fn write(serial: &mut FakeSerial, cookie: CLUINT32, address: i64, data: &[u8]) -> CLINT32 {
        unsafe {
            clpWriteRegister(serial.ptr(), cookie, address, data.as_ptr().cast(), data.len() as i64, 5)
        }
    }

    fn error_text() -> String {
        let mut buf = [0 as c_char; 512];
        let mut size = buf.len() as CLUINT32;
        let rc = unsafe { clpGetErrorText(CL_ERR_GET_LAST_ERROR, buf.as_mut_ptr(), &mut size, 0) };
        assert_eq!(rc, CL_ERR_NO_ERR);
        unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    fn padded(text: &str, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        buf[..text.len()].copy_from_slice(text.as_bytes());
        buf
    }

    #[test]
    fn full_session_flow() {
        let _guard = lock();
        assert_eq!(clpInitLib(None, CLP_LOG_NOTSET), CL_ERR_NO_ERR);

        let mut serial = FakeSerial::new();
        let mut serial2 = FakeSerial::new();

        let (rc, cookie, device_id) = probe(&mut serial, "FirstLightImaging#CRED2#CRED2");
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_ne!(cookie, 0);
        assert_eq!(serial.baud_calls.last(), Some(&0x01));
        assert!(device_id.contains("FirstLightImaging#CRED2#CRED2#Version_1_0_0#SN00000000"));

        let (rc, again, same_id) = probe(&mut serial, &device_id);
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_ne!(again, cookie);
        assert_eq!(same_id, device_id);
        assert_eq!(clpDisconnect(again), CL_ERR_NO_ERR);

        let (rc, cookie2, _) = probe(&mut serial2, "FirstLightImaging#CRED2#CRED2");
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_ne!(cookie2, cookie);

        let rate = 0x10u32.to_le_bytes();
        let rc = unsafe {
            clpSetParam(serial.ptr(), CLP_DEVICE_BAUDERATE, cookie, rate.as_ptr().cast(), 4, 100)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(serial.baud_calls.last(), Some(&0x10));

        let mut param = [0u8; 4];
        let rc = unsafe {
            clpGetParam(serial.ptr(), CLP_DEVICE_BAUDERATE, cookie, param.as_mut_ptr().cast(), 4, 100)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(u32::from_le_bytes(param), 0x10);
        let rc = unsafe {
            clpGetParam(serial2.ptr(), CLP_DEVICE_BAUDERATE, cookie2, param.as_mut_ptr().cast(), 4, 100)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(u32::from_le_bytes(param), 0x01);

        let mut buf = [0u8; 8];
        serial.reply("123.0");
        assert_eq!(read(&mut serial, cookie, 0x1000, &mut buf), CL_ERR_NO_ERR);
        assert_eq!(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]), 123.0);
        assert_eq!(serial.last_write(), "fps raw\n");

        assert_eq!(write(&mut serial, cookie, 0x1000, &100.0f32.to_le_bytes()), CL_ERR_NO_ERR);
        assert!(serial.last_write().starts_with("set fps"));

        serial.reply("on");
        assert_eq!(read(&mut serial, cookie, 0x1220, &mut buf), CL_ERR_NO_ERR);
        assert_eq!(buf[..4], 1i32.to_le_bytes());
        assert_eq!(write(&mut serial, cookie, 0x1220, &0i32.to_le_bytes()), CL_ERR_NO_ERR);
        assert_eq!(serial.last_write(), "set bias off\n");

        assert_eq!(write(&mut serial, cookie, 0x3160, &1i32.to_le_bytes()), CL_ERR_NO_ERR);
        assert_eq!(serial.last_write(), "set telnet enable\n");

        assert_eq!(write(&mut serial, cookie, 0x3100, &padded("192.168.0.10", 64)), CL_ERR_NO_ERR);
        assert_eq!(serial.last_write(), "set ip address 192.168.0.10\n");
        assert_eq!(write(&mut serial, cookie, 0x3170, &padded("secret", 64)), CL_ERR_NO_ERR);
        assert_eq!(serial.last_write(), "set password secret\n");

        assert_eq!(write(&mut serial, cookie, 0x2000, &2i32.to_le_bytes()), CL_ERR_NO_ERR);
        serial.reply("42.5");
        assert_eq!(read(&mut serial, cookie, 0x2004, &mut buf), CL_ERR_NO_ERR);
        assert_eq!(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]), 42.5);
        assert_eq!(serial.last_write(), "temperatures powerboard raw\n");

        assert_eq!(write(&mut serial, cookie, 0x2100, &3i32.to_le_bytes()), CL_ERR_NO_ERR);
        assert_eq!(read(&mut serial, cookie, 0x2100, &mut buf), CL_ERR_NO_ERR);
        assert_eq!(buf[..4], 3i32.to_le_bytes());
        assert_eq!(read(&mut serial2, cookie2, 0x2100, &mut buf), CL_ERR_NO_ERR);
        assert_eq!(buf[..4], 0i32.to_le_bytes());

        let mut failing = FakeSerial::new();
        failing.fail_writes = true;
        assert_eq!(write(&mut failing, cookie, 0x1000, &[0; 4]), CL_ERR_TIMEOUT);

        let mut garbage = FakeSerial::new();
        garbage.reply("not-a-number");
        assert_eq!(read(&mut garbage, cookie, 0x1000, &mut buf), CL_ERR_INVALID_REFERENCE);
        assert!(error_text().contains("fps raw"));

        let mut licenses = [0u8; 256];
        serial.reply("licenseA.lic\r\nlicenseB.lic");
        assert_eq!(read(&mut serial, cookie, 0x3180, &mut licenses), CL_ERR_NO_ERR);
        assert!(licenses.starts_with(b"licenseA.lic"));

        assert_eq!(clpDisconnect(cookie2), CL_ERR_NO_ERR);
        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);
        assert_eq!(clpDisconnect(cookie), CL_ERR_INVALID_COOKIE);
        assert!(error_text().contains(&cookie.to_string()));
    }

    #[test]
    fn description_negotiation() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (_, cookie, device_id) = probe(&mut serial, "FirstLightImaging");

        let mut ids = [0 as c_char; 512];
        let mut size = ids.len() as CLUINT32;
        let rc = unsafe { clpGetXMLIDs(serial.ptr(), cookie, ids.as_mut_ptr(), &mut size, 100) };
        assert_eq!(rc, CL_ERR_NO_ERR);
        let xml_id = unsafe { CStr::from_ptr(ids.as_ptr()) }.to_string_lossy().into_owned();
        assert!(xml_id.starts_with("SchemaVersion.1.1@"));
        assert!(xml_id.contains(&format!("@{device_id}@")));

        let unknown = b"SchemaVersion.1.1@Unknown@XMLVersion.1.0.0\0";
        let mut size = 0;
        let rc = unsafe {
            clpGetXMLDescription(serial.ptr(), cookie, unknown.as_ptr().cast(), std::ptr::null_mut(), &mut size, 100)
        };
        assert_eq!(rc, CL_ERR_NO_XMLDESCRIPTION_FOUND);

        let id = format!("{xml_id}\0");
        let rc = unsafe {
            clpGetXMLDescription(serial.ptr(), cookie, id.as_ptr().cast(), std::ptr::null_mut(), &mut size, 100)
        };
        assert_eq!(rc, CL_ERR_BUFFER_TOO_SMALL);
        assert!(size > 0);

        let mut xml = vec![0 as c_char; size as usize];
        let rc = unsafe {
            clpGetXMLDescription(serial.ptr(), cookie, id.as_ptr().cast(), xml.as_mut_ptr(), &mut size, 100)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(size as usize, xml.len());
        assert_eq!(xml.last(), Some(&0));

        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);
    }

    #[test]
    fn probe_size_query_opens_nothing() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let template = b"FirstLightImaging\0";
        let mut size = 0;
        let mut cookie = 0;
        let rc = unsafe {
            clpProbeDevice(
                serial.ptr(),
                template.as_ptr().cast(),
                std::ptr::null_mut(),
                &mut size,
                &mut cookie,
                100,
            )
        };
        assert_eq!(rc, CL_ERR_BUFFER_TOO_SMALL);
        assert!(size > 0);
        assert_eq!(cookie, 0);
        assert!(serial.baud_calls.is_empty());
    }

    #[test]
    fn probe_rejects_other_devices() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (rc, cookie, _) = probe(&mut serial, "Acme#Camera");
        assert_eq!(rc, CL_ERR_INVALID_DEVICEID);
        assert_eq!(cookie, 0);

        let mut slow = FakeSerial::new();
        slow.supported = 0x10;
        let (rc, _, _) = probe(&mut slow, "FirstLightImaging");
        assert_eq!(rc, CL_ERR_BAUD_RATE_NOT_SUPPORTED);
    }

    #[test]
    fn null_arguments_are_invalid_ptr() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (_, cookie, _) = probe(&mut serial, "FirstLightImaging");

        let rc = unsafe { clpReadRegister(serial.ptr(), cookie, 0x1000, std::ptr::null_mut(), 4, 5) };
        assert_eq!(rc, CL_ERR_INVALID_PTR);
        let mut buf = [0u8; 4];
        let rc = unsafe {
            clpReadRegister(std::ptr::null_mut(), cookie, 0x1000, buf.as_mut_ptr().cast(), 4, 5)
        };
        assert_eq!(rc, CL_ERR_INVALID_PTR);
        let rc = unsafe { clpGetShortDeviceIDTemplates(std::ptr::null_mut(), std::ptr::null_mut()) };
        assert_eq!(rc, CL_ERR_INVALID_PTR);
        let rc = unsafe { clpGetErrorText(0, std::ptr::null_mut(), std::ptr::null_mut(), 0) };
        assert_eq!(rc, CL_ERR_INVALID_PTR);

        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);
    }

    #[test]
    fn short_templates_negotiate() {
        let mut size = 0;
        let rc = unsafe { clpGetShortDeviceIDTemplates(std::ptr::null_mut(), &mut size) };
        assert_eq!(rc, CL_ERR_BUFFER_TOO_SMALL);
        let mut buf = vec![0 as c_char; size as usize];
        let rc = unsafe { clpGetShortDeviceIDTemplates(buf.as_mut_ptr(), &mut size) };
        assert_eq!(rc, CL_ERR_NO_ERR);
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(text.to_str().unwrap(), "FirstLightImaging#CRED2");
    }

    #[test]
    fn unknown_cookie_is_rejected() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let mut buf = [0u8; 4];
        assert_eq!(read(&mut serial, 0, 0x1000, &mut buf), CL_ERR_INVALID_COOKIE);
        assert_eq!(write(&mut serial, 999_999, 0x1000, &buf), CL_ERR_INVALID_COOKIE);
        assert_eq!(clpContinueWriteRegister(serial.ptr(), 0, 1, 5), CL_ERR_INVALID_COOKIE);
        let mut size = 7;
        assert_eq!(
            unsafe { clpGetEventData(0, std::ptr::null_mut(), &mut size) },
            CL_ERR_INVALID_COOKIE
        );
        assert!(serial.last_write.is_empty());
    }

    #[test]
    fn no_pending_writes_or_events() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (_, cookie, _) = probe(&mut serial, "FirstLightImaging");
        assert_eq!(clpContinueWriteRegister(serial.ptr(), cookie, 1, 5), CL_ERR_INVALID_REFERENCE);
        let mut size = 7;
        assert_eq!(
            unsafe { clpGetEventData(cookie, std::ptr::null_mut(), &mut size) },
            CL_ERR_TIMEOUT
        );
        assert_eq!(size, 0);
        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);
    }

    #[test]
    fn supported_rates_parameter() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (_, cookie, _) = probe(&mut serial, "FirstLightImaging");
        serial.supported = 0x01 | 0x08;

        let mut param = [0u8; 4];
        let rc = unsafe {
            clpGetParam(serial.ptr(), CLP_DEVICE_SUPPORTED_BAUDRATES, cookie, param.as_mut_ptr().cast(), 4, 100)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(u32::from_le_bytes(param), 0x09);

        let rate = 0x10u32.to_le_bytes();
        let rc = unsafe {
            clpSetParam(serial.ptr(), CLP_DEVICE_BAUDERATE, cookie, rate.as_ptr().cast(), 4, 100)
        };
        assert_eq!(rc, CL_ERR_BAUD_RATE_NOT_SUPPORTED);
        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);
    }

    #[test]
    fn log_parameters_round_trip() {
        let _guard = lock();
        let level = CLP_LOG_WARN.to_le_bytes();
        let rc = unsafe {
            clpSetParam(std::ptr::null_mut(), CLP_LOG_LEVEL, 0, level.as_ptr().cast(), 4, 0)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        let mut out = [0u8; 4];
        let rc = unsafe {
            clpGetParam(std::ptr::null_mut(), CLP_LOG_LEVEL, 0, out.as_mut_ptr().cast(), 4, 0)
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(u32::from_le_bytes(out), CLP_LOG_WARN);

        let rc = unsafe {
            clpGetParam(std::ptr::null_mut(), CLP_LOG_CALLBACK, 0, out.as_mut_ptr().cast(), 4, 0)
        };
        if CALLBACK_SIZE > 4 {
            assert_eq!(rc, CL_ERR_PARAM_DATA_SIZE);
        }
        let rc = unsafe {
            clpGetParam(std::ptr::null_mut(), CLP_LOG_LEVEL, 0, out.as_mut_ptr().cast(), 3, 0)
        };
        assert_eq!(rc, CL_ERR_PARAM_DATA_SIZE);
        let rc = unsafe { clpGetParam(std::ptr::null_mut(), 99, 0, out.as_mut_ptr().cast(), 4, 0) };
        assert_eq!(rc, CL_ERR_PARAM_NOT_SUPPORTED);

        logging::set_log_level(CLP_LOG_NOTSET);
    }

    static LOGGED: Mutex<Vec<(CLP_LOG_LEVEL_VALUE, String)>> = Mutex::new(Vec::new());

    unsafe extern "C" fn capture(level: CLP_LOG_LEVEL_VALUE, fmt: *const c_char, _args: *mut c_void) {
        let text = unsafe { CStr::from_ptr(fmt) }.to_string_lossy().into_owned();
        LOGGED
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, text));
    }

    #[test]
    fn host_logger_receives_gated_events() {
        let _guard = lock();
        assert_eq!(clpInitLib(Some(capture), CLP_LOG_INFO), CL_ERR_NO_ERR);

        let mut serial = FakeSerial::new();
        let (_, cookie, _) = probe(&mut serial, "FirstLightImaging");
        assert_eq!(clpDisconnect(cookie), CL_ERR_NO_ERR);

        let mut address = [0u8; CALLBACK_SIZE];
        let rc = unsafe {
            clpGetParam(
                std::ptr::null_mut(),
                CLP_LOG_CALLBACK,
                0,
                address.as_mut_ptr().cast(),
                CALLBACK_SIZE as i64,
                0,
            )
        };
        assert_eq!(rc, CL_ERR_NO_ERR);
        assert_eq!(usize::from_ne_bytes(address), capture as usize);

        logging::set_logger(None);
        logging::set_log_level(CLP_LOG_NOTSET);

        let logged = LOGGED.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(logged.iter().all(|(level, _)| *level <= CLP_LOG_INFO));
        assert!(logged.iter().any(|(_, text)| text.contains("session opened")));
    }

    #[test]
    fn version_is_one_one() {
        let (mut major, mut minor) = (0, 0);
        assert_eq!(unsafe { clpGetCLProtocolVersion(&mut major, &mut minor) }, CL_ERR_NO_ERR);
        assert_eq!((major, minor), (1, 1));
        assert_eq!(clpIsParamSupported(CLP_DEVICE_BAUDERATE), CL_ERR_NO_ERR);
        assert_eq!(clpIsParamSupported(42), CL_ERR_PARAM_NOT_SUPPORTED);
    }

    #[test]
    fn close_lib_drops_sessions() {
        let _guard = lock();
        let mut serial = FakeSerial::new();
        let (_, cookie, _) = probe(&mut serial, "FirstLightImaging");
        assert_eq!(clpCloseLib(), CL_ERR_NO_ERR);
        assert_eq!(clpDisconnect(cookie), CL_ERR_INVALID_COOKIE);
    }
}
