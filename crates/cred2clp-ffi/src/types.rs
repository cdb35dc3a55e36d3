use std::ffi::c_void;
use std::os::raw::c_char;

pub type CLINT8 = c_char;
pub type CLINT32 = i32;
pub type CLUINT32 = u32;
pub type CLINT64 = i64;
pub type BOOL8 = u8;

pub const CL_ERR_NO_ERR: CLINT32 = 0;
pub const CL_ERR_BUFFER_TOO_SMALL: CLINT32 = -10001;
pub const CL_ERR_MANU_DOES_NOT_EXIST: CLINT32 = -10002;
pub const CL_ERR_PORT_IN_USE: CLINT32 = -10003;
pub const CL_ERR_TIMEOUT: CLINT32 = -10004;
pub const CL_ERR_INVALID_INDEX: CLINT32 = -10005;
pub const CL_ERR_INVALID_REFERENCE: CLINT32 = -10006;
pub const CL_ERR_ERROR_NOT_FOUND: CLINT32 = -10007;
pub const CL_ERR_BAUD_RATE_NOT_SUPPORTED: CLINT32 = -10008;
pub const CL_ERR_OUT_OF_MEMORY: CLINT32 = -10009;

pub const CL_ERR_PENDING_WRITE: CLINT32 = -10030;
pub const CL_ERR_INVALID_DEVICEID: CLINT32 = -10031;
pub const CL_ERR_INVALID_COOKIE: CLINT32 = -10032;
pub const CL_ERR_INVALID_PTR: CLINT32 = -10033;
pub const CL_ERR_NO_XMLDESCRIPTION_FOUND: CLINT32 = -10034;
pub const CL_ERR_GET_LAST_ERROR: CLINT32 = -10035;
pub const CL_ERR_PARAM_NOT_SUPPORTED: CLINT32 = -10036;
pub const CL_ERR_PARAM_DATA_SIZE: CLINT32 = -10037;
pub const CL_ERR_PARAM_DATA_VALUE: CLINT32 = -10038;

/// `CLP_PARAMS` values understood by `clpGetParam`/`clpSetParam`.
pub type CLP_PARAMS = CLUINT32;
pub const CLP_LOG_LEVEL: CLP_PARAMS = 1;
pub const CLP_LOG_CALLBACK: CLP_PARAMS = 2;
pub const CLP_DEVICE_BAUDERATE: CLP_PARAMS = 3;
pub const CLP_DEVICE_SUPPORTED_BAUDRATES: CLP_PARAMS = 4;

/// Host log severities. Lower is more severe.
pub type CLP_LOG_LEVEL_VALUE = CLUINT32;
pub const CLP_LOG_FATAL: CLP_LOG_LEVEL_VALUE = 0;
pub const CLP_LOG_ALERT: CLP_LOG_LEVEL_VALUE = 100;
pub const CLP_LOG_CRIT: CLP_LOG_LEVEL_VALUE = 200;
pub const CLP_LOG_ERROR: CLP_LOG_LEVEL_VALUE = 300;
pub const CLP_LOG_WARN: CLP_LOG_LEVEL_VALUE = 400;
pub const CLP_LOG_NOTICE: CLP_LOG_LEVEL_VALUE = 500;
pub const CLP_LOG_INFO: CLP_LOG_LEVEL_VALUE = 600;
pub const CLP_LOG_DEBUG: CLP_LOG_LEVEL_VALUE = 700;
pub const CLP_LOG_NOTSET: CLP_LOG_LEVEL_VALUE = 800;

/// Host logging sink: `printf`-style format plus a `va_list`.
pub type LoggerFn =
    unsafe extern "C" fn(level: CLP_LOG_LEVEL_VALUE, fmt: *const c_char, args: *mut c_void);
pub type clp_logger_t = Option<LoggerFn>;

/// The frame grabber's serial object, as laid out by a C++ compiler: a
/// pointer to a table of virtual methods.
#[repr(C)]
pub struct ISerial {
    pub vtbl: *const ISerialVtbl,
}

/// Virtual methods of `ISerial`, in declaration order.
#[repr(C)]
pub struct ISerialVtbl {
    pub cl_serial_read: unsafe extern "C" fn(
        this: *mut ISerial,
        buffer: *mut CLINT8,
        buffer_size: *mut CLUINT32,
        timeout: CLUINT32,
    ) -> CLINT32,
    pub cl_serial_write: unsafe extern "C" fn(
        this: *mut ISerial,
        buffer: *mut CLINT8,
        buffer_size: *mut CLUINT32,
        timeout: CLUINT32,
    ) -> CLINT32,
    pub cl_get_supported_baud_rates:
        unsafe extern "C" fn(this: *mut ISerial, baud_rates: *mut CLUINT32) -> CLINT32,
    pub cl_set_baud_rate: unsafe extern "C" fn(this: *mut ISerial, baud_rate: CLUINT32) -> CLINT32,
}
