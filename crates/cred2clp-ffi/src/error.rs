use cred2clp_session::{EngineError, ErrorKind};

use crate::plugin::engine;
use crate::types::*;

/// Status code returned to the host for `err`.
pub(crate) fn code_for(err: &EngineError) -> CLINT32 {
    match err {
        EngineError::TransportFailure { code, .. } => code.unwrap_or(CL_ERR_INVALID_REFERENCE),
        other => code_for_kind(other.kind()),
    }
}

fn code_for_kind(kind: ErrorKind) -> CLINT32 {
    match kind {
        ErrorKind::InvalidArgument => CL_ERR_INVALID_PTR,
        ErrorKind::InvalidSession => CL_ERR_INVALID_COOKIE,
        ErrorKind::UnknownRegister | ErrorKind::AccessDenied | ErrorKind::DecodeFailure => {
            CL_ERR_INVALID_REFERENCE
        }
        ErrorKind::BufferTooSmall => CL_ERR_BUFFER_TOO_SMALL,
        ErrorKind::Timeout => CL_ERR_TIMEOUT,
        ErrorKind::TransportFailure => CL_ERR_INVALID_REFERENCE,
        ErrorKind::UnsupportedCapability => CL_ERR_BAUD_RATE_NOT_SUPPORTED,
        ErrorKind::OutOfMemory => CL_ERR_OUT_OF_MEMORY,
        ErrorKind::IdentityMismatch => CL_ERR_INVALID_DEVICEID,
        ErrorKind::UnknownXmlId => CL_ERR_NO_XMLDESCRIPTION_FOUND,
        ErrorKind::DescriptionUnavailable => CL_ERR_INVALID_PTR,
        ErrorKind::SessionTableFull => CL_ERR_OUT_OF_MEMORY,
    }
}

/// Convert an engine result into a host status code.
pub(crate) fn status(result: cred2clp_session::Result<()>) -> CLINT32 {
    match result {
        Ok(()) => CL_ERR_NO_ERR,
        Err(err) => code_for(&err),
    }
}

/// Record an argument error raised before the engine was reached.
pub(crate) fn invalid_ptr(message: impl Into<String>) -> CLINT32 {
    let err = EngineError::InvalidArgument(message.into());
    let code = code_for(&err);
    engine().record_failure(err);
    code
}

/// Record a panic caught at the export boundary.
pub(crate) fn panicked(export: &str) {
    engine().record_failure(EngineError::InvalidArgument(format!("panic in {export}")));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_host_codes() {
        let cases = [
            (EngineError::InvalidArgument("x".into()), CL_ERR_INVALID_PTR),
            (EngineError::InvalidSession(4), CL_ERR_INVALID_COOKIE),
            (EngineError::UnknownRegister(4), CL_ERR_INVALID_REFERENCE),
            (
                EngineError::BufferTooSmall {
                    needed: 4,
                    actual: 1,
                },
                CL_ERR_BUFFER_TOO_SMALL,
            ),
            (EngineError::Timeout("x".into()), CL_ERR_TIMEOUT),
            (
                EngineError::UnsupportedCapability("x".into()),
                CL_ERR_BAUD_RATE_NOT_SUPPORTED,
            ),
            (EngineError::OutOfMemory("x".into()), CL_ERR_OUT_OF_MEMORY),
            (EngineError::IdentityMismatch("x".into()), CL_ERR_INVALID_DEVICEID),
            (
                EngineError::UnknownXmlId {
                    id: "x".into(),
                    reason: "malformed XML ID".into(),
                },
                CL_ERR_NO_XMLDESCRIPTION_FOUND,
            ),
            (EngineError::DescriptionUnavailable("x".into()), CL_ERR_INVALID_PTR),
        ];
        for (err, code) in cases {
            assert_eq!(code_for(&err), code, "{err}");
        }
    }

    #[test]
    fn transport_failures_keep_host_code() {
        let err = EngineError::TransportFailure {
            code: Some(-10003),
            message: "busy".into(),
        };
        assert_eq!(code_for(&err), CL_ERR_PORT_IN_USE);
        let err = EngineError::TransportFailure {
            code: None,
            message: "io".into(),
        };
        assert_eq!(code_for(&err), CL_ERR_INVALID_REFERENCE);
    }
}
