use std::time::Duration;

use cred2clp_transport::{BaudRate, BaudRateSet, Result, SerialTransport, TransportError};

use crate::types::{ISerial, CLUINT32, CL_ERR_BAUD_RATE_NOT_SUPPORTED, CL_ERR_NO_ERR, CL_ERR_TIMEOUT};

/// [`SerialTransport`] over the host's `ISerial` object.
///
/// Borrowed for one exported call; never stored.
pub(crate) struct HostSerial {
    this: *mut ISerial,
}

impl HostSerial {
    /// Wrap a non-null `ISerial` pointer.
    ///
    /// # Safety
    /// `this` must point to a live `ISerial` with a valid vtable for as long as
    /// the returned value is used.
    pub(crate) unsafe fn new(this: *mut ISerial) -> Option<Self> {
        if this.is_null() {
            return None;
        }
        // SAFETY: Non-null and valid per the caller's contract.
        if unsafe { (*this).vtbl.is_null() } {
            return None;
        }
        Some(Self { this })
    }

    fn vtbl(&self) -> &crate::types::ISerialVtbl {
        // SAFETY: `new` checked both pointers; the host keeps them alive for
        // the duration of the call.
        unsafe { &*(*self.this).vtbl }
    }
}

fn timeout_ms(timeout: Duration) -> CLUINT32 {
    CLUINT32::try_from(timeout.as_millis()).unwrap_or(CLUINT32::MAX)
}

fn check(code: i32) -> Result<()> {
    match code {
        CL_ERR_NO_ERR => Ok(()),
        CL_ERR_TIMEOUT => Err(TransportError::Timeout),
        code => Err(TransportError::Device { code }),
    }
}

impl SerialTransport for HostSerial {
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        // The host API takes a mutable pointer even for writes.
        let mut owned = data.to_vec();
        let mut size = CLUINT32::try_from(owned.len()).unwrap_or(CLUINT32::MAX);
        // SAFETY: `owned` is valid for `size` bytes and outlives the call.
        let code = unsafe {
            (self.vtbl().cl_serial_write)(
                self.this,
                owned.as_mut_ptr().cast(),
                &mut size,
                timeout_ms(timeout),
            )
        };
        check(code)?;
        Ok(size as usize)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let mut size = CLUINT32::try_from(buf.len()).unwrap_or(CLUINT32::MAX);
        // SAFETY: `buf` is valid for `size` bytes and outlives the call.
        let code = unsafe {
            (self.vtbl().cl_serial_read)(
                self.this,
                buf.as_mut_ptr().cast(),
                &mut size,
                timeout_ms(timeout),
            )
        };
        check(code)?;
        Ok((size as usize).min(buf.len()))
    }

    fn supported_baud_rates(&mut self) -> Result<BaudRateSet> {
        let mut mask: CLUINT32 = 0;
        // SAFETY: `mask` is a valid out-pointer for the call.
        let code = unsafe { (self.vtbl().cl_get_supported_baud_rates)(self.this, &mut mask) };
        check(code)?;
        Ok(BaudRateSet::from_mask(mask))
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        // SAFETY: Plain value argument.
        let code = unsafe { (self.vtbl().cl_set_baud_rate)(self.this, rate.mask()) };
        match code {
            CL_ERR_BAUD_RATE_NOT_SUPPORTED => Err(TransportError::BaudRateNotSupported(rate)),
            code => check(code),
        }
    }

    fn transport_name(&self) -> &'static str {
        "ISerial"
    }
}
