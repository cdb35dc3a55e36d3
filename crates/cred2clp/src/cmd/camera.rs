use std::time::Duration;

use cred2clp_session::{Engine, RegisterDescriptor, RegisterValue};
use cred2clp_transport::{BaudRate, BaudRateSet, SerialPortTransport, SerialTransport};
use tracing::{debug, warn};

use crate::cmd::{parse_duration, PortArgs};
use crate::exit::{engine_error, transport_error, CliError, CliResult, USAGE};
use crate::output::ValueOutput;

/// A probed session on one transport. Disconnects on drop.
pub struct Camera<T: SerialTransport> {
    engine: Engine,
    transport: T,
    handle: u32,
    device_id: String,
    timeout: Duration,
}

impl Camera<SerialPortTransport> {
    /// Open the port named in `args`, probe it and switch to the requested
    /// speed.
    pub fn open(args: &PortArgs) -> CliResult<Self> {
        let rate = BaudRate::from_bits_per_second(args.baud)
            .ok_or_else(|| CliError::new(USAGE, format!("unsupported baud rate: {}", args.baud)))?;
        let timeout = parse_duration(&args.timeout)?;
        let transport = SerialPortTransport::open(&args.port)
            .map_err(|err| transport_error("open failed", err))?;
        Camera::attach(Engine::from_env(), transport, timeout, rate)
    }
}

impl<T: SerialTransport> Camera<T> {
    pub fn attach(engine: Engine, mut transport: T, timeout: Duration, rate: BaudRate) -> CliResult<Self> {
        let templates = engine.short_device_id_templates();
        let probed = engine
            .probe(&mut transport, &templates)
            .map_err(|err| engine_error("probe failed", err))?;
        let handle = probed.handle.get();

        let camera = Self {
            engine,
            transport,
            handle,
            device_id: probed.device_id,
            timeout,
        };
        camera.switch_rate(rate)
    }

    fn switch_rate(mut self, rate: BaudRate) -> CliResult<Self> {
        if rate != self.engine.config().initial_baud_rate {
            self.engine
                .set_baud_rate(self.handle, &mut self.transport, rate.mask())
                .map_err(|err| engine_error("baud rate change failed", err))?;
        }
        Ok(self)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Ask the transport which rates it can switch to.
    pub fn supported_baud_rates(&mut self) -> CliResult<BaudRateSet> {
        self.engine
            .supported_baud_rates(self.handle, &mut self.transport)
            .map_err(|err| engine_error("baud rate query failed", err))
    }

    pub fn read(&mut self, reg: &RegisterDescriptor) -> CliResult<RegisterValue> {
        let mut buf = vec![0u8; reg.width()];
        self.engine
            .read_register(self.handle, reg.address, &mut self.transport, self.timeout, &mut buf)
            .map_err(|err| engine_error(&format!("read {} failed", reg.name), err))?;
        RegisterValue::decode(reg, &buf)
            .map_err(|err| engine_error(&format!("decode {} failed", reg.name), err))
    }

    pub fn read_all(&mut self, regs: &[&'static RegisterDescriptor]) -> CliResult<Vec<ValueOutput>> {
        regs.iter()
            .map(|reg| Ok(ValueOutput::new(reg, self.read(reg)?)))
            .collect()
    }

    pub fn write(&mut self, reg: &RegisterDescriptor, value: &RegisterValue) -> CliResult<()> {
        let payload = value
            .encode(reg)
            .map_err(|err| engine_error(&format!("encode {} failed", reg.name), err))?;
        self.engine
            .write_register(self.handle, reg.address, &payload, &mut self.transport, self.timeout)
            .map_err(|err| engine_error(&format!("write {} failed", reg.name), err))?;
        debug!(register = reg.name, %value, "register written");
        Ok(())
    }
}

impl<T: SerialTransport> Drop for Camera<T> {
    fn drop(&mut self) {
        if let Err(err) = self.engine.disconnect(self.handle) {
            warn!(handle = self.handle, %err, "disconnect failed");
        }
    }
}
