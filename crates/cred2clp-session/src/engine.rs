//! The adapter context: sessions, register access, parameters and the
//! register description, behind one shareable value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cred2clp_description::{
    validate_xml_id, xml_id_for, DescriptionConfig, DescriptionStore, Document,
};
use cred2clp_frame::ChannelConfig;
use cred2clp_transport::{BaudRate, BaudRateSet, SerialTransport};
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, WriteEffect};
use crate::error::{EngineError, Result};
use crate::identity::DeviceIdentity;
use crate::session::{Session, SessionHandle};
use crate::table::SessionTable;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity reported for every probed device.
    pub identity: DeviceIdentity,
    pub channel: ChannelConfig,
    pub description: DescriptionConfig,
    /// Rate the transport is switched to by a probe.
    pub initial_baud_rate: BaudRate,
}

impl EngineConfig {
    /// Default configuration with the description source taken from the
    /// environment.
    pub fn from_env() -> Self {
        Self {
            description: DescriptionConfig::from_env(),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity::default(),
            channel: ChannelConfig::default(),
            description: DescriptionConfig::default(),
            initial_baud_rate: BaudRate::DEFAULT,
        }
    }
}

/// Outcome of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub handle: SessionHandle,
    /// Fully-qualified device ID the host uses from now on.
    pub device_id: String,
}

/// Register translation engine.
///
/// Safe to share between threads. The session table is locked only to look
/// up or update session state, never across device I/O, so calls on
/// different sessions with different transports run in parallel. The caller
/// owns each transport and must not use one transport from two threads at
/// once.
///
/// Every failing call records its error text, readable through
/// [`Engine::last_error`].
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    sessions: Mutex<SessionTable>,
    description: DescriptionStore,
    last_error: Mutex<String>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let description = DescriptionStore::new(config.description.clone());
        Self {
            config,
            sessions: Mutex::new(SessionTable::new()),
            description,
            last_error: Mutex::new(String::new()),
        }
    }

    /// An engine configured from the environment.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Templates the host can probe with.
    pub fn short_device_id_templates(&self) -> String {
        self.config.identity.short_templates()
    }

    /// Open a session if `templates` names this adapter's device.
    ///
    /// Switches the transport to the initial baud rate. No shell command is
    /// sent; the device is not contacted until the first register access.
    pub fn probe<T: SerialTransport + ?Sized>(
        &self,
        transport: &mut T,
        templates: &str,
    ) -> Result<ProbeResult> {
        self.record(self.try_probe(transport, templates))
    }

    fn try_probe<T: SerialTransport + ?Sized>(
        &self,
        transport: &mut T,
        templates: &str,
    ) -> Result<ProbeResult> {
        let identity = &self.config.identity;
        if !identity.matches(templates) {
            return Err(EngineError::IdentityMismatch(templates.to_string()));
        }

        let supported = transport.supported_baud_rates()?;
        let rate = self.config.initial_baud_rate;
        if !supported.contains(rate) {
            return Err(EngineError::UnsupportedCapability(format!(
                "{} port does not support {rate} baud (supported: {supported})",
                transport.transport_name()
            )));
        }
        transport.set_baud_rate(rate)?;

        let device_id = identity.device_id();
        let mut sessions = self.lock_sessions();
        let handle = sessions.allocate()?;
        sessions.insert(Session::new(handle, device_id.clone(), rate, supported));
        info!(
            %handle,
            transport = transport.transport_name(),
            baud = %rate,
            live = sessions.len(),
            "session opened"
        );

        Ok(ProbeResult { handle, device_id })
    }

    /// Destroy a session. A handle is only accepted once.
    pub fn disconnect(&self, handle: u32) -> Result<()> {
        let removed = self.lock_sessions().remove(handle);
        if !removed {
            return self.record(Err(EngineError::InvalidSession(handle)));
        }
        info!(handle, "session closed");
        Ok(())
    }

    /// Read register `address` of session `handle` into `buf`.
    pub fn read_register<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        address: u64,
        transport: &mut T,
        timeout: Duration,
        buf: &mut [u8],
    ) -> Result<()> {
        self.record(self.try_read_register(handle, address, transport, timeout, buf))
    }

    fn try_read_register<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        address: u64,
        transport: &mut T,
        timeout: Duration,
        buf: &mut [u8],
    ) -> Result<()> {
        let selectors = self.lock_sessions().find(handle)?.selectors;
        self.dispatcher(timeout)
            .read(&selectors, address, transport, buf)
    }

    /// Write `payload` to register `address` of session `handle`.
    pub fn write_register<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        address: u64,
        payload: &[u8],
        transport: &mut T,
        timeout: Duration,
    ) -> Result<()> {
        self.record(self.try_write_register(handle, address, payload, transport, timeout))
    }

    fn try_write_register<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        address: u64,
        payload: &[u8],
        transport: &mut T,
        timeout: Duration,
    ) -> Result<()> {
        let selectors = self.lock_sessions().find(handle)?.selectors;
        let effect = self
            .dispatcher(timeout)
            .write(&selectors, address, payload, transport)?;

        if let WriteEffect::StoreSelector(selector, value) = effect {
            // The session may have been disconnected while unlocked.
            self.lock_sessions()
                .find_mut(handle)?
                .selectors
                .set(selector, value);
        }
        Ok(())
    }

    /// Switch session `handle` to the rate given as a single-bit host mask.
    pub fn set_baud_rate<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        transport: &mut T,
        mask: u32,
    ) -> Result<()> {
        self.record(self.try_set_baud_rate(handle, transport, mask))
    }

    fn try_set_baud_rate<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        transport: &mut T,
        mask: u32,
    ) -> Result<()> {
        let rate = BaudRate::from_mask(mask)?;
        self.lock_sessions().find(handle)?;

        let supported = transport.supported_baud_rates()?;
        if !supported.contains(rate) {
            return Err(EngineError::UnsupportedCapability(format!(
                "{rate} baud not in supported set {supported}"
            )));
        }
        transport.set_baud_rate(rate)?;

        let mut sessions = self.lock_sessions();
        let session = sessions.find_mut(handle)?;
        session.active_baud_rate = rate;
        session.supported_baud_rates = supported;
        debug!(handle, baud = %rate, "baud rate changed");
        Ok(())
    }

    /// The session's active rate. No I/O.
    pub fn baud_rate(&self, handle: u32) -> Result<BaudRate> {
        let rate = self
            .lock_sessions()
            .find(handle)
            .map(|session| session.active_baud_rate);
        self.record(rate)
    }

    /// Re-query the transport's supported rates and remember them.
    pub fn supported_baud_rates<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        transport: &mut T,
    ) -> Result<BaudRateSet> {
        self.record(self.try_supported_baud_rates(handle, transport))
    }

    fn try_supported_baud_rates<T: SerialTransport + ?Sized>(
        &self,
        handle: u32,
        transport: &mut T,
    ) -> Result<BaudRateSet> {
        self.lock_sessions().find(handle)?;
        let supported = transport.supported_baud_rates()?;
        self.lock_sessions().find_mut(handle)?.supported_baud_rates = supported;
        Ok(supported)
    }

    /// XML IDs available for session `handle`. There is exactly one.
    pub fn xml_ids(&self, handle: u32) -> Result<String> {
        let id = self
            .lock_sessions()
            .find(handle)
            .map(|session| xml_id_for(&session.device_id));
        self.record(id)
    }

    /// The register description for `xml_id`, loaded on first use.
    pub fn description(&self, handle: u32, xml_id: &str) -> Result<Arc<Document>> {
        self.record(self.try_description(handle, xml_id))
    }

    fn try_description(&self, handle: u32, xml_id: &str) -> Result<Arc<Document>> {
        let device_id = self.lock_sessions().find(handle)?.device_id.clone();
        validate_xml_id(xml_id, &device_id)?;
        Ok(self.description.document()?)
    }

    /// Drop every session and the cached description.
    pub fn close(&self) {
        let mut sessions = self.lock_sessions();
        if !sessions.is_empty() {
            warn!(open = sessions.len(), "closing with open sessions");
        }
        sessions.clear();
        self.description.clear();
        debug!("engine closed");
    }

    /// Text of the most recent failure, empty if nothing failed yet.
    pub fn last_error(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a failure detected outside the engine, such as a null pointer
    /// at the C boundary.
    pub fn record_failure(&self, err: EngineError) {
        let _ = self.record::<()>(Err(err));
    }

    /// A copy of the session's current state.
    pub fn session(&self, handle: u32) -> Result<Session> {
        self.lock_sessions().find(handle).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    fn dispatcher(&self, timeout: Duration) -> Dispatcher {
        Dispatcher::new(timeout, self.config.channel)
    }

    fn lock_sessions(&self) -> MutexGuard<'_, SessionTable> {
        // Table updates are single assignments; a panic cannot leave one
        // half done.
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record<R>(&self, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            debug!(kind = %err.kind(), error = %err, "request failed");
            *self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = err.to_string();
        }
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
