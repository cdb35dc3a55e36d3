use std::fmt;

/// Separator between alternative templates in a probe request.
pub const TEMPLATE_SEPARATOR: char = '\t';

/// Separator between identity fields.
pub const FIELD_SEPARATOR: char = '#';

/// File name the host loads this adapter from.
#[cfg(windows)]
pub const DRIVER_FILE_NAME: &str = "CLProtocol_cred2.dll";
/// File name the host loads this adapter from.
#[cfg(not(windows))]
pub const DRIVER_FILE_NAME: &str = "libCLProtocol_cred2.so";

/// The identity this adapter reports for the device behind a port.
///
/// Rendered as `manufacturer#family#model#version#serial` (short form) or
/// with the driver file name in front (fully-qualified form, the device ID
/// handed back from a probe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub driver_location: String,
    pub manufacturer: String,
    pub family: String,
    pub model: String,
    pub version: String,
    pub serial: String,
}

impl DeviceIdentity {
    /// `manufacturer#family#model#version#serial`.
    pub fn short_id(&self) -> String {
        [
            self.manufacturer.as_str(),
            self.family.as_str(),
            self.model.as_str(),
            self.version.as_str(),
            self.serial.as_str(),
        ]
        .join("#")
    }

    /// `driver#manufacturer#family#model#version#serial`.
    pub fn device_id(&self) -> String {
        format!("{}#{}", self.driver_location, self.short_id())
    }

    /// Templates advertised to the host for device discovery.
    pub fn short_templates(&self) -> String {
        format!("{}#{}", self.manufacturer, self.family)
    }

    /// True if any template in `templates` names this device.
    pub fn matches(&self, templates: &str) -> bool {
        matches(templates, &self.device_id(), &self.short_id())
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            driver_location: DRIVER_FILE_NAME.to_string(),
            manufacturer: "FirstLightImaging".to_string(),
            family: "CRED2".to_string(),
            model: "CRED2".to_string(),
            version: "Version_1_0_0".to_string(),
            serial: "SN00000000".to_string(),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.device_id())
    }
}

/// Decide whether a probe template list names a device.
///
/// `templates` holds tab-separated alternatives. Each alternative is split on
/// `#`; it matches when its fields are a non-empty, in-order, exact prefix of
/// the fields of either identity form. Empty alternatives never match.
pub fn matches(templates: &str, full_identity: &str, short_identity: &str) -> bool {
    let full: Vec<&str> = full_identity.split(FIELD_SEPARATOR).collect();
    let short: Vec<&str> = short_identity.split(FIELD_SEPARATOR).collect();

    templates
        .split(TEMPLATE_SEPARATOR)
        .filter(|alt| !alt.is_empty())
        .any(|alt| {
            let fields: Vec<&str> = alt.split(FIELD_SEPARATOR).collect();
            is_field_prefix(&fields, &full) || is_field_prefix(&fields, &short)
        })
}

fn is_field_prefix(fields: &[&str], identity: &[&str]) -> bool {
    !fields.is_empty() && fields.len() <= identity.len() && identity.starts_with(fields)
}
