//! XML ID construction and matching.
//!
//! A CLProtocol host identifies a description document by an XML ID of the
//! form `SchemaVersion.<schema>@<device id>@XMLVersion.<version>`.

use std::fmt;

use crate::error::{DescriptionError, Result};

/// GenApi schema version the embedded document is written against.
pub const SCHEMA_VERSION: &str = "1.1";

/// Version of the register description itself.
pub const XML_VERSION: &str = "1.0.0";

const SCHEMA_PREFIX: &str = "SchemaVersion.";
const XML_PREFIX: &str = "XMLVersion.";

/// A parsed XML ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlId {
    pub schema_version: String,
    pub device_id: String,
    pub xml_version: String,
}

impl XmlId {
    /// The XML ID this adapter serves for `device_id`.
    pub fn for_device(device_id: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            device_id: device_id.to_string(),
            xml_version: XML_VERSION.to_string(),
        }
    }

    /// Parse `SchemaVersion.x@device@XMLVersion.y`.
    ///
    /// The device id may itself not contain `@`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split('@');
        let schema = parts.next()?.strip_prefix(SCHEMA_PREFIX)?;
        let device = parts.next()?;
        let xml = parts.next()?.strip_prefix(XML_PREFIX)?;
        if parts.next().is_some() || schema.is_empty() || device.is_empty() || xml.is_empty() {
            return None;
        }
        Some(Self {
            schema_version: schema.to_string(),
            device_id: device.to_string(),
            xml_version: xml.to_string(),
        })
    }
}

impl fmt::Display for XmlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEMA_PREFIX}{}@{}@{XML_PREFIX}{}",
            self.schema_version, self.device_id, self.xml_version
        )
    }
}

/// Render the XML ID served for `device_id`.
pub fn xml_id_for(device_id: &str) -> String {
    XmlId::for_device(device_id).to_string()
}

/// Accept `requested` only if it is exactly the XML ID served for `device_id`.
///
/// The error names the first component that differs.
pub fn validate_xml_id(requested: &str, device_id: &str) -> Result<()> {
    let served = XmlId::for_device(device_id);
    let reason = match XmlId::parse(requested) {
        None => "malformed XML ID".to_string(),
        Some(id) if id.schema_version != served.schema_version => format!(
            "schema version {} (serving {})",
            id.schema_version, served.schema_version
        ),
        Some(id) if id.device_id != served.device_id => {
            format!("device {:?} is not this session's device", id.device_id)
        }
        Some(id) if id.xml_version != served.xml_version => format!(
            "XML version {} (serving {})",
            id.xml_version, served.xml_version
        ),
        Some(_) => return Ok(()),
    };
    Err(DescriptionError::UnknownXmlId {
        id: requested.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str =
        "libCLProtocol_cred2.so#FirstLightImaging#CRED2#CRED2#Version_1_0_0#SN00000000";

    #[test]
    fn renders_host_format() {
        assert_eq!(
            xml_id_for(DEVICE),
            format!("SchemaVersion.1.1@{DEVICE}@XMLVersion.1.0.0")
        );
    }

    #[test]
    fn parse_inverts_display() {
        let id = XmlId::for_device(DEVICE);
        assert_eq!(XmlId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(XmlId::parse("SchemaVersion.1.1@dev").is_none());
        assert!(XmlId::parse("Schema.1.1@dev@XMLVersion.1.0.0").is_none());
        assert!(XmlId::parse("SchemaVersion.1.1@@XMLVersion.1.0.0").is_none());
        assert!(XmlId::parse("SchemaVersion.1.1@a@b@XMLVersion.1.0.0").is_none());
    }

    #[test]
    fn validate_requires_exact_match() {
        validate_xml_id(&xml_id_for(DEVICE), DEVICE).unwrap();
        let err = validate_xml_id("SchemaVersion.1.1@other@XMLVersion.1.0.0", DEVICE).unwrap_err();
        assert!(matches!(err, DescriptionError::UnknownXmlId { .. }));
        assert!(validate_xml_id("", DEVICE).is_err());
    }

    #[test]
    fn mismatch_names_the_component() {
        let reason = |requested: &str| match validate_xml_id(requested, DEVICE) {
            Err(DescriptionError::UnknownXmlId { reason, .. }) => reason,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(reason("garbage"), "malformed XML ID");
        assert_eq!(
            reason(&format!("SchemaVersion.1.0@{DEVICE}@XMLVersion.1.0.0")),
            "schema version 1.0 (serving 1.1)"
        );
        assert!(reason("SchemaVersion.1.1@other@XMLVersion.1.0.0").contains("\"other\""));
        assert_eq!(
            reason(&format!("SchemaVersion.1.1@{DEVICE}@XMLVersion.2.0.0")),
            "XML version 2.0.0 (serving 1.0.0)"
        );
    }
}
