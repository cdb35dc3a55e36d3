//! Register-description document for the C-RED2 CLProtocol adapter.
//!
//! The adapter never interprets this document. It only stores it and hands it
//! to the GenApi host together with the XML ID the host uses to ask for it.
//! The embedded copy can be replaced at runtime via `CLP_XML_PATH`.

pub mod config;
pub mod error;
pub mod store;
pub mod xml_id;

pub use config::{DescriptionConfig, DEFAULT_MAX_DOCUMENT_SIZE, XML_PATH_ENV};
pub use error::{DescriptionError, Result};
pub use store::{DescriptionStore, Document, DocumentSource, EMBEDDED_DESCRIPTION};
pub use xml_id::{validate_xml_id, xml_id_for, XmlId, SCHEMA_VERSION, XML_VERSION};
