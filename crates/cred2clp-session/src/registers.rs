//! The C-RED2 register map.
//!
//! Every host-visible address is one [`RegisterDescriptor`]: a GenApi feature
//! name, a value kind, and the rules that translate a read or write into a
//! shell command. The table is static and sorted by address.

use std::fmt;

use serde::Serialize;

use crate::session::{Selector, SelectorState};
use crate::vocab::BoolSpelling::{self, EnableDisable, OnOff};
use crate::vocab::{FAN_MODES, IP_MODES, SENSIBILITY_LEVELS, SYNCHRONIZATION_MODES};
use RegisterKind::{Enum, Float32, Int32};

/// Which directions a register supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    #[serde(rename = "RO")]
    ReadOnly,
    #[serde(rename = "WO")]
    WriteOnly,
    #[serde(rename = "RW")]
    ReadWrite,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::ReadOnly => "RO",
            Access::WriteOnly => "WO",
            Access::ReadWrite => "RW",
        }
    }

    pub fn can_read(self) -> bool {
        matches!(self, Access::ReadOnly | Access::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Access::WriteOnly | Access::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary layout of a register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "length", rename_all = "snake_case")]
pub enum RegisterKind {
    Int32,
    Float32,
    /// Integer index into a fixed vocabulary.
    Enum,
    /// NUL-terminated text of a declared byte length.
    String(usize),
}

impl RegisterKind {
    /// Bytes a caller buffer must provide.
    pub fn width(self) -> usize {
        match self {
            RegisterKind::Int32 | RegisterKind::Float32 | RegisterKind::Enum => 4,
            RegisterKind::String(len) => len,
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterKind::Int32 => f.write_str("int32"),
            RegisterKind::Float32 => f.write_str("float32"),
            RegisterKind::Enum => f.write_str("enum"),
            RegisterKind::String(len) => write!(f, "string[{len}]"),
        }
    }
}

/// How a register read is answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadRule {
    /// Reply text copied into the buffer.
    Text(&'static str),
    /// Leading integer of the reply.
    Int(&'static str),
    /// Leading float of the reply.
    Float(&'static str),
    /// Boolean reply, stored as 0 or 1.
    Bool(&'static str),
    /// Reply word looked up in a vocabulary, stored as its index.
    Choice(&'static str, &'static [&'static str]),
    /// The session's selector value, no device I/O.
    Selector(Selector),
    /// A fixed value, no device I/O.
    Constant(i32),
    /// An empty string, no device I/O.
    Empty,
    /// Float reading whose command depends on a selector. Selector values
    /// outside `variants` use `fallback`.
    SelectedFloat {
        selector: Selector,
        variants: &'static [&'static str],
        fallback: &'static str,
    },
}

impl ReadRule {
    /// The command this read sends, given the session's selectors.
    pub fn command(&self, selectors: &SelectorState) -> Option<&'static str> {
        match *self {
            ReadRule::Text(cmd)
            | ReadRule::Int(cmd)
            | ReadRule::Float(cmd)
            | ReadRule::Bool(cmd)
            | ReadRule::Choice(cmd, _) => Some(cmd),
            ReadRule::SelectedFloat {
                selector,
                variants,
                fallback,
            } => {
                let value = selectors.get(selector);
                let variant = usize::try_from(value)
                    .ok()
                    .and_then(|idx| variants.get(idx).copied());
                Some(variant.unwrap_or(fallback))
            }
            ReadRule::Selector(_) | ReadRule::Constant(_) | ReadRule::Empty => None,
        }
    }

    /// One-line description for listings.
    pub fn describe(&self) -> String {
        match self {
            ReadRule::Text(cmd)
            | ReadRule::Int(cmd)
            | ReadRule::Float(cmd)
            | ReadRule::Bool(cmd) => (*cmd).to_string(),
            ReadRule::Choice(cmd, words) => format!("{cmd} [{}]", words.join("|")),
            ReadRule::Selector(selector) => format!("<{selector:?} selector>"),
            ReadRule::Constant(value) => format!("<constant {value}>"),
            ReadRule::Empty => "<empty>".to_string(),
            ReadRule::SelectedFloat {
                selector,
                variants,
                fallback,
            } => format!(
                "{} by {selector:?} selector, else {fallback}",
                variants.join(" | ")
            ),
        }
    }
}

/// How a register write is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRule {
    /// Fixed command, payload ignored.
    Command(&'static str),
    /// `<prefix> on|off` or `<prefix> enable|disable`.
    Bool(&'static str, BoolSpelling),
    /// `<prefix> %d`.
    Int(&'static str),
    /// `<prefix> %.6f`.
    Float(&'static str),
    /// `<prefix> <text>`, payload read as a bounded string.
    Text(&'static str),
    /// `<prefix> <word>`, index clamped into the vocabulary.
    Choice(&'static str, &'static [&'static str]),
    /// Stores the payload into a selector, no device I/O.
    Selector(Selector),
    /// `<prefix> <selector value>`, payload ignored.
    SelectorCommand(&'static str, Selector),
}

impl WriteRule {
    /// One-line description for listings.
    pub fn describe(&self) -> String {
        match self {
            WriteRule::Command(cmd) => (*cmd).to_string(),
            WriteRule::Bool(prefix, spelling) => format!(
                "{prefix} {}|{}",
                spelling.word(true),
                spelling.word(false)
            ),
            WriteRule::Int(prefix) => format!("{prefix} <int>"),
            WriteRule::Float(prefix) => format!("{prefix} <float>"),
            WriteRule::Text(prefix) => format!("{prefix} <text>"),
            WriteRule::Choice(prefix, words) => format!("{prefix} [{}]", words.join("|")),
            WriteRule::Selector(selector) => format!("<{selector:?} selector>"),
            WriteRule::SelectorCommand(prefix, selector) => {
                format!("{prefix} <{selector:?} selector>")
            }
        }
    }
}

/// One entry of the register map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterDescriptor {
    pub address: u64,
    /// GenApi feature name.
    pub name: &'static str,
    pub kind: RegisterKind,
    pub read: Option<ReadRule>,
    pub write: Option<WriteRule>,
}

impl RegisterDescriptor {
    pub fn access(&self) -> Access {
        match (self.read.is_some(), self.write.is_some()) {
            (true, true) => Access::ReadWrite,
            (true, false) => Access::ReadOnly,
            // Every entry has at least one rule.
            (false, _) => Access::WriteOnly,
        }
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }
}

const fn ro(address: u64, name: &'static str, kind: RegisterKind, read: ReadRule) -> RegisterDescriptor {
    RegisterDescriptor {
        address,
        name,
        kind,
        read: Some(read),
        write: None,
    }
}

const fn wo(address: u64, name: &'static str, kind: RegisterKind, write: WriteRule) -> RegisterDescriptor {
    RegisterDescriptor {
        address,
        name,
        kind,
        read: None,
        write: Some(write),
    }
}

const fn rw(
    address: u64,
    name: &'static str,
    kind: RegisterKind,
    read: ReadRule,
    write: WriteRule,
) -> RegisterDescriptor {
    RegisterDescriptor {
        address,
        name,
        kind,
        read: Some(read),
        write: Some(write),
    }
}

const fn bool_rw(address: u64, name: &'static str, read: &'static str, write: &'static str) -> RegisterDescriptor {
    rw(address, name, Int32, ReadRule::Bool(read), WriteRule::Bool(write, OnOff))
}

const fn float_ro(address: u64, name: &'static str, read: &'static str) -> RegisterDescriptor {
    ro(address, name, Float32, ReadRule::Float(read))
}

const fn float_rw(address: u64, name: &'static str, read: &'static str, write: &'static str) -> RegisterDescriptor {
    rw(address, name, Float32, ReadRule::Float(read), WriteRule::Float(write))
}

const fn int_rw(address: u64, name: &'static str, read: &'static str, write: &'static str) -> RegisterDescriptor {
    rw(address, name, Int32, ReadRule::Int(read), WriteRule::Int(write))
}

const fn text_ro(address: u64, name: &'static str, len: usize, read: &'static str) -> RegisterDescriptor {
    ro(address, name, RegisterKind::String(len), ReadRule::Text(read))
}

const fn selector_rw(address: u64, name: &'static str, selector: Selector) -> RegisterDescriptor {
    rw(address, name, Int32, ReadRule::Selector(selector), WriteRule::Selector(selector))
}

const fn choice_rw(
    address: u64,
    name: &'static str,
    read: &'static str,
    write: &'static str,
    words: &'static [&'static str],
) -> RegisterDescriptor {
    rw(address, name, Enum, ReadRule::Choice(read, words), WriteRule::Choice(write, words))
}

const fn ip_rw(address: u64, name: &'static str, read: ReadRule, write: &'static str) -> RegisterDescriptor {
    rw(address, name, RegisterKind::String(32), read, WriteRule::Text(write))
}

/// `temperatures` sub-commands, indexed by the temperature selector.
pub const TEMPERATURE_COMMANDS: &[&str] = &[
    "temperatures motherboard raw",
    "temperatures frontend raw",
    "temperatures powerboard raw",
    "temperatures snake raw",
    "temperatures snake setpoint raw",
    "temperatures peltier raw",
    "temperatures heatsink raw",
];

/// `power` sub-commands, indexed by the power selector.
pub const POWER_COMMANDS: &[&str] = &["power raw", "power snake raw", "power peltier raw"];

/// Sensor geometry reported by the constant `Width`/`Height` registers.
pub const SENSOR_WIDTH: i32 = 640;
pub const SENSOR_HEIGHT: i32 = 512;

/// The complete register map, sorted by address.
pub static REGISTERS: &[RegisterDescriptor] = &[
    // Device identification and status.
    text_ro(0x0000, "DeviceModelName", 64, "cameratype raw"),
    text_ro(0x0040, "DeviceSerialNumber", 64, "hwuid raw"),
    text_ro(0x0080, "DeviceFirmwareVersion", 64, "version firmware raw"),
    text_ro(0x00C0, "DeviceFirmwareVersionDetailed", 64, "version firmware detailed raw"),
    text_ro(0x0100, "DeviceFirmwareBuild", 64, "version firmware build raw"),
    text_ro(0x0140, "DeviceFpgaVersion", 64, "version fpga raw"),
    text_ro(0x0180, "DeviceHardwareVersion", 64, "version hardware raw"),
    text_ro(0x01C0, "DeviceStatus", 128, "status raw"),
    text_ro(0x0240, "DeviceStatusDetailed", 128, "status detailed raw"),
    wo(0x0300, "DeviceShutdown", Int32, WriteRule::Command("shutdown")),
    wo(0x0304, "ContinueAfterError", Int32, WriteRule::Command("continue")),
    wo(0x0308, "DeviceFactoryReset", Int32, WriteRule::Command("restorefactory")),
    selector_rw(0x0310, "DeviceIndicatorSelector", Selector::Indicator),
    bool_rw(0x0314, "DeviceIndicatorMode", "led raw", "set led"),
    // Acquisition.
    float_rw(0x1000, "AcquisitionFrameRate", "fps raw", "set fps"),
    float_ro(0x1004, "AcquisitionFrameRateMin", "minfps raw"),
    float_ro(0x1008, "AcquisitionFrameRateMax", "maxfps raw"),
    float_rw(0x1010, "ExposureTime", "tint raw", "set tint"),
    float_ro(0x1014, "ExposureTimeMin", "mintint raw"),
    float_ro(0x1018, "ExposureTimeMax", "maxtint raw"),
    float_ro(0x101C, "ExposureTimeMaxNoOverlap", "maxtintitr raw"),
    bool_rw(0x1020, "ExposureTimeGranularityEnable", "tintgranularity raw", "set tintgranularity"),
    bool_rw(0x1030, "TriggerMode", "extsynchro raw", "set extsynchro"),
    float_rw(0x1034, "TriggerDelay", "tlsydel raw", "set tlsydel"),
    choice_rw(0x1038, "TriggerSourceFormat", "synchronization raw", "set synchronization", SYNCHRONIZATION_MODES),
    // Analog.
    bool_rw(0x1100, "VrefAdjustEnable", "vrefadjust raw", "set vrefadjust"),
    bool_rw(0x1104, "TcdsAdjustEnable", "tcdsadjust raw", "set tcdsadjust"),
    choice_rw(0x1108, "SensitivityMode", "sensibility raw", "set sensibility", SENSIBILITY_LEVELS),
    // Image format and corrections.
    bool_rw(0x1200, "CropEnable", "cropping raw", "set cropping"),
    int_rw(0x1204, "OffsetX", "cropping columns raw", "set cropping columns"),
    int_rw(0x1208, "OffsetY", "cropping rows raw", "set cropping rows"),
    ro(0x120C, "Width", Int32, ReadRule::Constant(SENSOR_WIDTH)),
    ro(0x1210, "Height", Int32, ReadRule::Constant(SENSOR_HEIGHT)),
    bool_rw(0x1214, "RawImagesEnable", "rawimages raw", "set rawimages"),
    int_rw(0x1218, "ImroReadBetweenReset", "nbreadworeset raw", "set nbreadworeset"),
    bool_rw(0x1220, "BiasCorrectionEnable", "bias raw", "set bias"),
    bool_rw(0x1224, "FlatCorrectionEnable", "flat raw", "set flat"),
    bool_rw(0x1228, "BadPixelCorrectionEnable", "badpixel raw", "set badpixel"),
    bool_rw(0x1230, "ChunkModeActive", "imagetags raw", "set imagetags"),
    // Temperature.
    selector_rw(0x2000, "DeviceTemperatureSelector", Selector::Temperature),
    ro(
        0x2004,
        "DeviceTemperature",
        Float32,
        ReadRule::SelectedFloat {
            selector: Selector::Temperature,
            variants: TEMPERATURE_COMMANDS,
            fallback: "temperatures raw",
        },
    ),
    // User sets.
    selector_rw(0x2100, "UserSetSelector", Selector::UserSet),
    wo(0x2104, "UserSetLoad", Int32, WriteRule::SelectorCommand("set preset", Selector::UserSet)),
    wo(0x2108, "UserSetSave", Int32, WriteRule::Command("save")),
    // Events.
    bool_rw(0x2200, "EventEnable", "events raw", "set events"),
    // Power and cooling.
    selector_rw(0x3000, "DevicePowerSelector", Selector::Power),
    ro(
        0x3004,
        "DevicePowerConsumption",
        Float32,
        ReadRule::SelectedFloat {
            selector: Selector::Power,
            variants: POWER_COMMANDS,
            fallback: "power raw",
        },
    ),
    choice_rw(0x3010, "DeviceFanMode", "fan mode raw", "set fan mode", FAN_MODES),
    int_rw(0x3014, "DeviceFanSpeed", "fan speed raw", "set fan speed"),
    float_ro(0x3020, "VrefVoltage", "voltage vref raw"),
    float_rw(0x3024, "VrefVoltageTarget", "voltage vref raw", "set voltage vref"),
    // Network.
    ip_rw(0x3100, "IpAddress", ReadRule::Text("ipaddress raw"), "set ip address"),
    ip_rw(0x3110, "IpNetmask", ReadRule::Empty, "set ip netmask"),
    ip_rw(0x3120, "IpGateway", ReadRule::Empty, "set ip gateway"),
    ip_rw(0x3130, "IpDns", ReadRule::Empty, "set ip dns"),
    ip_rw(0x3140, "IpAlternateDns", ReadRule::Empty, "set ip alternate-dns"),
    rw(0x3150, "IpMode", Enum, ReadRule::Constant(0), WriteRule::Choice("set ip mode", IP_MODES)),
    rw(0x3160, "TelnetEnable", Int32, ReadRule::Bool("telnet raw"), WriteRule::Bool("set telnet", EnableDisable)),
    bool_rw(0x3164, "RemoteMaintenanceEnable", "remotemaintenance raw", "set remotemaintenance"),
    wo(0x3170, "AccessPassword", RegisterKind::String(64), WriteRule::Text("set password")),
    text_ro(0x3180, "LicenseList", 256, "licenses"),
];

/// Descriptor for `address`.
pub fn lookup(address: u64) -> Option<&'static RegisterDescriptor> {
    REGISTERS
        .binary_search_by_key(&address, |reg| reg.address)
        .ok()
        .map(|idx| &REGISTERS[idx])
}

/// Descriptor for a GenApi feature name, ignoring ASCII case.
pub fn lookup_name(name: &str) -> Option<&'static RegisterDescriptor> {
    REGISTERS.iter().find(|reg| reg.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in REGISTERS.windows(2) {
            assert!(
                pair[0].address < pair[1].address,
                "{:#x} before {:#x}",
                pair[0].address,
                pair[1].address
            );
        }
    }

    #[test]
    fn names_are_unique() {
        for (idx, reg) in REGISTERS.iter().enumerate() {
            assert!(
                REGISTERS[idx + 1..].iter().all(|other| other.name != reg.name),
                "{} listed twice",
                reg.name
            );
        }
    }

    #[test]
    fn every_register_is_addressable() {
        for reg in REGISTERS {
            assert!(reg.read.is_some() || reg.write.is_some(), "{}", reg.name);
            assert_eq!(lookup(reg.address), Some(reg));
            assert_eq!(lookup_name(reg.name), Some(reg));
        }
        assert!(lookup(0x0004).is_none());
        assert!(lookup(0xFFFF_FFFF).is_none());
        assert_eq!(lookup_name("exposuretime").map(|r| r.address), Some(0x1010));
    }

    #[test]
    fn widths_follow_kind() {
        assert_eq!(lookup(0x1000).unwrap().width(), 4);
        assert_eq!(lookup(0x01C0).unwrap().width(), 128);
        assert_eq!(lookup(0x3100).unwrap().width(), 32);
        assert_eq!(lookup(0x3180).unwrap().width(), 256);
    }

    #[test]
    fn access_follows_rules() {
        assert_eq!(lookup(0x0000).unwrap().access(), Access::ReadOnly);
        assert_eq!(lookup(0x0300).unwrap().access(), Access::WriteOnly);
        assert_eq!(lookup(0x1000).unwrap().access(), Access::ReadWrite);
        assert_eq!(lookup(0x3170).unwrap().access(), Access::WriteOnly);
    }

    #[test]
    fn selected_float_picks_variant_or_fallback() {
        let rule = lookup(0x2004).unwrap().read.unwrap();
        let mut selectors = SelectorState::default();
        assert_eq!(rule.command(&selectors), Some("temperatures motherboard raw"));
        selectors.temperature = 4;
        assert_eq!(rule.command(&selectors), Some("temperatures snake setpoint raw"));
        selectors.temperature = 7;
        assert_eq!(rule.command(&selectors), Some("temperatures raw"));
        selectors.temperature = -1;
        assert_eq!(rule.command(&selectors), Some("temperatures raw"));

        let rule = lookup(0x3004).unwrap().read.unwrap();
        selectors.power = 2;
        assert_eq!(rule.command(&selectors), Some("power peltier raw"));
        selectors.power = 3;
        assert_eq!(rule.command(&selectors), Some("power raw"));
    }

    #[test]
    fn descriptions_render() {
        assert_eq!(lookup(0x3160).unwrap().write.unwrap().describe(), "set telnet enable|disable");
        assert_eq!(
            lookup(0x1108).unwrap().read.unwrap().describe(),
            "sensibility raw [low|medium|high]"
        );
        assert_eq!(lookup(0x120C).unwrap().read.unwrap().describe(), "<constant 640>");
    }
}
