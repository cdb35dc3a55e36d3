use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use cred2clp_session::{RegisterDescriptor, RegisterValue};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One register value as read from the camera.
#[derive(Debug, Clone, Serialize)]
pub struct ValueOutput {
    pub register: &'static str,
    pub address: String,
    pub kind: String,
    pub value: RegisterValue,
    pub timestamp: String,
}

impl ValueOutput {
    pub fn new(reg: &RegisterDescriptor, value: RegisterValue) -> Self {
        Self {
            register: reg.name,
            address: format_address(reg.address),
            kind: reg.kind.to_string(),
            value,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_values(values: &[ValueOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for value in values {
                print_json(value);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "REGISTER", "KIND", "VALUE"]);
            for value in values {
                table.add_row(vec![
                    value.address.clone(),
                    value.register.to_string(),
                    value.kind.clone(),
                    value.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for value in values {
                println!("{} ({}) = {}", value.register, value.address, value.value);
            }
        }
        OutputFormat::Raw => {
            for value in values {
                println!("{}", value.value);
            }
        }
    }
}

/// One JSON document per line.
pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn format_address(address: u64) -> String {
    format!("{address:#06x}")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
