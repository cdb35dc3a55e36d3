use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use cred2clp_session::{RegisterDescriptor, REGISTERS};
use serde::Serialize;

use crate::cmd::RegistersArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{format_address, print_json, OutputFormat};

#[derive(Serialize)]
struct RegisterOutput {
    address: String,
    name: &'static str,
    kind: String,
    access: &'static str,
    read: Option<String>,
    write: Option<String>,
}

impl From<&RegisterDescriptor> for RegisterOutput {
    fn from(reg: &RegisterDescriptor) -> Self {
        Self {
            address: format_address(reg.address),
            name: reg.name,
            kind: reg.kind.to_string(),
            access: reg.access().as_str(),
            read: reg.read.map(|rule| rule.describe()),
            write: reg.write.map(|rule| rule.describe()),
        }
    }
}

pub fn run(args: RegistersArgs, format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<RegisterOutput> = selected(args.filter.as_deref())
        .map(RegisterOutput::from)
        .collect();
    print_registers(&rows, format);
    Ok(SUCCESS)
}

fn selected(filter: Option<&str>) -> impl Iterator<Item = &'static RegisterDescriptor> {
    let needle = filter.map(str::to_ascii_lowercase);
    REGISTERS.iter().filter(move |reg| match &needle {
        Some(needle) => reg.name.to_ascii_lowercase().contains(needle.as_str()),
        None => true,
    })
}

fn print_registers(rows: &[RegisterOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "NAME", "KIND", "ACCESS", "READ", "WRITE"]);
            for row in rows {
                table.add_row(vec![
                    row.address.clone(),
                    row.name.to_string(),
                    row.kind.clone(),
                    row.access.to_string(),
                    row.read.clone().unwrap_or_default(),
                    row.write.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{} {:<32} {:<10} {}", row.address, row.name, row.kind, row.access);
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_names_case_insensitively() {
        let names: Vec<_> = selected(Some("temperature")).map(|reg| reg.name).collect();
        assert_eq!(names, ["DeviceTemperatureSelector", "DeviceTemperature"]);
        assert_eq!(selected(None).count(), REGISTERS.len());
    }

    #[test]
    fn rows_describe_both_directions() {
        let row = RegisterOutput::from(cred2clp_session::lookup(0x1000).unwrap());
        assert_eq!(row.access, "RW");
        assert_eq!(row.read.as_deref(), Some("fps raw"));
        assert!(row.write.unwrap().starts_with("set fps"));
    }
}
