use std::path::PathBuf;

use cred2clp_description::{DescriptionStore, DocumentSource};
use serde::Serialize;

use crate::cmd::DescriptionArgs;
use crate::exit::{description_error, io_error, CliResult, SUCCESS};
use crate::output::{print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct DescriptionOutput {
    source: String,
    bytes: usize,
    written_to: Option<PathBuf>,
}

pub fn run(args: DescriptionArgs, format: OutputFormat) -> CliResult<i32> {
    let store = DescriptionStore::from_env();
    let document = store
        .document()
        .map_err(|err| description_error("load failed", err))?;

    if let Some(path) = &args.output {
        std::fs::write(path, document.as_bytes())
            .map_err(|err| io_error(&format!("write {} failed", path.display()), err))?;
    }

    let out = DescriptionOutput {
        source: source_label(document.source()),
        bytes: document.as_bytes().len(),
        written_to: args.output,
    };

    match (format, &out.written_to) {
        (OutputFormat::Json, _) => print_json(&out),
        (_, None) => print_raw(document.as_bytes()),
        (OutputFormat::Raw, Some(_)) => {}
        (_, Some(path)) => {
            println!("wrote {} bytes from {} to {}", out.bytes, out.source, path.display());
        }
    }
    Ok(SUCCESS)
}

fn source_label(source: &DocumentSource) -> String {
    match source {
        DocumentSource::Embedded => "embedded".to_string(),
        DocumentSource::File(path) => path.display().to_string(),
    }
}
