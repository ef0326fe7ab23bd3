//! CLI tool for xlexport - inspect workbooks and call the export service
//!
//! Usage:
//!   xlexport_cli sheets <input.xlsx>
//!   xlexport_cli show <input.xlsx> [--sheet NAME]
//!   xlexport_cli export <input.xlsx> --sheet NAME [--api-base URL] [-o DIR]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::blocking::multipart::{Form, Part};
use xlexport::export::{
    DownloadFile, DownloadSink, ExportRequest, ExportResponse, FILE_FIELD, SHEET_FIELD, XLSX_MIME,
};
use xlexport::viewer::{ExportOutcome, LoadOutcome};
use xlexport::{logging, ExcelViewer, ExportConfig, Result, XlexportError};

#[derive(Parser)]
#[command(name = "xlexport_cli")]
#[command(version, about = "Inspect XLSX sheets and export one through the export service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sheet names in workbook order
    Sheets {
        /// Input workbook (.xlsx)
        input: PathBuf,
    },

    /// Print a sheet as tab-separated rows
    Show {
        /// Input workbook (.xlsx)
        input: PathBuf,

        /// Sheet to print (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Send the workbook and a sheet name to the export service and save the result
    Export {
        /// Input workbook (.xlsx)
        input: PathBuf,

        /// Sheet to export
        #[arg(short, long)]
        sheet: String,

        /// Export service base URL (default: $XLEXPORT_API_BASE or http://localhost:8000)
        #[arg(long)]
        api_base: Option<String>,

        /// Directory for the downloaded file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sheets { input } => list_sheets(&input),
        Commands::Show { input, sheet } => show_sheet(&input, sheet.as_deref()),
        Commands::Export {
            input,
            sheet,
            api_base,
            output,
        } => {
            let config = api_base.map_or_else(ExportConfig::from_env, ExportConfig::new);
            export_sheet(&input, &sheet, config, &output)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            log::debug!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

/// Load a file through the same validation and parsing path as the browser.
fn load(input: &Path, config: ExportConfig) -> Result<ExcelViewer> {
    let mut viewer = ExcelViewer::new(config);
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ticket = viewer.begin_file_selection(&name)?;
    let bytes = fs::read(input).map_err(XlexportError::from);
    match viewer.complete_file_selection(ticket, bytes) {
        LoadOutcome::Loaded(_) => Ok(viewer),
        LoadOutcome::Failed | LoadOutcome::Superseded => Err(XlexportError::Other(
            viewer
                .error()
                .unwrap_or(xlexport::error::READ_ERROR_MESSAGE)
                .to_string(),
        )),
    }
}

fn list_sheets(input: &Path) -> Result<()> {
    let viewer = load(input, ExportConfig::default())?;
    let mut out = io::stdout().lock();
    for name in viewer.sheet_names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn show_sheet(input: &Path, sheet: Option<&str>) -> Result<()> {
    let mut viewer = load(input, ExportConfig::default())?;
    if let Some(sheet) = sheet {
        viewer.select_sheet(sheet)?;
    }
    let mut out = io::stdout().lock();
    for row in viewer.rows() {
        let line: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", line.join("\t"))?;
    }
    Ok(())
}

fn export_sheet(input: &Path, sheet: &str, config: ExportConfig, output: &Path) -> Result<()> {
    let mut viewer = load(input, config)?;
    viewer.select_sheet(sheet)?;

    let job = viewer.begin_export()?;
    let response = post_blocking(&job.request);
    match viewer.complete_export(&job, response) {
        ExportOutcome::Ready(file) => {
            DirectorySink::new(output).save(&file)?;
            Ok(())
        }
        ExportOutcome::Failed | ExportOutcome::Superseded => Err(XlexportError::Other(
            viewer.error().unwrap_or("export failed").to_string(),
        )),
    }
}

fn transport(e: reqwest::Error) -> XlexportError {
    XlexportError::Transport(e.to_string())
}

/// The `file` + `sheet` form the export endpoint expects.
fn export_form(request: &ExportRequest) -> Result<Form> {
    let file = Part::bytes(request.file_bytes.clone())
        .file_name(request.file_name.clone())
        .mime_str(XLSX_MIME)
        .map_err(transport)?;
    Ok(Form::new()
        .part(FILE_FIELD, file)
        .text(SHEET_FIELD, request.sheet.clone()))
}

/// Post the request with a blocking reqwest client.
fn post_blocking(request: &ExportRequest) -> Result<ExportResponse> {
    let response = reqwest::blocking::Client::new()
        .post(&request.url)
        .multipart(export_form(request)?)
        .send()
        .map_err(transport)?;

    let status = response.status().as_u16();
    let content_disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body = response.bytes().map_err(transport)?.to_vec();
    Ok(ExportResponse {
        status,
        content_disposition,
        body,
    })
}

/// Writes downloads into a directory, keeping only the last path component of the name.
struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file: &DownloadFile) -> Result<()> {
        let name = Path::new(&file.name)
            .file_name()
            .ok_or_else(|| XlexportError::Download(format!("unusable file name {:?}", file.name)))?;
        let path = self.dir.join(name);
        fs::write(&path, &file.bytes)?;
        eprintln!("Written: {}", path.display());
        Ok(())
    }
}
