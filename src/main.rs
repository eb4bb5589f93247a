use clap::Parser;
use filepile::config;
use filepile::errors::PipelineError;
use filepile::{Engine, FilePile, Record};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "filepile")]
#[command(about = "Merge key = value readings from a flat file into an archive record", long_about = None)]
struct Args {
    /// JSON configuration file with a FilePile stanza (defaults when omitted)
    #[arg(long, env = "FILEPILE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON record to augment; must carry usUnits
    #[arg(long)]
    record: PathBuf,

    /// Write the merged record here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), PipelineError> {
    let settings = config::load_settings(args.config.as_deref())?;

    let mut engine = Engine::new();
    engine.bind(FilePile::new(settings));

    let mut record = read_record(&args.record)?;
    engine.dispatch_new_archive_record(&mut record);
    info!("Record now holds {} fields", record.len());

    let json = serde_json::to_string_pretty(&record).map_err(|e| PipelineError::RecordJson {
        path: args.record.clone(),
        source: e,
    })?;
    match &args.output {
        Some(path) => fs::write(path, json + "\n").map_err(|e| PipelineError::RecordIo {
            path: path.clone(),
            source: e,
        })?,
        None => println!("{}", json),
    }
    Ok(())
}

fn read_record(path: &Path) -> Result<Record, PipelineError> {
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::RecordIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| PipelineError::RecordJson {
        path: path.to_path_buf(),
        source: e,
    })
}
