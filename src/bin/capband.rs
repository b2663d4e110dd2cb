use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use capband::assets::decode::decode_image;
use capband::assets::intake::{UploadOrigin, screen_upload};
use capband::present::{save_png, suggested_filename};
use capband::text::{discover_font_bytes, load_font_bytes};
use capband::{ComposeJob, TextLayoutEngine, compose, split_text_lines};

#[derive(Parser, Debug)]
#[command(name = "capband", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a captioned PNG from a job file.
    Compose(ComposeArgs),
    /// Validate a job file without rendering.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path. Overrides the job's `out`; defaults to a
    /// timestamped name in the working directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Font file. Overrides the job's `font` and host discovery.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_job_json(path: &Path) -> anyhow::Result<ComposeJob> {
    let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
    let r = BufReader::new(f);
    let job: ComposeJob = serde_json::from_reader(r).with_context(|| "parse job JSON")?;
    Ok(job)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.in_path)?;
    job.validate()?;
    eprintln!("ok {}", args.in_path.display());
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.in_path)?;
    job.validate()?;

    let job_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));

    let image_path = job_dir.join(&job.image);
    let bytes = std::fs::read(&image_path)
        .with_context(|| format!("read image '{}'", image_path.display()))?;
    screen_upload(bytes.len() as u64, &UploadOrigin::Picker)?;
    let source = decode_image(&bytes)?;

    let lines = split_text_lines(&job.text);

    let font_bytes = match font_path_for(&args, &job, job_dir) {
        Some(path) => load_font_bytes(&path)?,
        None => discover_font_bytes()?,
    };

    let mut engine = TextLayoutEngine::new();
    let composite = compose(&source, &lines, &mut engine, &font_bytes)?;

    let out_path = args.out.unwrap_or_else(|| match &job.out {
        Some(o) => job_dir.join(o),
        None => PathBuf::from(suggested_filename(unix_millis())),
    });

    save_png(&composite, &out_path)?;
    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn font_path_for(args: &ComposeArgs, job: &ComposeJob, job_dir: &Path) -> Option<PathBuf> {
    if let Some(p) = &args.font {
        return Some(p.clone());
    }
    job.font.as_ref().map(|f| job_dir.join(f))
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
