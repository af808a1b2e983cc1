//! b3dm CLI - Tool for packing, unpacking and inspecting b3dm tiles.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use b3dm::glb::{inspect_glb, PayloadReport};
use b3dm::tile::{validate_container, Container, ValidationConfig, ValidationIssue};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter.
const LOG_ENV: &str = "B3DM_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Debug,
    Trace,
}

impl Verbosity {
    fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "off",
            Self::Normal => "warn",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Parsed command line.
#[derive(Debug)]
struct Options {
    verbosity: Verbosity,
    force: bool,
    json: bool,
    output: Option<PathBuf>,
    args: Vec<String>,
}

fn parse_args(raw: &[String]) -> Result<Options> {
    let mut opts = Options {
        verbosity: Verbosity::Normal,
        force: false,
        json: false,
        output: None,
        args: Vec::new(),
    };

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => opts.verbosity = Verbosity::Debug,
            "-vv" | "--trace" => opts.verbosity = Verbosity::Trace,
            "-q" | "--quiet" => opts.verbosity = Verbosity::Quiet,
            "-f" | "--force" => opts.force = true,
            "-j" | "--json" => opts.json = true,
            "-o" | "--output" => {
                let path = iter.next().context("missing value for --output")?;
                opts.output = Some(PathBuf::from(path));
            }
            // Accepted for compatibility with the older `-i <file>` form
            "-i" | "--input" => {
                let path = iter.next().context("missing value for --input")?;
                opts.args.push(path.clone());
            }
            _ => opts.args.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&raw) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(opts.verbosity);

    let Some((command, files)) = opts.args.split_first() else {
        print_banner();
        return ExitCode::SUCCESS;
    };

    let run: fn(&Path, &Options) -> Result<bool> = match command.as_str() {
        "pack" | "p" => cmd_pack,
        "unpack" | "u" => cmd_unpack,
        "info" | "i" => cmd_info,
        "validate" | "check" => cmd_validate,
        "help" | "h" | "-h" | "--help" => {
            print_help();
            return ExitCode::SUCCESS;
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        eprintln!("Error: missing file argument");
        eprintln!("Usage: b3dm {} <file>", command);
        return ExitCode::FAILURE;
    }
    if files.len() > 1 && opts.output.is_some() {
        eprintln!("Error: --output can only be used with a single input file");
        return ExitCode::FAILURE;
    }

    // Keep going after a failed file so every requested input is handled
    let mut ok = true;
    for file in files {
        match run(Path::new(file), &opts) {
            Ok(clean) => ok &= clean,
            Err(e) => {
                let kind = e.downcast_ref::<b3dm::Error>().map_or("Error", b3dm::Error::kind);
                eprintln!("{}: {}: {:#}", kind, file, e);
                ok = false;
            }
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_banner() {
    println!("b3dm v{}", env!("CARGO_PKG_VERSION"));
    println!("built {}", option_env!("B3DM_BUILD_STAMP").unwrap_or("unknown"));
    println!("-------------");
    println!();
    print_help();
}

fn print_help() {
    println!("USAGE:");
    println!("    b3dm [OPTIONS] <COMMAND> <FILE>...");
    println!();
    println!("COMMANDS:");
    println!("    p, pack      <glb>     Wrap a GLB into a b3dm with empty tables");
    println!("    u, unpack    <b3dm>    Extract the GLB payload");
    println!("    i, info      <b3dm>    Show header, tables and payload summary");
    println!("    validate     <b3dm>    Report structural issues (exit 1 if any)");
    println!("    h, help                Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -o, --output <path>    Output path (single input only)");
    println!("    -f, --force            Overwrite existing output files");
    println!("    -j, --json             Machine-readable output for info");
    println!("    -v, --verbose          Show debug output");
    println!("    -vv, --trace           Show trace output");
    println!("    -q, --quiet            Suppress log output");
    println!();
    println!("The {} environment variable overrides the log filter.", LOG_ENV);
}

/// Resolve the output path and refuse to clobber without --force.
///
/// Without `--output` the result is `<stem>.<extension>` in the working
/// directory, wherever the input lives.
fn output_path(input: &Path, opts: &Options, extension: &str) -> Result<PathBuf> {
    let out = match &opts.output {
        Some(path) => path.clone(),
        None => {
            let stem = input
                .file_stem()
                .with_context(|| format!("{} has no file name", input.display()))?;
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(extension);
            PathBuf::from(name)
        }
    };
    if out.exists() && !opts.force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    Ok(out)
}

fn cmd_pack(input: &Path, opts: &Options) -> Result<bool> {
    let glb = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    debug!(bytes = glb.len(), "read glb");

    if let PayloadReport::Invalid(issue) = inspect_glb(&glb) {
        println!("Warning: input is not a valid GLB ({}), packing anyway", issue);
    }

    let out = output_path(input, opts, "b3dm")?;
    let written = Container::from_glb(glb)?.save(&out)?;
    info!(bytes = written, "packed");
    println!("B3dm created {}", out.display());
    Ok(true)
}

fn cmd_unpack(input: &Path, opts: &Options) -> Result<bool> {
    let container = Container::open(input)?;
    println!("b3dm version: {}", container.header().version);

    match inspect_glb(container.payload()) {
        PayloadReport::Valid(summary) => {
            println!("glTF asset generator: {}", summary.generator.as_deref().unwrap_or("-"));
            println!("glTF version: {}", summary.asset_version);
            if let Some(bytes) = summary.buffer_byte_length {
                println!("Buffer bytes: {}", bytes);
            }
            let out = output_path(input, opts, "glb")?;
            std::fs::write(&out, container.payload())
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Glb created {}", out.display());
            Ok(true)
        }
        PayloadReport::Invalid(issue) => {
            println!("glTF payload not supported.");
            println!("{}", issue);
            Ok(false)
        }
    }
}

fn cmd_info(input: &Path, opts: &Options) -> Result<bool> {
    let container = Container::open(input)?;
    let issues = validate_container(&container, &ValidationConfig::default());
    let report = inspect_glb(container.payload());

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&info_json(input, &container, &issues, &report))?);
        return Ok(true);
    }

    let h = container.header();
    println!("b3dm file: {}", input.display());
    println!("b3dm header magic: {}", h.magic_str());
    println!("b3dm header version: {}", h.version);
    println!("b3dm header bytelength: {}", h.byte_length);
    println!("b3dm header featuretablejson length: {}", h.feature_table_json_byte_length);
    println!("b3dm header batchtablejson length: {}", h.batch_table_json_byte_length);
    if h.has_binary_tables() {
        println!("b3dm header featuretablebinary length: {}", h.feature_table_binary_byte_length);
        println!("b3dm header batchtablebinary length: {}", h.batch_table_binary_byte_length);
    }
    println!("Feature table json: {}", container.feature_table_json());
    println!("Batch table json: {}", container.batch_table_json());

    if issues.is_empty() {
        println!("Structure: ok");
    } else {
        println!("Structure: {} issue(s)", issues.len());
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    match &report {
        PayloadReport::Valid(s) => {
            println!("glTF model is loaded");
            println!("glTF generator: {}", s.generator.as_deref().unwrap_or("-"));
            println!("glTF version: {}", s.asset_version);
            println!("glTF meshes: {}", s.mesh_count);
            println!("glTF primitives: {}", s.primitive_count);
        }
        PayloadReport::Invalid(issue) => {
            println!("glTF payload not supported.");
            println!("{}", issue);
        }
    }
    Ok(true)
}

fn info_json(
    input: &Path,
    container: &Container,
    issues: &[ValidationIssue],
    report: &PayloadReport,
) -> serde_json::Value {
    let h = container.header();
    let payload = match report {
        PayloadReport::Valid(s) => serde_json::to_value(s).unwrap_or_default(),
        PayloadReport::Invalid(issue) => serde_json::json!({ "error": issue.to_string() }),
    };
    serde_json::json!({
        "file": input.display().to_string(),
        "header": {
            "magic": h.magic_str(),
            "version": h.version,
            "byteLength": h.byte_length,
            "featureTableJSONByteLength": h.feature_table_json_byte_length,
            "featureTableBinaryByteLength": h.feature_table_binary_byte_length,
            "batchTableJSONByteLength": h.batch_table_json_byte_length,
            "batchTableBinaryByteLength": h.batch_table_binary_byte_length,
        },
        "featureTableJson": container.feature_table_json(),
        "batchTableJson": container.batch_table_json(),
        "issues": issues.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        "payload": payload,
    })
}

fn cmd_validate(input: &Path, _opts: &Options) -> Result<bool> {
    let container = Container::open(input)?;
    let issues = validate_container(&container, &ValidationConfig::default());
    if issues.is_empty() {
        println!("{}: ok", input.display());
        return Ok(true);
    }
    for issue in &issues {
        println!("{}: {}", input.display(), issue);
    }
    Ok(false)
}
