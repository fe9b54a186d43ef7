use std::{
    collections::HashMap,
    env,
    error::Error,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use miette::{LabeledSpan, MietteDiagnostic, NamedSource};
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator};
use tracing::{debug, info};

use kphptags_core::{
    config::{CONFIG_FILE_NAME, Config},
    diagnostic::{Diagnostic, Severity},
    error::Error as CoreError,
    files::find_php_files,
    lint::{FileDiagnostics, ItemDiagnostics, ValidationOptions, lint},
    parser::{Parse as _, php::PhpParser},
};

/// The environment variable holding the path to the config file
pub const CONFIG_PATH_ENV_VAR: &str = "KT_CONFIG_PATH";

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a `.kphptags.toml` config file with default values
    Init,

    /// Generate shell completion scripts
    Completions {
        /// The flavor of shell for which to generate the completion script
        #[arg(short, long)]
        shell: Shell,

        /// The output directory for the file, prints to `stdout` if omitted
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        out: Option<PathBuf>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
#[non_exhaustive]
pub struct Args {
    /// One or more paths to files and folders to analyze
    #[arg(name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Path to a file or folder to exclude (can be used more than once)
    ///
    /// To exclude paths based on a pattern, use a `.kphpignore` file (same syntax as `.gitignore`).
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub exclude: Vec<PathBuf>,

    /// Optional path to a TOML config file
    ///
    /// If unspecified, the default path is `./.kphptags.toml`.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Write output to a file instead of stderr
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub out: Option<PathBuf>,

    /// Report performance tags placed on declarations other than functions and methods
    ///
    /// Can be set with `--applicability` (means true), `--applicability=true` or `--applicability=false`.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub applicability: Option<bool>,

    /// Only report diagnostics with this severity or higher
    #[arg(long, value_enum)]
    pub min_severity: Option<Severity>,

    /// Output diagnostics in JSON format
    ///
    /// Can be set with `--json` (means true), `--json=true` or `--json=false`.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub json: Option<bool>,

    /// Compact output
    ///
    /// If combined with `--json`, the output is minified.
    ///
    /// Can be set with `--compact` (means true), `--compact=true` or `--compact=false`.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub compact: Option<bool>,

    /// Sort the results by file path
    ///
    /// Can be set with `--sort` (means true), `--sort=true` or `--sort=false`.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub sort: Option<bool>,

    /// Log filter, e.g. `debug` or `kphptags_core=trace`
    ///
    /// Overrides the `KPHPTAGS_LOG` environment variable. Logs are written to stderr.
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Read the configuration from config file, environment variables and parsed CLI arguments (passed as argument)
pub fn read_config(args: Args) -> Result<Config, Box<figment::Error>> {
    let config_path = args
        .config
        .or_else(|| env::var(CONFIG_PATH_ENV_VAR).ok().map(Into::into));
    debug!(?config_path, "reading config");
    let mut config: Config = Config::figment(config_path).extract()?;
    // paths
    config.kphptags.paths.extend(args.paths);
    config.kphptags.exclude.extend(args.exclude);
    // output
    if let Some(out) = args.out {
        config.output.out = Some(out);
    }
    if let Some(json) = args.json {
        config.output.json = json;
    }
    if let Some(compact) = args.compact {
        config.output.compact = compact;
    }
    if let Some(sort) = args.sort {
        config.output.sort = sort;
    }
    // validation
    if let Some(applicability) = args.applicability {
        config.kphptags.applicability = applicability;
    }
    if let Some(min_severity) = args.min_severity {
        config.kphptags.min_severity = min_severity;
    }
    Ok(config)
}

/// The result of running the tool
pub enum RunResult {
    NoDiagnostics,
    SomeDiagnostics,
}

/// Run kphptags
pub fn run(config: &Config) -> Result<RunResult, Box<dyn Error>> {
    // identify PHP files to parse
    let paths = find_php_files(
        &config.kphptags.paths,
        &config.kphptags.exclude,
        config.output.sort,
    )?;
    if paths.is_empty() {
        return Err(String::from("no PHP file found, nothing to analyze").into());
    }
    info!(count = paths.len(), "linting files");

    // lint all the requested PHP files
    let options: ValidationOptions = config.into();
    let parser = PhpParser::new();

    let diagnostics = paths
        .par_iter()
        .filter_map(|p| {
            lint(
                parser.clone(),
                p,
                &options,
                !config.output.compact && !config.output.json,
            )
            .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;

    // check if we should output to file or to stderr/stdout
    let mut output_file: Box<dyn io::Write> = match &config.output.out {
        Some(path) => {
            let _ = miette::set_hook(Box::new(|_| {
                Box::new(
                    miette::MietteHandlerOpts::new()
                        .terminal_links(false)
                        .unicode(false)
                        .color(false)
                        .build(),
                )
            }));
            Box::new(
                File::options()
                    .truncate(true)
                    .create(true)
                    .write(true)
                    .open(path)
                    .map_err(|err| CoreError::IOError {
                        path: path.clone(),
                        err,
                    })?,
            )
        }
        None => {
            if diagnostics.is_empty() {
                Box::new(io::stdout())
            } else {
                Box::new(io::stderr())
            }
        }
    };

    // no issue was found
    if diagnostics.is_empty() {
        if config.output.json {
            writeln!(&mut output_file, "[]")?;
        } else {
            writeln!(&mut output_file, "No issue found")?;
        }
        return Ok(RunResult::NoDiagnostics);
    }
    for file_diags in &diagnostics {
        let counts = file_diags.count();
        info!(
            path = ?file_diags.path,
            errors = counts.errors,
            warnings = counts.warnings,
            "found issues"
        );
    }

    // some issues were found, output according to the desired format (json/text, pretty/compact)
    if config.output.json {
        if config.output.compact {
            writeln!(&mut output_file, "{}", serde_json::to_string(&diagnostics)?)?;
        } else {
            writeln!(
                &mut output_file,
                "{}",
                serde_json::to_string_pretty(&diagnostics)?
            )?;
        }
    } else {
        let cwd = dunce::canonicalize(env::current_dir()?)?;
        let mut contents = if config.output.compact {
            HashMap::default()
        } else {
            // all other clones have been dropped
            parser.get_sources()?
        };
        for file_diags in diagnostics {
            let source = contents.remove(&file_diags.document_id).unwrap_or_default();
            print_reports(
                &mut output_file,
                &cwd,
                file_diags,
                source,
                config.output.compact,
            )?;
        }
    }
    Ok(RunResult::SomeDiagnostics)
}

/// Write the default configuration to a `.kphptags.toml` file in the current directory.
///
/// If a file already exists with the same name, it gets renamed to `.kphptags.bck.toml` before writing the default
/// config.
pub fn write_default_config() -> Result<PathBuf, Box<dyn Error>> {
    let config = Config::default();
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() {
        fs::rename(&path, ".kphptags.bck.toml")?;
        println!("Existing `.kphptags.toml` file was renamed to `.kphptags.bck.toml`");
    }
    fs::write(&path, toml::to_string(&config)?)?;
    Ok(dunce::canonicalize(&path)?)
}

/// Print the reports for a given file, either as pretty or compact text output
///
/// The root path is the current working directory used to compute relative paths if possible. If the file path is
/// not a child of the root path, then the full canonical path of the file is used instead.
/// The writer can be anything that implement [`io::Write`].
pub fn print_reports(
    f: &mut impl io::Write,
    root_path: impl AsRef<Path>,
    file_diags: FileDiagnostics,
    contents: String,
    compact: bool,
) -> Result<(), io::Error> {
    fn inner(
        f: &mut impl io::Write,
        root_path: &Path,
        file_diags: FileDiagnostics,
        contents: String,
        compact: bool,
    ) -> Result<(), io::Error> {
        let source_name = match file_diags.path.strip_prefix(root_path) {
            Ok(relative_path) => relative_path.to_string_lossy(),
            Err(_) => file_diags.path.to_string_lossy(),
        };
        if compact {
            for item_diags in &file_diags.items {
                item_diags.print_compact(f, &source_name)?;
            }
        } else {
            let source = Arc::new(NamedSource::new(source_name, contents));
            for item_diags in file_diags.items {
                print_report(f, Arc::clone(&source), item_diags)?;
            }
        }
        Ok(())
    }
    inner(f, root_path.as_ref(), file_diags, contents, compact)
}

fn miette_severity(severity: Severity) -> miette::Severity {
    match severity {
        Severity::Info => miette::Severity::Advice,
        Severity::Warning => miette::Severity::Warning,
        Severity::Error => miette::Severity::Error,
    }
}

fn label(diag: Diagnostic) -> LabeledSpan {
    let mut text = format!("{}: {}", diag.severity, diag.message);
    if let Some(fix) = &diag.fix {
        text.push_str(" (fix: ");
        text.push_str(&fix.message);
        text.push(')');
    }
    LabeledSpan::new(
        Some(text),
        diag.span.start.utf8,
        diag.span.end.utf8 - diag.span.start.utf8,
    )
}

/// Print a single report related to one source item with [`miette`].
///
/// The report's severity is the highest severity among the item's diagnostics.
/// The writer can be anything that implement [`io::Write`].
fn print_report(
    f: &mut impl io::Write,
    source: Arc<NamedSource<String>>,
    item: ItemDiagnostics,
) -> Result<(), io::Error> {
    let msg = item.title();
    let severity = item
        .diags
        .iter()
        .map(|d| d.severity)
        .max()
        .unwrap_or_default();
    let labels: Vec<_> = item.diags.into_iter().map(label).collect();
    let report: miette::Report = MietteDiagnostic::new(msg)
        .with_severity(miette_severity(severity))
        .with_labels(labels)
        .into();
    write!(f, "{:?}", report.with_source_code(source))
}
