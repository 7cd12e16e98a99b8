mod logging;
mod report;
mod site;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use composer::{Outline, SiteConfig};

use logging::LogFormat;
use report::Reporter;

#[derive(Parser)]
#[command(name = "docsite", version, about = "Documentation page composer")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose every page under a directory and write HTML
    Build(BuildArgs),

    /// Parse and resolve pages without writing anything
    Check(CheckArgs),

    /// Print a page's block tree and table of contents
    Outline(OutlineArgs),

    /// Run .test.md fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Page file or directory of .md/.mdx pages
    input: PathBuf,

    /// Site configuration (defaults to docsite.toml next to the input)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "dist")]
    out: PathBuf,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Page file or directory of .md/.mdx pages
    input: PathBuf,

    /// Site configuration (defaults to docsite.toml next to the input)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct OutlineArgs {
    /// Page to inspect
    file: PathBuf,

    /// Dump the parsed document instead of the block tree
    #[arg(long)]
    ast: bool,

    /// Site configuration, for the table of contents levels
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose, cli.no_color);

    let code = match cli.command {
        Command::Build(args) => {
            do_site(&args.input, args.config.as_deref(), Some(args.out.as_path()), cli.no_color)
        }
        Command::Check(args) => do_site(&args.input, args.config.as_deref(), None, cli.no_color),
        Command::Outline(args) => do_outline(&args, cli.no_color),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(code);
}

/// Explicit `--config`, else `docsite.toml` beside the input, else defaults.
fn load_config(input: &Path, explicit: Option<&Path>) -> Result<SiteConfig, i32> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => site::default_config_path(input),
    };
    match path {
        Some(path) => SiteConfig::load(&path).map_err(|e| {
            eprintln!("error: {}", e);
            1
        }),
        None => Ok(SiteConfig::default()),
    }
}

fn do_site(input: &Path, config: Option<&Path>, out: Option<&Path>, no_color: bool) -> i32 {
    let config = match load_config(input, config) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let mut reporter = Reporter::new(no_color);

    match site::build(input, &config, out, &mut reporter) {
        Ok(report) if report.pages == 0 => {
            eprintln!("no .md or .mdx pages found in {}", input.display());
            1
        }
        Ok(report) if report.ok() => {
            let verb = if out.is_some() { "built" } else { "checked" };
            eprintln!("ok: {} {} page(s)", verb, report.pages);
            0
        }
        Ok(report) => {
            eprintln!(
                "error: {} of {} page(s) failed to compose",
                report.failed, report.pages
            );
            1
        }
        Err(e) => {
            eprintln!("error: cannot write output: {}", e);
            1
        }
    }
}

fn do_outline(args: &OutlineArgs, no_color: bool) -> i32 {
    let config = match load_config(&args.file, args.config.as_deref()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file.display(), e);
            return 1;
        }
    };

    let mut reporter = Reporter::new(no_color);
    let file_id = reporter.add(args.file.display().to_string(), source.clone());

    let document = match docpage::parse(&source, file_id) {
        Ok(document) => document,
        Err(errors) => {
            let diagnostics: Vec<_> = errors.iter().map(|e| e.to_diagnostic()).collect();
            reporter.emit(&diagnostics);
            return 1;
        }
    };

    if args.ast {
        println!("{:#?}", document);
    } else {
        print!("{}", document);
    }

    let outline = Outline::build(&document, config.toc_min_level..=config.toc_max_level);
    if !outline.is_empty() {
        println!();
        println!("contents:");
        for entry in &outline.entries {
            let pad = "  ".repeat(entry.level.saturating_sub(config.toc_min_level) as usize);
            println!("{}{} (#{})", pad, entry.text, entry.anchor);
        }
    }
    0
}
