use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use lp_codemod::{FileOutcome, MigrateConfig, PassKind, PassReport, run_pass};
use similar::TextDiff;

#[derive(Parser)]
#[command(name = "lp-codemod")]
#[command(about = "Migrate lp-script sources from AstPool handles to owned LpBox nodes", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace ExprId/StmtId handles and Box with owned LpBox nodes
    OwnedAst(RunArgs),

    /// Rewrite *_gen.rs and *_types.rs signatures to take &Expr/&Stmt
    GenSignatures(RunArgs),

    /// Remove AstPool and handle types from import lists
    ImportCleanup(RunArgs),

    /// Run owned-ast, gen-signatures and import-cleanup in order
    All(RunArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Source tree to migrate
    #[arg(
        long,
        value_name = "PATH",
        default_value = "crates/lp-script/src",
        value_hint = clap::ValueHint::DirPath
    )]
    root: PathBuf,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print a unified diff for every modified file
    #[arg(long)]
    diff: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    let (passes, args) = match cli.command {
        Commands::OwnedAst(args) => (vec![PassKind::OwnedAst], args),
        Commands::GenSignatures(args) => (vec![PassKind::GenSignatures], args),
        Commands::ImportCleanup(args) => (vec![PassKind::ImportCleanup], args),
        Commands::All(args) => (PassKind::SEQUENCE.to_vec(), args),
    };

    let config = MigrateConfig {
        root: args.root.clone(),
        dry_run: args.dry_run,
    };

    let mut total = 0;
    for kind in &passes {
        let pass = kind.build()?;
        eprintln!(
            "Running {} on {}",
            pass.name().bold(),
            config.root.display()
        );
        let report = run_pass(&pass, &config, |outcome| {
            print_outcome(&config.root, &args, outcome)
        })?;
        print_warnings(&config.root, &report);
        total += report.modified_count();
    }

    if args.dry_run {
        eprintln!("\nDry run complete. Would modify {total} files.");
    } else {
        eprintln!("\nCodemod complete. Modified {total} files.");
    }

    if passes.contains(&PassKind::OwnedAst) && total > 0 {
        eprintln!("\nNext steps:");
        eprintln!("  1. cargo build -p lp-script (expect many errors)");
        eprintln!("  2. Handle the Result of LpBox::try_new with ? or an explicit error");
        eprintln!("  3. Remove remaining pool parameters and pool return values");
        eprintln!("  4. Fix pattern matches on ExprKind that still expect handles");
    }

    Ok(())
}

fn display_path<'a>(root: &Path, path: &'a Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

fn print_outcome(root: &Path, args: &RunArgs, outcome: &FileOutcome) {
    if !outcome.result.changed {
        log::debug!("Unchanged: {}", outcome.path.display());
        return;
    }

    let verb = if args.dry_run { "Would modify" } else { "Modified" };
    eprintln!(
        "{} {} {}",
        "✓".green(),
        verb,
        display_path(root, &outcome.path).to_string().green().bold()
    );

    if args.diff {
        let rel = display_path(root, &outcome.path);
        let diff = TextDiff::from_lines(outcome.original.as_str(), outcome.result.content.as_str());
        print!(
            "{}",
            diff.unified_diff()
                .context_radius(3)
                .header(&format!("old/{rel}"), &format!("new/{rel}"))
        );
    }
}

fn print_warnings(root: &Path, report: &PassReport) {
    for (path, warning) in &report.warnings {
        eprintln!(
            "{} {}: {warning}",
            "Warning:".yellow(),
            display_path(root, path)
        );
    }
}
