use anyhow::{Context, Result};
use ast_rewriter::{
    apply, apply_all, config, ApplyMode, ChangeCollector, FileStatus, MatchEngine, RootGuard,
    RunReport, SourceModel, SyntaxChecker,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ast-rewriter")]
#[command(about = "Structural source rewriting engine for Rust", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match rules against source files and rewrite them in place
    Apply {
        /// Files or directories to rewrite (directories are walked for .rs files)
        paths: Vec<PathBuf>,

        /// Rule configuration file
        #[arg(short, long)]
        rules: PathBuf,

        /// Rewrite root; files outside it are refused (defaults to cwd)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Dry run - compute and report outcomes without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Emit the run report as JSON
        #[arg(long)]
        json: bool,

        /// Re-parse rewritten files and warn on introduced syntax errors
        #[arg(long)]
        verify: bool,
    },

    /// Dry-run apply with a diff: show what would change
    Check {
        /// Files or directories to check
        paths: Vec<PathBuf>,

        /// Rule configuration file
        #[arg(short, long)]
        rules: PathBuf,

        /// Rewrite root (defaults to cwd)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Emit the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the rules a configuration file declares
    List {
        /// Rule configuration file
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            paths,
            rules,
            root,
            dry_run,
            diff,
            json,
            verify,
        } => cmd_apply(paths, rules, root, dry_run, diff, json, verify),

        Commands::Check {
            paths,
            rules,
            root,
            json,
        } => cmd_apply(paths, rules, root, true, true, json, false),

        Commands::List { rules } => cmd_list(rules),
    }
}

/// Expand file and directory arguments into the input file set.
///
/// Directories are walked recursively for `.rs` files; `target` and
/// hidden directories are pruned.
fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && (name == "target" || name.starts_with('.')))
        }) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("rs")
            {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();

    if files.is_empty() {
        anyhow::bail!("no input files resolvable from the given paths");
    }

    Ok(files)
}

fn cmd_apply(
    paths: Vec<PathBuf>,
    rules_path: PathBuf,
    root: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    json: bool,
    verify: bool,
) -> Result<()> {
    let rule_set = config::load_from_path(&rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;
    let rules = rule_set.build();

    let root = match root {
        Some(r) => r,
        None => env::current_dir()?,
    };
    let guard = RootGuard::new(&root)
        .with_context(|| format!("resolving rewrite root {}", root.display()))?;

    let candidates = collect_input_files(&paths)?;
    let mut input_files = Vec::new();
    for file in candidates {
        match guard.validate_path(&file) {
            Ok(canonical) => input_files.push(canonical),
            Err(e) => eprintln!("{}", format!("skipping {}: {e}", file.display()).yellow()),
        }
    }
    if input_files.is_empty() {
        anyhow::bail!("no input files inside the rewrite root");
    }

    // Phase 1: match everything before writing anything.
    let mut engine = MatchEngine::new(&rules);
    let mut collector = ChangeCollector::new();
    let mut unreadable: Vec<(PathBuf, String)> = Vec::new();

    for file in &input_files {
        match SourceModel::from_path(file) {
            Ok(model) => collector.extend(engine.run(&model)),
            Err(e) => unreadable.push((file.clone(), e.to_string())),
        }
    }

    // Capture before-texts and previews while originals are still on disk.
    let mut previews: HashMap<PathBuf, (String, String)> = HashMap::new();
    if show_diff || verify {
        for file in collector.files_touched() {
            let Ok(original) = fs::read_to_string(&file) else {
                continue;
            };
            if let Ok(rewritten) = apply(&original, &collector.changes_for(&file)) {
                previews.insert(file, (original, rewritten));
            }
        }
    }

    // Phase 2: apply per file, unordered batch.
    let mode = if dry_run {
        ApplyMode::DryRun
    } else {
        ApplyMode::Write
    };
    let mut outcomes = apply_all(&collector, mode);
    for (file, reason) in unreadable {
        outcomes.push(ast_rewriter::FileOutcome::IoFailed { file, reason });
    }

    let report = RunReport::build(input_files, outcomes, engine.stats());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, dry_run);
        if show_diff {
            for file in &report.files {
                if file.status == FileStatus::Applied && file.edits > 0 {
                    if let Some((before, after)) = previews.get(&file.file) {
                        display_diff(&file.file, before, after);
                    }
                }
            }
        }
    }

    if verify && !dry_run {
        verify_rewrites(&report, &previews)?;
    }

    let failed = report
        .files
        .iter()
        .filter(|f| f.status != FileStatus::Applied)
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} file(s) not rewritten");
    }

    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    if dry_run {
        println!("{}", "[dry run - no files written]".cyan());
    }

    for file in &report.files {
        match file.status {
            FileStatus::Applied if file.edits > 0 => {
                let verb = if dry_run { "would apply" } else { "applied" };
                println!(
                    "{} {verb} {} edit(s) to {}",
                    "✓".green(),
                    file.edits,
                    file.file.display()
                );
            }
            FileStatus::Applied => {
                println!("{} {} unchanged", "⊙".dimmed(), file.file.display());
            }
            FileStatus::Conflicted => {
                eprintln!(
                    "{} conflict in {}: {}",
                    "✗".red(),
                    file.file.display(),
                    file.reason.as_deref().unwrap_or("unknown")
                );
            }
            FileStatus::IoFailed => {
                eprintln!(
                    "{} i/o failure on {}: {}",
                    "✗".red(),
                    file.file.display(),
                    file.reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    println!(
        "\n{} matches: {} rewritten, {} skipped (no safe form), {} edits",
        report.matches_found, report.matches_rewritten, report.matches_skipped, report.edits_emitted
    );
}

/// Re-parse rewritten files and warn when a rewrite introduced syntax
/// errors. Warnings only; content is never modified after apply.
fn verify_rewrites(
    report: &RunReport,
    previews: &HashMap<PathBuf, (String, String)>,
) -> Result<()> {
    let mut checker = SyntaxChecker::new().context("initializing syntax checker")?;

    for file in &report.files {
        if file.status != FileStatus::Applied || file.edits == 0 {
            continue;
        }
        let Some((before, _)) = previews.get(&file.file) else {
            continue;
        };
        let Ok(after) = fs::read_to_string(&file.file) else {
            continue;
        };
        let introduced = checker
            .introduced_errors(before, &after)
            .unwrap_or_default();
        if !introduced.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "warning: rewrite of {} introduced {} syntax error(s), first at line {}",
                    file.file.display(),
                    introduced.len(),
                    introduced[0].line + 1
                )
                .yellow()
            );
        }
    }

    Ok(())
}

/// Show unified diff between original and rewritten content.
fn display_diff(file: &Path, original: &str, rewritten: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, rewritten);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
    }
}

fn cmd_list(rules_path: PathBuf) -> Result<()> {
    let rule_set = config::load_from_path(&rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;

    println!("Rules in {}:", rules_path.display());
    for spec in &rule_set.rule {
        match spec {
            config::RuleSpec::DerefArg {
                callee,
                arg,
                insert_use,
            } => {
                println!("  {} callee={callee} arg={arg}", "deref_arg".bold());
                for path in insert_use {
                    println!("    + use {path};");
                }
            }
            config::RuleSpec::RenameCall {
                from,
                to,
                insert_use,
            } => {
                println!("  {} {from} -> {to}", "rename_call".bold());
                for path in insert_use {
                    println!("    + use {path};");
                }
            }
        }
    }

    Ok(())
}
