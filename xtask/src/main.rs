use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for rdpx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format check, clippy, build and the full test suite
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy with warnings denied
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the library and the replay binary
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests, optionally limited to some modules
    Test {
        /// Doc tests only
        #[arg(long)]
        doc: bool,
        /// Pipeline, command and rasterizer unit tests
        #[arg(long)]
        rdp: bool,
        /// RDRAM and hidden-bit tests
        #[arg(long)]
        memory: bool,
        /// Trace format tests
        #[arg(long)]
        trace: bool,
        /// Worker pool tests
        #[arg(long)]
        parallel: bool,
    },
    /// Run the criterion benches
    Bench {
        /// Only groups whose name contains this (e.g. fill_rectangle)
        group: Option<String>,
    },
    /// Replay a recorded command trace through the rdpx binary
    Replay {
        trace: String,
        #[arg(short = 'w', long)]
        workers: Option<u32>,
        /// Write the JSON report here
        #[arg(short = 's', long)]
        summary: Option<String>,
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            rdp,
            memory,
            trace,
            parallel,
        } => {
            let modules: Vec<&str> = [
                (rdp, "core::rdp"),
                (memory, "core::memory"),
                (trace, "core::trace"),
                (parallel, "core::parallel"),
            ]
            .into_iter()
            .filter_map(|(on, path)| on.then_some(path))
            .collect();
            run_test(doc, &modules)
        }
        Commands::Bench { group } => run_bench(group.as_deref()),
        Commands::Replay {
            trace,
            workers,
            summary,
            release,
        } => run_replay(&trace, workers, summary.as_deref(), release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== rdpx CI ===".bold().blue());
    let start = Instant::now();

    let tasks: [(&str, fn() -> Result<()>); 4] = [
        ("Format check", || run_fmt(true)),
        ("Clippy", || run_clippy(false)),
        ("Build", || run_build(false)),
        ("Test", || run_test(false, &[])),
    ];
    for (name, task) in tasks {
        run_task(name, task, verbose)?;
    }

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");
    if check {
        cmd.args(["--", "--check"]);
    }
    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo("clippy");
    cmd.args(["--workspace", "--all-targets"]);
    if fix {
        cmd.arg("--fix");
    } else {
        cmd.args(["--", "-D", "warnings"]);
    }
    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = cargo("build");
    cmd.args(["--lib", "--bin", "rdpx"]);
    if release {
        cmd.arg("--release");
    }
    execute_command(&mut cmd)
}

/// Whole suite when `modules` is empty, otherwise each module's lib tests
fn run_test(doc: bool, modules: &[&str]) -> Result<()> {
    if doc {
        return execute_command(cargo("test").arg("--doc"));
    }
    if modules.is_empty() {
        return execute_command(&mut cargo("test"));
    }

    let mut failed = Vec::new();
    for &module in modules {
        println!("{} {} tests", "→".blue(), module.bold());
        if execute_command(cargo("test").args(["--lib", module])).is_err() {
            println!("{} {} failed\n", "✗".red(), module);
            failed.push(module);
        }
    }

    if !failed.is_empty() {
        bail!("Tests failed in {}", failed.join(", "));
    }
    Ok(())
}

fn run_bench(group: Option<&str>) -> Result<()> {
    let mut cmd = cargo("bench");
    cmd.args(["--bench", "rdp_bench"]);
    if let Some(group) = group {
        cmd.args(["--", group]);
    }
    execute_command(&mut cmd)
}

fn run_replay(trace: &str, workers: Option<u32>, summary: Option<&str>, release: bool) -> Result<()> {
    if !Path::new(trace).exists() {
        println!("{} No trace at {}", "✗".red().bold(), trace.yellow());
        println!(
            "{} Record one with RDPX_TRACE_RECORD=1 or dp.trace_record = true",
            "ℹ".blue()
        );
        bail!("Trace file not found");
    }

    let workers_label = workers.map_or_else(|| "from config".to_string(), |n| n.to_string());
    println!(
        "{} Replaying {} on {} workers ({})",
        "→".blue(),
        trace.cyan(),
        workers_label.bold(),
        if release { "release" } else { "debug" }
    );

    let start = Instant::now();
    let mut cmd = cargo("run");
    cmd.args(["--bin", "rdpx"]);
    if release {
        cmd.arg("--release");
    }
    cmd.args(["--", trace]);
    if let Some(n) = workers {
        cmd.arg("--workers").arg(n.to_string());
    }
    if let Some(path) = summary {
        cmd.arg("--summary").arg(path);
    }
    execute_command(&mut cmd)?;

    println!(
        "{} Replay finished in {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_task(name: &str, task: fn() -> Result<()>, verbose: bool) -> Result<()> {
    print!("{} {} ... ", "→".blue(), name);
    let start = Instant::now();

    if let Err(e) = task() {
        println!("{}", "✗".red().bold());
        return Err(e);
    }

    if verbose {
        println!("{} ({:.2}s)", "✓".green().bold(), start.elapsed().as_secs_f64());
    } else {
        println!("{}", "✓".green().bold());
    }
    Ok(())
}

fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    cmd
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        bail!("Command failed with exit code: {}", status);
    }
    Ok(())
}
