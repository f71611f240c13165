use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use gix_denylist::cache;
use gix_denylist::config::Options;
use gix_denylist::format::{ExternalFormatter, Formatter, NoopFormatter, Template};
use gix_denylist::history::RepositoryHistory;
use gix_denylist::{policy, Driver, EntryKind, Outcome, Policy, PolicyEngine, RefUpdate};
use tracing_subscriber::EnvFilter;

mod options;

enum Verdict {
    Accepted,
    Rejected,
}

fn main() -> ExitCode {
    let args = options::Args::parse();
    init_tracing(args.verbose);
    match run(args) {
        Ok(Verdict::Accepted) => ExitCode::SUCCESS,
        Ok(Verdict::Rejected) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GIX_DENYLIST_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(args: options::Args) -> anyhow::Result<Verdict> {
    let git_dir = args.git_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut options =
        Options::load(&git_dir).with_context(|| format!("reading configuration of '{}'", git_dir.display()))?;
    if let Some(path) = args.denylist {
        options.policy_file = path;
    }
    if let Some(path) = args.cache {
        options.cache_file = Some(path);
    }
    if let Some(path) = args.template {
        options.template = Some(path);
    }
    if let Some(program) = args.formatter {
        options.formatter = Some(program);
    }

    if args.check_policy {
        let (freshness, audited, skipped) = cache::audit(&options.policy_file, &options.cache_file())?;
        tracing::debug!(?freshness, policy = %options.policy_file.display(), "policy audited");
        policy::report(&skipped);
        print_summary(&audited);
        return Ok(Verdict::Accepted);
    }

    let engine = PolicyEngine::open(&options.policy_file, options.cache_file())?;
    tracing::debug!(freshness = ?engine.freshness(), policy = %options.policy_file.display(), "policy loaded");

    let updates = if args.pre_receive {
        read_updates(std::io::stdin().lock())?
    } else {
        match (args.reference, args.old, args.new) {
            (Some(reference), Some(old), Some(new)) => vec![RefUpdate::new(reference, old, new)],
            _ => anyhow::bail!("expected <REF> <OLD> <NEW>"),
        }
    };

    let template = Template::load(options.template.as_deref());
    let mut formatter: Box<dyn Formatter> = match options.formatter {
        Some(program) => Box::new(ExternalFormatter::new(program)),
        None => Box::new(NoopFormatter::new()),
    };
    let mut history = RepositoryHistory::new(git_dir);
    let mut driver = Driver::new(&engine, &mut history);

    for update in &updates {
        match driver.evaluate(update)? {
            Outcome::Accept => tracing::debug!(reference = %update.name, "accepted"),
            Outcome::Reject(rejection) => {
                eprintln!("{}", rejection.message(&template, formatter.as_mut()));
                return Ok(Verdict::Rejected);
            }
        }
    }
    Ok(Verdict::Accepted)
}

fn read_updates(input: impl BufRead) -> anyhow::Result<Vec<RefUpdate>> {
    let mut updates = Vec::new();
    for line in input.lines() {
        let line = line.context("reading ref updates from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        updates.push(RefUpdate::from_pre_receive_line(&line)?);
    }
    Ok(updates)
}

fn print_summary(policy: &Policy) {
    let entries = policy.entries();
    let count = |kind: EntryKind| entries.iter().filter(|entry| entry.kind() == kind).count();
    println!("ref: {}", count(EntryKind::RefAll));
    println!("ref:commit: {}", count(EntryKind::RefSha));
    println!("commit: {}", count(EntryKind::ShaAll));
}
