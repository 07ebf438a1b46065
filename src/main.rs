use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use callbind_core::cli::Args;
use callbind_core::loader::{collect_unit_paths, TranslationUnit};
use callbind_core::logging::{self, Verbosity};
use callbind_core::report::{CallReport, ReportFormatter, UnitReport};
use callbind_core::{CallSite, Session};

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate().context("Invalid arguments")?;
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));

    let paths = collect_unit_paths(&args.path)
        .with_context(|| format!("Cannot collect unit documents under {}", args.path.display()))?;
    if paths.is_empty() {
        anyhow::bail!("No unit documents found under {}", args.path.display());
    }
    info!(units = paths.len(), "resolving unit documents");

    let mut reports = Vec::with_capacity(paths.len());
    for path in &paths {
        let report = process_unit(path);
        if args.fail_fast && report.has_failures() {
            let detail = report
                .error
                .clone()
                .or_else(|| report.calls.iter().find_map(|c| c.error.clone()))
                .unwrap_or_else(|| "resolution failed".to_string());
            anyhow::bail!("{}: {}", report.file, detail);
        }
        reports.push(report);
    }

    let formatted = ReportFormatter::format(reports, args.format)?;
    match &args.output_file {
        Some(path) => {
            fs::write(path, &formatted)
                .with_context(|| format!("Cannot write output file: {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{formatted}"),
    }

    Ok(())
}

/// Runs one unit document end to end. Failures become report entries rather
/// than aborting the batch; the engine itself stays strict.
fn process_unit(path: &Path) -> UnitReport {
    let unit = match TranslationUnit::from_path(path) {
        Ok(unit) => unit,
        Err(err) => return UnitReport::failed(path.display().to_string(), err.to_string()),
    };
    let label = if unit.file.is_empty() {
        path.display().to_string()
    } else {
        unit.file.clone()
    };

    let mut session = match unit.build_session() {
        Ok(session) => session,
        Err(err) => return UnitReport::failed(label, err.to_string()),
    };

    let mut calls = Vec::new();

    // Observed instantiations first: unit-level calls may name the classes
    // they synthesize. Member calls of every class a request materialized
    // (transitively, bases and nested arguments included) are resolved right
    // after the request.
    for request in &unit.instantiations {
        let known = session.graph().len();
        match session.instantiate(&request.template, &request.args) {
            Ok(_) => {
                let created: Vec<_> = session.graph().node_ids().skip(known).collect();
                for id in created {
                    for (context, site) in session.node_call_sites(id) {
                        calls.push(resolve_site(&session, context, &site));
                    }
                }
            }
            Err(err) => {
                warn!(request = %request.display(), error = %err, "instantiation failed");
                calls.push(CallReport::instantiation_failed(
                    &label,
                    &request.template,
                    request.display(),
                    err.to_string(),
                ));
            }
        }
    }

    for site in &unit.calls {
        calls.push(resolve_site(&session, label.clone(), site));
    }

    UnitReport::new(label, session.graph().len(), calls)
}

fn resolve_site(session: &Session, context: impl Into<String>, site: &CallSite) -> CallReport {
    match session.resolve(site) {
        Ok(resolution) => CallReport::resolved(context, site, resolution),
        Err(err) => CallReport::failed(context, site, err.to_string()),
    }
}
