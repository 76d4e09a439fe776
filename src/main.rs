//! Minimal CLI harness: reads one file, runs the built-in rule catalog
//! against it, and prints a human-readable summary. The real CLI surface
//! (subcommands, config discovery, watch mode, fix application) is left to
//! a wrapping tool rather than built into this crate.

use itertools::Itertools;
use path_clean::PathClean;
use sentry_html::{Config, Sentry, Severity, SourceKind};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("sentry_html=warn"))
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: sentry-html <file>"))?;
    let cleaned: PathBuf = PathBuf::from(&path).clean();
    let source = std::fs::read_to_string(&cleaned)?;

    let kind = match cleaned.extension().and_then(|e| e.to_str()) {
        Some("jsx") | Some("tsx") => SourceKind::Component,
        _ => SourceKind::Html,
    };

    let sentry = Sentry::new(sentry_html::rules::builtin_rules(), Config::default())?;
    let result = sentry.check(&source, kind, &cleaned.to_string_lossy());

    if result.violations.is_empty() {
        println!("\x1b[0;32m✓ no violations in {}\x1b[0m", result.file_path);
        return Ok(());
    }

    for v in &result.violations {
        let marker = match v.severity {
            Severity::Error => "\x1b[0;31merror\x1b[0m",
            Severity::Warning => "\x1b[0;33mwarning\x1b[0m",
            Severity::Info => "\x1b[0;34minfo\x1b[0m",
            Severity::Off => continue,
        };
        println!(
            "{}:{}:{} {} [{}] {}",
            result.file_path, v.line, v.column, marker, v.rule_id, v.message
        );
    }

    let summary = [
        (result.error_count, "error"),
        (result.warning_count, "warning"),
        (result.info_count, "info"),
    ]
    .iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}{}", if *count == 1 { "" } else { "s" }))
    .join(", ");
    println!("{summary}");

    if result.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
