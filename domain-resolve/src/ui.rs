//! Text-mode display logic for the domain-resolve CLI.
//!
//! Handles all non-JSON output: colored per-record lines, field detail
//! blocks, headers, and the end-of-run summary. Uses only the `console`
//! crate.

use console::{pad_str, style, Alignment};
use domain_resolve_lib::CanonicalRecord;

const TARGET_WIDTH: usize = 30;

/// Print a styled header at the start of a multi-target run.
pub fn print_header(target_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("domain-resolve").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Resolving {} target{}",
            target_count,
            if target_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    println!();
}

/// Format and print one record with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]`
/// is shown.
pub fn print_record(record: &CanonicalRecord, counter: Option<(usize, usize)>) {
    let padded = pad_str(&record.target, TARGET_WIDTH, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    if record.found {
        println!(
            "{}{}  {}",
            prefix,
            style(&padded).white(),
            style("FOUND").green().bold(),
        );
        print_detail(record);
    } else {
        let reason = record.error.as_deref().unwrap_or("unknown");
        println!(
            "{}{}  {}  {}",
            prefix,
            style(&padded).white(),
            style(format!("NOT FOUND ({})", record.status_code))
                .red()
                .bold(),
            style(reason).dim(),
        );
    }
}

/// The indented field block under a found record.
fn print_detail(record: &CanonicalRecord) {
    if record.registrar.id != 0 || record.registrar.name.is_some() {
        let name = record.registrar.name.as_deref().unwrap_or("(unresolved)");
        let id = if record.registrar.id != 0 {
            format!(" [IANA {}]", record.registrar.id)
        } else {
            String::new()
        };
        println!("    {} {}{}", style("Registrar:").dim(), name, style(id).dim());
    }

    if let Some(reseller) = &record.reseller {
        println!("    {} {}", style("Reseller:").dim(), reseller);
    }

    if !record.status.is_empty() {
        println!("    {} {}", style("Status:").dim(), record.status.join(", "));
    }

    for delta in &record.status_delta {
        let side = match (delta.thin, delta.thick) {
            (true, false) => "registry only",
            (false, true) => "registrar only",
            _ => "both",
        };
        println!(
            "    {} {} ({})",
            style("Status delta:").dim(),
            delta.status,
            style(side).yellow(),
        );
    }

    if !record.nameservers.is_empty() {
        println!(
            "    {} {}",
            style("Nameservers:").dim(),
            record.nameservers.join(", ")
        );
    }

    let format_ts = |label: &str, ts: &Option<chrono::DateTime<chrono::Utc>>| {
        if let Some(ts) = ts {
            println!(
                "    {} {}",
                style(format!("{}:", label)).dim(),
                ts.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    };
    format_ts("Created", &record.ts.created);
    format_ts("Updated", &record.ts.updated);
    format_ts("Expires", &record.ts.expires);

    if let Some(identity) = &record.identity {
        if let Some(range) = &identity.range {
            println!("    {} {}", style("Range:").dim(), range);
        }
        if !identity.cidrs.is_empty() {
            println!("    {} {}", style("CIDRs:").dim(), identity.cidrs.join(", "));
        }
        if let Some(parent) = &identity.parent_handle {
            println!("    {} {}", style("Parent:").dim(), parent);
        }
    }

    if let Some(server) = &record.server {
        println!("    {} {}", style("Server:").dim(), server);
    }
}

/// Print the end-of-run summary line.
pub fn print_summary(total: usize, failures: usize) {
    println!();
    let resolved = total - failures;
    if failures == 0 {
        println!(
            "{} {}",
            style("Summary:").bold(),
            style(format!("{}/{} resolved", resolved, total)).green(),
        );
    } else {
        println!(
            "{} {} {}",
            style("Summary:").bold(),
            style(format!("{}/{} resolved,", resolved, total)).green(),
            style(format!("{} failed", failures)).red(),
        );
    }
}
