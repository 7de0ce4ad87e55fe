//! Output formatting for check results.

use anyhow::Result;
use arch_gate_core::CheckResult;

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(result: &CheckResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &CheckResult) {
    for warning in &result.deepscan_warnings {
        print!("\x1b[33m{}\x1b[0m", warning.format());
        if !warning.dependency.source_code_preview.is_empty() {
            println!();
            print!("{}", warning.dependency.source_code_preview);
        }
        println!();
    }

    let by_component = result.count_by_component();
    if !by_component.is_empty() {
        let parts: Vec<String> = by_component
            .iter()
            .map(|(name, count)| format!("{name}: {count}"))
            .collect();
        println!("By component: {}", parts.join(", "));
    }

    let summary_color = if result.has_warnings() {
        "\x1b[31m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} deepscan warning(s) in {} component(s), {} package(s) scanned\x1b[0m",
        summary_color,
        result.deepscan_warnings.len(),
        result.components_checked,
        result.packages_scanned
    );
}

fn print_json(result: &CheckResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &CheckResult) {
    for warning in &result.deepscan_warnings {
        println!("{warning}");
    }
}
