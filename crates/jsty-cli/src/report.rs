//! Human-readable report rendering.

use colored::Colorize;
use jsty_checker::Analysis;

pub fn print_report(analysis: &Analysis) {
    if !analysis.annotations.is_empty() {
        println!("{}", "Inferred types".bold());
        for annotation in &analysis.annotations {
            let name = annotation.name.as_deref().unwrap_or("<expr>");
            println!(
                "  {}:{}  {} {} {}",
                annotation.line + 1,
                annotation.column + 1,
                name.cyan(),
                ":".dimmed(),
                annotation.type_string.green()
            );
        }
    }

    if analysis.errors.is_empty() {
        println!("{}", "No problems found".green().bold());
        return;
    }

    println!();
    println!("{}", "Problems".bold());
    for diag in &analysis.errors {
        let label = if diag.kind.is_warning() {
            diag.kind.to_string().yellow()
        } else {
            diag.kind.to_string().red()
        };
        println!(
            "  {}:{}  {}  {}",
            diag.line + 1,
            diag.column + 1,
            label,
            diag.message
        );
    }
    let errors = analysis
        .errors
        .iter()
        .filter(|e| !e.kind.is_warning())
        .count();
    let warnings = analysis.errors.len() - errors;
    println!();
    println!(
        "{} error(s), {} warning(s)",
        errors.to_string().red(),
        warnings.to_string().yellow()
    );
}
