//! Output formatting for CLI

use colored::Colorize;

/// Print success message
pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).green());
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).red().bold());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).red());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{}", message);
}

/// Print a wizard section title
pub fn print_title(message: &str) {
    println!();
    println!("{}", message.green().bold());
}

/// Print a side note, e.g. a skipped phase
pub fn print_comment(message: &str) {
    println!("{}", message.yellow());
}

/// Relay one line of driver output
pub fn print_relayed(line: &str) {
    if line.contains("ERROR") {
        println!("{}", line.red());
    } else if line.contains("WARN") {
        println!("{}", line.yellow());
    } else {
        println!("{}", line);
    }
}
