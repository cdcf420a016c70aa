//! Console output helpers
//!
//! Only `fatal` writes to stderr, so `--json` output on stdout stays
//! parseable.

/// Print a passing check with checkmark
pub fn success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print a failing check with X
pub fn error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// Print an error that ends the command
pub fn fatal(msg: &str) {
    eprintln!("  ✗ {}", msg);
}

/// Print a warning or pending check
pub fn warn(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print a dimmed/secondary message
pub fn dim(msg: &str) {
    println!("    {}", msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg);
}
