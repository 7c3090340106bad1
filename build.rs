//! Stamps the binary with the build date and commit shown in the startup banner.

use std::path::Path;
use std::process::Command;

/// Trimmed stdout of `program`, or `None` if it could not run, failed or
/// printed nothing
fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let date = stdout_of("date", &["-u", "+%Y-%m-%d"]).unwrap_or_else(|| "unknown".into());
    let commit =
        stdout_of("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=BUILD_DATE={date}");
    println!("cargo:rustc-env=GIT_HASH={commit}");

    println!("cargo:rerun-if-changed=build.rs");
    // Source tarballs have no checkout to watch
    if Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
    }
}
