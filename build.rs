use std::process::Command;

fn main() {
    // Prefer the git version string for display; fall back to the crate version
    // when building from a source archive without git metadata.
    let version = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty=*"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo:rustc-env=GIT_VERSION={version}");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
