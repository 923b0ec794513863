use std::process::Command;

/// Stdout of a command, when it exits successfully and prints anything.
fn probe(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn main() {
    // Short revision, with a dirty marker when the checkout has local
    // edits. Outside a git checkout (a crate tarball build) the probe
    // fails and the variable stays empty; version.rs omits it then.
    let revision = probe("git", &["log", "-1", "--format=%h"])
        .map(|hash| match probe("git", &["status", "--porcelain"]) {
            Some(_) => format!("{hash}-dirty"),
            None => hash,
        })
        .unwrap_or_default();

    let toolchain = probe("rustc", &["--version"]).unwrap_or_default();

    // Build instant as epoch seconds; version.rs renders the date
    let build_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs().to_string())
        .unwrap_or_default();

    println!("cargo:rustc-env=STITCHER_BUILD_REVISION={revision}");
    println!("cargo:rustc-env=STITCHER_TOOLCHAIN={toolchain}");
    println!("cargo:rustc-env=STITCHER_BUILD_EPOCH={build_epoch}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
