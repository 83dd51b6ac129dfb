// Stamp the crate with a build version made of the package version and the
// short git commit, exposed to the code as BUILD_VERSION.

use std::process::Command;

fn short_commit() -> String {
    if let Some(hash) = option_env!("GREETER_COMMIT_HASH") {
        return hash.chars().take(7).collect();
    }

    match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        // Not a git checkout (source tarball, vendored build)
        _ => "unknown".to_string(),
    }
}

fn main() {
    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), short_commit());
    println!("cargo:rerun-if-env-changed=GREETER_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
