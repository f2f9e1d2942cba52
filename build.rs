fn main() {
    // Rerun when git HEAD changes so the CLI version stays current
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let described = std::process::Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output();

    let git = match described {
        Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim().to_string(),
        _ => "unknown".to_string(),
    };

    let version = format!("{} ({})", env!("CARGO_PKG_VERSION"), git);
    println!("cargo:rustc-env=POSTURE_VERSION={}", version);
}
