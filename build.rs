use std::process::Command;

/// Run git with `args`; `None` if git is missing or the command fails.
fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let describe = git(&["describe", "--tags", "--always", "--dirty"]).unwrap_or_default();
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=LIGHTBOX_GIT_DESCRIBE={describe}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={on_tag}");
}
