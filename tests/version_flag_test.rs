use std::process::Command;

fn version_output() -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_cloudeck"))
        .arg("--version")
        .output()
        .expect("Failed to execute binary");
    assert!(output.status.success(), "Version flag should exit with code 0");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_version_flag() {
    let stdout = version_output();
    assert!(
        stdout.starts_with("cloudeck "),
        "Version output should start with 'cloudeck '"
    );

    let version_part = stdout.trim().strip_prefix("cloudeck ").unwrap_or("");
    assert!(
        version_part.chars().any(|c| c.is_ascii_digit()),
        "Version should contain digits"
    );
}

#[test]
fn test_version_matches_cargo_toml() {
    let stdout = version_output();
    let version = stdout.trim().strip_prefix("cloudeck ").unwrap_or("");
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}
