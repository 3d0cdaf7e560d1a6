use std::process::{Command, Output};

/// Runs the binary in an empty directory with no user config and no `THOUGHTREE_*`
/// overrides besides `env`.
fn run_thoughtree(args: &[&str], env: &[(&str, &str)]) -> Output {
    let cwd = tempfile::tempdir().unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_thoughtree"));
    cmd.args(args)
        .current_dir(cwd.path())
        .env("XDG_CONFIG_HOME", cwd.path())
        .env_remove("LOG_FILE");
    for (key, _) in std::env::vars() {
        if key.starts_with("THOUGHTREE_") {
            cmd.env_remove(key);
        }
    }
    for (k, v) in env {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to run thoughtree binary")
}

#[test]
fn help_lists_search_options() {
    let out = run_thoughtree(&["--help"], &[]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for flag in ["--strategy", "--language", "--backtrack", "--model", "--json"] {
        assert!(stdout.contains(flag), "missing {} in help", flag);
    }
}

#[test]
fn missing_problem_is_usage_error() {
    let out = run_thoughtree(&[], &[]);
    assert!(!out.status.success());
}

#[test]
fn unknown_strategy_is_rejected() {
    let out = run_thoughtree(&["--strategy", "beam", "solve", "it"], &[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown strategy"), "{}", stderr);
}

#[test]
fn zero_branching_fails_before_any_call() {
    let out = run_thoughtree(&["-c", "0", "solve", "it"], &[]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("branching factor"), "{}", stderr);
}

#[test]
fn malformed_env_override_fails() {
    let out = run_thoughtree(&["solve", "it"], &[("THOUGHTREE_K", "many")]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("THOUGHTREE_K"), "{}", stderr);
}

#[test]
fn unreachable_endpoint_exits_one() {
    let out = run_thoughtree(
        &["-k", "1", "solve", "it"],
        &[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:9/v1"),
            ("THOUGHTREE_MAX_RETRIES", "0"),
            ("THOUGHTREE_ORACLE_TIMEOUT_SECS", "5"),
            ("RUST_LOG", "off"),
        ],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).trim().is_empty());
}
