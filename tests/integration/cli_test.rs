use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PUBLISHABLE_KEY: &str = "pk_test_Y2xlcmsuZXhhbXBsZS5jb20k";

const SCRUBBED_VARS: &[&str] = &[
    "PARLOR__BACKEND__ENDPOINT",
    "PARLOR__BACKEND__PROJECT_ID",
    "PARLOR__BACKEND__DATABASE_ID",
    "PARLOR__BACKEND__MESSAGES_COLLECTION_ID",
    "PARLOR__BACKEND__CHATROOMS_COLLECTION_ID",
    "PARLOR__BACKEND__BUCKET_ID",
    "PARLOR__IDENTITY__PUBLISHABLE_KEY",
    "PARLOR__ASSISTANT__API_KEY",
    "EXPO_PUBLIC_APPWRITE_ENDPOINT",
    "EXPO_PUBLIC_APPWRITE_PROJECT_ID",
    "EXPO_PUBLIC_APPWRITE_DATABASE_ID",
    "EXPO_PUBLIC_APPWRITE_BUCKET_ID",
    "EXPO_PUBLIC_CLERK_PUBLISHABLE_KEY",
    "EXPO_PUBLIC_GEMINI_API_KEY",
    "GEMINI_API_KEY",
    "PARLOR_LOG_LEVEL",
    "RUST_LOG",
];

/// Runs the binary in an empty home so no real config or session leaks in.
fn run_parlor_in(home: &Path, args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_parlor"));
    cmd.args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"));
    for var in SCRUBBED_VARS {
        cmd.env_remove(var);
    }
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute parlor command")
}

fn run_parlor(args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    run_parlor_in(home.path(), args, &[])
}

fn configured_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("PARLOR__BACKEND__ENDPOINT", "http://127.0.0.1:9/v1"),
        ("PARLOR__BACKEND__PROJECT_ID", "proj"),
        ("PARLOR__BACKEND__DATABASE_ID", "chat"),
        ("PARLOR__BACKEND__MESSAGES_COLLECTION_ID", "messages"),
        ("PARLOR__BACKEND__CHATROOMS_COLLECTION_ID", "chatrooms"),
        ("PARLOR__BACKEND__BUCKET_ID", "media"),
        ("PARLOR__IDENTITY__PUBLISHABLE_KEY", PUBLISHABLE_KEY),
    ]
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_parlor(&["version"]);
        let stdout = stdout_of(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("parlor"));
        assert!(stdout.contains("0.1.0"));
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_parlor(&["version", "--detailed"]);
        let stdout = stdout_of(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
    }
}

mod help_command_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = run_parlor(&["--help"]);
        let stdout = stdout_of(&output);

        assert!(output.status.success());
        for command in ["auth", "rooms", "messages", "watch", "ask", "config"] {
            assert!(stdout.contains(command), "help should mention '{}'", command);
        }
    }

    #[test]
    fn test_messages_help() {
        let output = run_parlor(&["messages", "--help"]);
        let stdout = stdout_of(&output);

        assert!(output.status.success());
        assert!(stdout.contains("send-media"));
        assert!(stdout.contains("delete"));
    }

    #[test]
    fn test_invalid_command() {
        let output = run_parlor(&["teleport"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_send_requires_text() {
        let output = run_parlor(&["messages", "send", "room1"]);
        assert!(!output.status.success());
    }
}

mod config_command_tests {
    use super::*;

    #[test]
    fn test_missing_config_fails_gracefully() {
        let output = run_parlor(&["rooms", "list"]);
        let stderr = stderr_of(&output);

        assert!(!output.status.success());
        assert!(
            stderr.contains("backend.project_id"),
            "should name the missing key: {}",
            stderr
        );
    }

    #[test]
    fn test_config_check_passes_with_env() {
        let home = TempDir::new().unwrap();
        let output = run_parlor_in(home.path(), &["config", "check"], &configured_env());
        let stdout = stdout_of(&output);

        assert!(output.status.success(), "stderr: {}", stderr_of(&output));
        assert!(stdout.contains("Configuration is complete"));
        assert!(stdout.contains("No assistant key"));
    }

    #[test]
    fn test_legacy_env_names_are_honoured() {
        let home = TempDir::new().unwrap();
        let mut env = configured_env();
        env.retain(|(k, _)| *k != "PARLOR__BACKEND__PROJECT_ID");
        env.push(("EXPO_PUBLIC_APPWRITE_PROJECT_ID", "legacy-proj"));

        let output = run_parlor_in(home.path(), &["config", "show", "--format", "json"], &env);
        let stdout = stdout_of(&output);

        assert!(output.status.success(), "stderr: {}", stderr_of(&output));
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["backend"]["project_id"], "legacy-proj");
    }

    #[test]
    fn test_config_show_masks_secrets() {
        let home = TempDir::new().unwrap();
        let mut env = configured_env();
        env.push(("GEMINI_API_KEY", "AIzaSySecretValue123"));

        let output = run_parlor_in(home.path(), &["config", "show", "--format", "json"], &env);
        let stdout = stdout_of(&output);

        assert!(output.status.success());
        assert!(!stdout.contains("AIzaSySecretValue123"));
        assert!(stdout.contains("AIzaSyS"));
    }

    #[test]
    fn test_config_file_in_working_directory() {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join("parlor.toml"),
            r#"
[backend]
project_id = "from-file"
database_id = "chat"
messages_collection_id = "messages"
chatrooms_collection_id = "chatrooms"
bucket_id = "media"

[identity]
publishable_key = "pk_test_Y2xlcmsuZXhhbXBsZS5jb20k"
"#,
        )
        .unwrap();

        let output = run_parlor_in(home.path(), &["config", "check"], &[]);
        assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    }
}

mod auth_command_tests {
    use super::*;

    #[test]
    fn test_passkey_sign_in_is_unavailable() {
        let home = TempDir::new().unwrap();
        let output = run_parlor_in(
            home.path(),
            &["auth", "login", "--strategy", "passkey"],
            &configured_env(),
        );

        assert!(!output.status.success());
        assert!(stderr_of(&output).contains("Passkeys not available"));
    }

    #[test]
    fn test_complete_without_pending_sign_in() {
        let home = TempDir::new().unwrap();
        let output = run_parlor_in(home.path(), &["auth", "complete"], &configured_env());

        assert!(output.status.success());
        assert!(stdout_of(&output).contains("No sign-in in progress"));
    }

    #[test]
    fn test_whoami_when_signed_out() {
        let home = TempDir::new().unwrap();
        let output = run_parlor_in(
            home.path(),
            &["auth", "whoami", "--format", "json"],
            &configured_env(),
        );

        assert!(output.status.success());
        assert_eq!(stdout_of(&output).trim(), "null");
    }

    #[test]
    fn test_sending_requires_sign_in() {
        let home = TempDir::new().unwrap();
        let output = run_parlor_in(
            home.path(),
            &["messages", "send", "room1", "hello"],
            &configured_env(),
        );

        assert!(!output.status.success());
        assert!(stderr_of(&output).contains("E3001"));
    }
}

mod ask_command_tests {
    use super::*;

    #[test]
    fn test_ask_without_key_fails_with_code() {
        let output = run_parlor(&["ask", "what", "time", "is", "it?"]);

        assert!(!output.status.success());
        assert!(stderr_of(&output).contains("E5001"));
    }
}
