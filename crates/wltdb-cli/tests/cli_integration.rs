//! CLI Integration Tests
//!
//! These tests drive the `wltdb` binary end to end. Every test runs against
//! its own temporary configuration file, database, and log directories.
//!
//! ```
//! cargo test --package wltdb-cli --test cli_integration
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SENSOR1_LOG: &str = "\"H1\",\"export\"\r\n\
                           \"H3\",x,x,x,\"SENSOR1\"\r\n\
                           \"SD\",\"2024-01-01 08:00:00\",\"21.5\",x\r\n\
                           \"SD\",\"2024-01-01 09:00:00\",\"22\",x\r\n";

const SENSOR2_LOG: &str = "\"H3\",x,x,x,\"SENSOR2\"\n\
                           \"SD\",\"2024-01-01 08:00:00\",\"4.25\",x\n\
                           \"SD\",\"2024-01-02 23:59:59\",\"3.5\",x\n\
                           \"SD\",\"2024-01-03 00:00:00\",\"3\",x\n";

/// Isolated working area for one test.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        };
        let config = format!(
            "log_directory = {:?}\nbackup_directory = {:?}\nreport_directory = {:?}\n\n[report]\nline_ending = \"lf\"\n",
            sandbox.path("logs"),
            sandbox.path("logs/backup"),
            sandbox.path("reports"),
        );
        fs::create_dir_all(sandbox.path("logs")).unwrap();
        fs::write(sandbox.config_path(), config).unwrap();
        sandbox
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn config_path(&self) -> PathBuf {
        self.path("config.toml")
    }

    fn write_log(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path("logs").join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Run wltdb with this sandbox's config and database
    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_wltdb"))
            .arg("--config")
            .arg(self.config_path())
            .arg("--db")
            .arg(self.path("data/wltdb.db3"))
            .args(args)
            .env_remove("WLTDB_CONFIG")
            .env_remove("WLTDB_DB")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run wltdb binary")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "wltdb {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_wltdb"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["ingest", "devices", "report", "alias", "config", "info"] {
        assert!(stdout.contains(cmd), "Help should list {}", cmd);
    }
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_wltdb"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("wltdb"));
}

#[test]
fn test_invalid_subcommand() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.run(&["notacommand"]).status.success());
}

#[test]
fn test_completions() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.run_ok(&["completions", "bash"]);
    assert!(stdout.contains("wltdb"));
}

// =============================================================================
// End-to-end: ingest -> devices -> report
// =============================================================================

#[test]
fn test_ingest_devices_report_scenario() {
    let sandbox = Sandbox::new();
    let log = sandbox.write_log("0001.log", SENSOR1_LOG);

    sandbox.run_ok(&["ingest", arg(&log)]);

    let devices = sandbox.run_ok(&["devices", "--format", "json"]);
    let devices: serde_json::Value = serde_json::from_str(&devices).unwrap();
    assert_eq!(devices[0]["device_id"], "SENSOR1");
    assert!(devices[0]["alias"].is_null());

    sandbox.run_ok(&["alias", "add", "SENSOR1"]);
    sandbox.run_ok(&["alias", "set", "SENSOR1", "Living Room"]);

    let report = sandbox.path("out.csv");
    sandbox.run_ok(&[
        "report",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-01",
        "--output",
        arg(&report),
    ]);

    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "\"LogDate\",\"Living Room\"\n\
         \"2024-01-01 08:00:00\",21.5\n\
         \"2024-01-01 09:00:00\",22\n"
    );
}

#[test]
fn test_ingest_is_idempotent() {
    let sandbox = Sandbox::new();
    let log = sandbox.write_log("0001.log", SENSOR1_LOG);

    sandbox.run_ok(&["ingest", arg(&log)]);
    sandbox.run_ok(&["ingest", arg(&log)]);

    let info = sandbox.run_ok(&["info", "--format", "json"]);
    let info: serde_json::Value = serde_json::from_str(&info).unwrap();
    assert_eq!(info["stats"]["readings"], 2);
    assert_eq!(info["stats"]["devices"], 1);
}

#[test]
fn test_ingest_defaults_to_log_directory_and_backs_up() {
    let sandbox = Sandbox::new();
    let first = sandbox.write_log("0001.log", SENSOR1_LOG);
    let second = sandbox.write_log("0002.LOG", SENSOR2_LOG);
    sandbox.write_log("readme.txt", "not a log");

    let stdout = sandbox.run_ok(&["ingest", "--backup", "--format", "json"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(result["files"].as_array().unwrap().len(), 2);
    assert_eq!(result["total_readings"], 5);
    assert!(!first.exists());
    assert!(!second.exists());
    assert!(sandbox.path("logs/backup/0001.log").exists());
    assert!(sandbox.path("logs/backup/0002.LOG").exists());
    assert!(sandbox.path("logs/readme.txt").exists());
}

#[test]
fn test_ingest_failure_is_isolated_and_reported() {
    let sandbox = Sandbox::new();
    let good = sandbox.write_log("0001.log", SENSOR1_LOG);
    let missing = sandbox.path("logs/missing.log");

    let output = sandbox.run(&["ingest", arg(&missing), arg(&good)]);
    assert!(!output.status.success(), "A failed file should fail the run");

    let info = sandbox.run_ok(&["info", "--format", "json"]);
    let info: serde_json::Value = serde_json::from_str(&info).unwrap();
    assert_eq!(info["stats"]["readings"], 2);
}

#[test]
fn test_devices_new_lists_unaliased() {
    let sandbox = Sandbox::new();
    sandbox.write_log("0001.log", SENSOR1_LOG);
    sandbox.write_log("0002.log", SENSOR2_LOG);
    sandbox.run_ok(&["ingest"]);
    sandbox.run_ok(&["alias", "add", "SENSOR2"]);

    let stdout = sandbox.run_ok(&["devices", "--new", "--format", "json"]);
    let devices: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<_> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["device_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["SENSOR1"]);
}

#[test]
fn test_report_column_order_gaps_and_boundaries() {
    let sandbox = Sandbox::new();
    sandbox.write_log("0001.log", SENSOR1_LOG);
    sandbox.write_log("0002.log", SENSOR2_LOG);
    sandbox.run_ok(&["ingest"]);
    sandbox.run_ok(&["alias", "add", "SENSOR2", "SENSOR1"]);
    sandbox.run_ok(&["alias", "set", "SENSOR2", "Garage"]);

    sandbox.run_ok(&["report", "--from", "2024-01-01", "--to", "2024-01-02"]);

    let report = fs::read_to_string(sandbox.path("reports/Temperature.csv")).unwrap();
    assert_eq!(
        report,
        "\"LogDate\",\"Garage\",\"SENSOR1\"\n\
         \"2024-01-01 08:00:00\",4.25,21.5\n\
         \"2024-01-01 09:00:00\",,22\n\
         \"2024-01-02 23:59:59\",3.5,\n"
    );
}

#[test]
fn test_report_shift_jis_alias() {
    let sandbox = Sandbox::new();
    let log = sandbox.write_log("0001.log", SENSOR1_LOG);
    sandbox.run_ok(&["ingest", arg(&log)]);
    sandbox.run_ok(&["alias", "add", "SENSOR1"]);
    sandbox.run_ok(&["alias", "set", "SENSOR1", "居間"]);

    let report = sandbox.path("sjis.csv");
    sandbox.run_ok(&[
        "report",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-01",
        "--encoding",
        "shift_jis",
        "--output",
        arg(&report),
    ]);

    let bytes = fs::read(&report).unwrap();
    assert!(String::from_utf8(bytes.clone()).is_err(), "Output should not be UTF-8");
    // 居間 in Shift_JIS
    let alias = [0x8b, 0x8f, 0x8a, 0xd4];
    assert!(bytes.windows(alias.len()).any(|w| w == alias));
}

#[test]
fn test_report_remembers_explicit_day_range() {
    let sandbox = Sandbox::new();
    sandbox.run_ok(&["alias", "add", "SENSOR1"]);

    sandbox.run_ok(&["report", "--from", "2024-01-01", "--to", "2024-01-08"]);

    let config = fs::read_to_string(sandbox.config_path()).unwrap();
    assert!(config.contains("report_day_range = 7"), "{}", config);
    assert!(config.contains("device_id = \"SENSOR1\""), "{}", config);
}

#[test]
fn test_report_refuses_utf16_output() {
    let sandbox = Sandbox::new();
    let report = sandbox.path("utf16.csv");
    let output = sandbox.run(&[
        "report",
        "--to",
        "2024-01-01",
        "--encoding",
        "utf-16le",
        "--output",
        arg(&report),
    ]);
    assert!(!output.status.success());
    assert!(!report.exists());
}

#[test]
fn test_ingest_utf16_logs() {
    let sandbox = Sandbox::new();
    let mut config = fs::read_to_string(sandbox.config_path()).unwrap();
    config.push_str("\n[ingest]\nlog_encoding = \"utf-16le\"\n");
    fs::write(sandbox.config_path(), config).unwrap();

    let bytes: Vec<u8> = SENSOR1_LOG
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();
    fs::write(sandbox.path("logs/0001.log"), bytes).unwrap();

    let stdout = sandbox.run_ok(&["ingest", "--format", "json"]);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["total_readings"], 2);
}

#[test]
fn test_report_inverted_window_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["report", "--from", "2024-01-05", "--to", "2024-01-01"]);
    assert!(!output.status.success());
}

#[test]
fn test_report_unwritable_destination_fails() {
    let sandbox = Sandbox::new();
    let report = sandbox.path("no-such-dir/out.csv");
    let output = sandbox.run(&["report", "--to", "2024-01-01", "--output", arg(&report)]);
    assert!(!output.status.success());
    assert!(!report.exists());
}

// =============================================================================
// Alias and Config Commands
// =============================================================================

#[test]
fn test_alias_list_empty_and_ordered() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.run_ok(&["alias", "list", "--format", "json"]);
    assert_eq!(stdout.trim(), "[]");

    sandbox.run_ok(&["alias", "add", "A", "B", "C"]);
    sandbox.run_ok(&["alias", "down", "A"]);
    sandbox.run_ok(&["alias", "remove", "C"]);

    let stdout = sandbox.run_ok(&["alias", "list", "--format", "json"]);
    let aliases: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(aliases[0]["device_id"], "B");
    assert_eq!(aliases[1]["device_id"], "A");
    assert_eq!(aliases.as_array().unwrap().len(), 2);
}

#[test]
fn test_alias_remove_unknown_fails() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.run(&["alias", "remove", "NOPE"]).status.success());
}

#[test]
fn test_config_path_and_show() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.run_ok(&["config", "path"]);
    assert_eq!(stdout.trim(), arg(&sandbox.config_path()));

    let stdout = sandbox.run_ok(&["config", "show"]);
    assert!(stdout.contains("report_filename = \"Temperature.csv\""));
    assert!(stdout.contains("line_ending = \"lf\""));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.run(&["config", "init"]).status.success());
}
