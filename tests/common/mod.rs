//! Shared helpers for the bdmetrics test suites.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Variables that would leak the developer's hub settings into a test.
const HUB_ENV: &[&str] =
    &["BD_URL", "BD_API_TOKEN", "BD_USERNAME", "BD_PASSWORD", "BD_INSECURE", "BD_TIMEOUT", "RUST_LOG"];

/// An isolated working area with its own config file location and home dir.
pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Config file used by every command of this environment.
    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config").join("config.toml")
    }

    pub fn write_config(&self, content: &str) {
        let path = self.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// `bdmetrics` with a clean environment, no spinners and this env's config.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("bdmetrics").expect("bdmetrics binary");
        for key in HUB_ENV {
            cmd.env_remove(key);
        }
        cmd.env("BDMETRICS_CONFIG", self.config_path())
            .env("BDMETRICS_NO_PROGRESS", "1")
            .env("HOME", self.path())
            .current_dir(self.path());
        cmd
    }

    /// Write a zip archive named `name` with `(entry, content)` pairs.
    pub fn write_zip(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.path().join(name);
        write_zip(&path, entries);
        path
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Scan export with a `projectName` column.
pub const SCANS_CSV: &str = "projectName,scanDate,scans\n\
billing,2024-01-02,3\n\
ledger,2024-01-03,5\n\
payroll,2024-01-04,2\n\
billing,2024-02-01,1\n";

/// Export without a `projectName` column.
pub const TOTALS_CSV: &str = "year,total\n2023,9\n2024,12\n";
