#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::Path;
use tempfile::TempDir;

/// A throwaway home directory with an initialized database inside.
pub struct Sandbox {
    pub home: TempDir,
    pub db: String,
}

impl Sandbox {
    pub fn new() -> Self {
        let home = tempfile::tempdir().expect("temp home");
        let db = home
            .path()
            .join("rtasksync_test.sqlite")
            .to_string_lossy()
            .to_string();
        let sb = Self { home, db };
        sb.cmd().args(["--test", "init"]).assert().success();
        sb
    }

    /// `rtasksync --db <sandbox db>` with HOME pointing at the sandbox.
    pub fn cmd(&self) -> Command {
        let mut c = rts();
        c.env("HOME", self.home.path())
            .env("RUST_LOG", "off")
            .args(["--db", &self.db]);
        c
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }
}

pub fn rts() -> Command {
    cargo_bin_cmd!("rtasksync")
}
