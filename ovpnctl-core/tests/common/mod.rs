//! Shared fixtures for supervisor integration tests
//!
//! The fake daemon understands the flags the supervisor passes. It
//! backgrounds a shell loop that logs HUP/USR1/USR2 to `signals.log` in the
//! working directory and writes its own pid once its traps are installed.
//! The launcher returns after the PID file appears. Configs whose name
//! contains "fail" make the launcher exit 1.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ovpnctl_core::config::SupervisorConfig;
use ovpnctl_core::supervisor::{DaemonBinary, Supervisor};
use tempfile::TempDir;

const FAKE_DAEMON: &str = r#"#!/bin/sh
pidfile=""
conf=""
cd_dir=""
while [ $# -gt 0 ]; do
    case "$1" in
        --writepid) pidfile="$2"; shift ;;
        --config) conf="$2"; shift ;;
        --cd) cd_dir="$2"; shift ;;
    esac
    shift
done
case "$(basename "$conf")" in
    *fail*) exit 1 ;;
esac
name=$(basename "$pidfile" .pid)
cd "$cd_dir" || exit 1
sh -c '
    trap "echo \"$1 HUP\" >> signals.log" HUP
    trap "echo \"$1 USR1\" >> signals.log" USR1
    trap "echo \"$1 USR2\" >> signals.log" USR2
    trap "exit 0" TERM
    echo $$ > "$2"
    i=0
    while [ $i -lt 600 ]; do
        sleep 0.1
        i=$((i + 1))
    done
' fake-openvpn "$name" "$pidfile" </dev/null >/dev/null 2>&1 &
tries=0
while [ ! -s "$pidfile" ] && [ $tries -lt 100 ]; do
    sleep 0.05
    tries=$((tries + 1))
done
echo "$name" >> launches.log
"#;

/// Temporary tree holding a working directory, PID directory, lock marker
/// and fake daemon
pub struct Fixture {
    pub root: TempDir,
    pub config: SupervisorConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let work_dir = root.path().join("work");
        let pid_dir = root.path().join("run");
        fs::create_dir_all(&work_dir).unwrap();

        let daemon = root.path().join("openvpn");
        fs::write(&daemon, FAKE_DAEMON).unwrap();
        fs::set_permissions(&daemon, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config =
            SupervisorConfig::new(work_dir, pid_dir, root.path().join("lock").join("openvpn"));
        config.daemon_paths = vec![daemon];
        config.search_path = false;
        config.settle_delay_secs = 0;
        config.stop_timeout_secs = 5;

        Self { root, config }
    }

    pub fn supervisor(&self) -> Supervisor {
        let daemon = DaemonBinary::locate(&self.config).expect("fake daemon should be found");
        Supervisor::new(self.config.clone(), daemon)
    }

    pub fn work_dir(&self) -> &Path {
        &self.config.work_dir
    }

    pub fn add_unit(&self, name: &str) {
        fs::write(self.work_dir().join(format!("{}.conf", name)), "dev tun\n").unwrap();
    }

    pub fn add_script(&self, file: &str, body: &str) {
        fs::write(self.work_dir().join(file), body).unwrap();
    }

    pub fn pid_file(&self, name: &str) -> PathBuf {
        self.config.pid_dir.join(format!("{}.pid", name))
    }

    pub fn read_pid(&self, name: &str) -> i32 {
        fs::read_to_string(self.pid_file(name))
            .expect("PID file should exist")
            .trim()
            .parse()
            .expect("PID file should hold a pid")
    }

    pub fn pid_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(&self.config.pid_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Leave a lock marker behind as a running or crashed supervisor would
    pub fn mark_running(&self) {
        let lock = &self.config.lock_file;
        fs::create_dir_all(lock.parent().expect("lock file has a parent")).unwrap();
        fs::write(lock, "").unwrap();
    }

    pub fn lock_exists(&self) -> bool {
        self.config.lock_file.exists()
    }

    pub fn work_file(&self, file: &str) -> String {
        fs::read_to_string(self.work_dir().join(file)).unwrap_or_default()
    }
}

/// Poll `check` until it holds or `timeout` passes
pub async fn eventually<F: Fn() -> bool>(check: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

pub fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}
