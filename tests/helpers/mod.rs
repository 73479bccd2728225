#![allow(dead_code)]

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Scratch directory holding a log file, a users file and a config file
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let env = Self { temp_dir };
        fs::write(env.log_path(), "").unwrap();
        // Never touch the real service or reboot from a test
        fs::write(
            env.config_path(),
            "[enroll]\nreboot_countdown = 0\nrestart_command = [\"true\"]\nreboot_command = [\"true\"]\n",
        )
        .unwrap();
        env
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("radius.log")
    }

    pub fn users_path(&self) -> PathBuf {
        self.path().join("users")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).unwrap();
    }

    pub fn write_users(&self, content: &str) {
        fs::write(self.users_path(), content).unwrap();
    }

    pub fn append_log(&self, line: &str) {
        let mut file = OpenOptions::new().append(true).open(self.log_path()).unwrap();
        writeln!(file, "{}", line).unwrap();
        file.flush().unwrap();
    }
}

/// Running tool child with stdout and stderr collected in the background.
/// The child is killed on drop if it is still running.
pub struct ToolProcess {
    child: Child,
    stdout: Arc<Mutex<String>>,
    stderr: Arc<Mutex<String>>,
}

impl ToolProcess {
    pub fn watch(args: &[&str]) -> Self {
        Self::spawn(env!("CARGO_BIN_EXE_radmac-watch"), args)
    }

    pub fn enroll(args: &[&str]) -> Self {
        Self::spawn(env!("CARGO_BIN_EXE_radmac-enroll"), args)
    }

    fn spawn(program: &str, args: &[&str]) -> Self {
        let mut child = Command::new(program)
            .args(args)
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let stdout = collect(child.stdout.take().unwrap());
        let stderr = collect(child.stderr.take().unwrap());
        Self { child, stdout, stderr }
    }

    pub fn stdout(&self) -> String {
        self.stdout.lock().unwrap().clone()
    }

    pub fn stderr(&self) -> String {
        self.stderr.lock().unwrap().clone()
    }

    /// Wait until stdout contains `text`; false on timeout
    pub fn wait_for_stdout(&self, text: &str, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.stdout().contains(text) {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    /// Wait for the child to exit; None on timeout
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> Option<ExitStatus> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = self.child.try_wait() {
                // Let the reader threads drain the pipes
                thread::sleep(Duration::from_millis(50));
                return Some(status);
            }
            thread::sleep(Duration::from_millis(20));
        }
        None
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn send_sigint(&self) {
        unsafe {
            let result = libc::kill(self.child.id() as i32, libc::SIGINT);
            assert_eq!(result, 0, "Failed to send SIGINT to PID {}", self.child.id());
        }
    }
}

impl Drop for ToolProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn collect<R: std::io::Read + Send + 'static>(stream: R) -> Arc<Mutex<String>> {
    let buffer = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&buffer);
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            let mut sink = sink.lock().unwrap();
            sink.push_str(&line);
            sink.push('\n');
        }
    });
    buffer
}

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
