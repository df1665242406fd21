//! OS process invocation seam
//!
//! Liveness probing shells out to the platform's `ping` and `arp` tools
//! rather than crafting raw ICMP/ARP packets, so it has no need for elevated
//! privileges. [`ProcessRunner`] is the one seam all of that goes through,
//! a small trait abstracting I/O so tests can substitute a fake instead of
//! spawning real subprocesses.

use std::process::Command;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
/// Abstracts invoking an external command and collecting its output,
/// stubbed out in tests via `mockall` so liveness/ARP probing never spawns
/// a real `ping`/`arp` binary during `cargo test`.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args`, waiting up to `timeout`. Returns the
    /// combined stdout as a lossily-decoded string along with whether the
    /// process exited successfully. A timeout or spawn failure is reported
    /// as `Ok((String::new(), false))` rather than an error, matching the
    /// original's treatment of a failed ping as "not alive" rather than a
    /// propagated exception.
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> (String, bool);

    /// Returns true if `program` resolves on `PATH`, used by
    /// `is_arp_supported` to decide whether ARP-based lookup types degrade
    /// to a no-op.
    fn is_available(&self, program: &str) -> bool;
}

/// Default [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> (String, bool) {
        let mut child = match Command::new(program)
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(_) => return (String::new(), false),
        };

        let deadline = std::time::Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let output = child.wait_with_output();
                    return match output {
                        Ok(output) => (
                            String::from_utf8_lossy(&output.stdout).into_owned(),
                            status.success(),
                        ),
                        Err(_) => (String::new(), false),
                    };
                }
                Ok(None) => {
                    if std::time::Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return (String::new(), false);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => return (String::new(), false),
            }
        }
    }

    fn is_available(&self, program: &str) -> bool {
        let path_lookup = Command::new(if cfg!(windows) { "where" } else { "which" })
            .arg(program)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();

        matches!(path_lookup, Ok(status) if status.success())
    }
}

#[cfg(test)]
#[path = "./process_tests.rs"]
mod tests;
