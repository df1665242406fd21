//! ICMP liveness via the OS `ping` tool

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::config::PingConfig;
use crate::process::ProcessRunner;

/// Invokes `ping` against `ip`, retrying up to `config.attempts` times with
/// `config.retry_delay` between attempts. A reply is detected by matching
/// `"ttl"` case-insensitively in stdout rather than parsing
/// exit status, since some platforms exit non-zero on partial loss even
/// when at least one reply arrived.
pub fn ping(runner: &dyn ProcessRunner, ip: Ipv4Addr, config: &PingConfig) -> bool {
    let count_flag = if cfg!(windows) { "-n" } else { "-c" };
    let timeout_flag = if cfg!(windows) { "-w" } else { "-W" };
    // Windows -w is milliseconds; Unix -W is whole seconds.
    let timeout_value = if cfg!(windows) {
        format!("{}", (config.timeout * 1000.0) as u64)
    } else {
        format!("{}", config.timeout.ceil() as u64)
    };
    let count_value = config.ping_count.to_string();
    let ip_str = ip.to_string();

    let args = [
        count_flag,
        count_value.as_str(),
        timeout_flag,
        timeout_value.as_str(),
        ip_str.as_str(),
    ];

    for attempt in 0..config.attempts.max(1) {
        let per_attempt_timeout = Duration::from_secs_f64(config.timeout * (config.ping_count.max(1) as f64) + 1.0);
        let (output, _ok) = runner.run("ping", &args, per_attempt_timeout);

        if output.to_lowercase().contains("ttl") {
            return true;
        }

        if attempt + 1 < config.attempts {
            std::thread::sleep(Duration::from_secs_f64(config.retry_delay));
        }
    }

    false
}

#[cfg(test)]
#[path = "./icmp_tests.rs"]
mod tests;
