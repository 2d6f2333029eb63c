use std::fmt::Write as _;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

mod probe;

pub use probe::SystemHostProbe;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// Point-in-time read of host diagnostics, taken fresh for every session.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub hostname: String,
    pub ip_address: Option<IpAddr>,
    pub mac_address: Option<String>,
    pub os_version: String,
    pub username: String,
    pub cpu_percent: Option<f32>,
    pub ram_percent: Option<f32>,
    pub disk_percent: Option<f32>,
    pub captured_at_ms: u64,
}

/// Best-effort host facts. Every method may come back empty; callers substitute placeholders.
pub trait HostProbe {
    fn hostname(&self) -> Option<String>;
    fn ip_address(&self) -> Option<IpAddr>;
    fn mac_address(&self) -> Option<String>;
    fn os_version(&self) -> Option<String>;
    fn username(&self) -> Option<String>;
    fn cpu_percent(&self) -> Option<f32>;
    fn ram_percent(&self) -> Option<f32>;
    fn disk_percent(&self) -> Option<f32>;
}

pub fn snapshot_with<P: HostProbe + ?Sized>(probe: &P) -> HostSnapshot {
    let snapshot = HostSnapshot {
        hostname: non_empty_or(probe.hostname(), UNKNOWN),
        ip_address: probe.ip_address(),
        mac_address: probe.mac_address().and_then(normalize_mac),
        os_version: non_empty_or(probe.os_version(), UNKNOWN),
        username: non_empty_or(probe.username(), UNKNOWN),
        cpu_percent: probe.cpu_percent().and_then(valid_percent),
        ram_percent: probe.ram_percent().and_then(valid_percent),
        disk_percent: probe.disk_percent().and_then(valid_percent),
        captured_at_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default(),
    };
    tracing::debug!(
        hostname = %snapshot.hostname,
        cpu = ?snapshot.cpu_percent,
        ram = ?snapshot.ram_percent,
        disk = ?snapshot.disk_percent,
        "host snapshot taken"
    );
    snapshot
}

fn non_empty_or(value: Option<String>, placeholder: &str) -> String {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Uppercase colon form; the all-zero address some loopback adapters report counts as missing.
fn normalize_mac(value: String) -> Option<String> {
    let mac = value.trim().replace('-', ":").to_ascii_uppercase();
    if mac.is_empty() || mac.chars().all(|c| c == '0' || c == ':') {
        return None;
    }
    Some(mac)
}

fn valid_percent(value: f32) -> Option<f32> {
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

impl HostSnapshot {
    pub fn ip_label(&self) -> String {
        self.ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn mac_label(&self) -> String {
        self.mac_address
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn cpu_label(&self) -> String {
        percent_label(self.cpu_percent)
    }

    pub fn ram_label(&self) -> String {
        percent_label(self.ram_percent)
    }

    pub fn disk_label(&self) -> String {
        percent_label(self.disk_percent)
    }

    /// Two short rows for the ticket window header.
    pub fn summary_lines(&self) -> [String; 2] {
        [
            format!(
                "{}  |  {}  |  {}",
                self.hostname, self.username, self.os_version
            ),
            format!(
                "IP: {}   MAC: {}   CPU: {}   RAM: {}   Disk: {}",
                self.ip_label(),
                self.mac_label(),
                self.cpu_label(),
                self.ram_label(),
                self.disk_label()
            ),
        ]
    }

    /// Block appended to the ticket text so the backend keeps the diagnostics.
    pub fn system_block(&self) -> String {
        let mut block = String::from("--- System Information ---\n");
        let _ = writeln!(block, "Hostname: {}", self.hostname);
        let _ = writeln!(block, "Username: {}", self.username);
        let _ = writeln!(block, "IP Address: {}", self.ip_label());
        let _ = writeln!(block, "MAC Address: {}", self.mac_label());
        let _ = writeln!(block, "OS: {}", self.os_version);
        let _ = writeln!(block, "CPU Usage: {}", self.cpu_label());
        let _ = writeln!(block, "RAM Usage: {}", self.ram_label());
        let _ = writeln!(block, "Disk Usage: {}", self.disk_label());
        block
    }
}

fn percent_label(value: Option<f32>) -> String {
    value
        .map(|value| format!("{value:.1}%"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[derive(Default)]
    struct FakeHostProbe {
        hostname: Option<String>,
        ip_address: Option<IpAddr>,
        mac_address: Option<String>,
        os_version: Option<String>,
        username: Option<String>,
        cpu_percent: Option<f32>,
        ram_percent: Option<f32>,
        disk_percent: Option<f32>,
    }

    impl HostProbe for FakeHostProbe {
        fn hostname(&self) -> Option<String> {
            self.hostname.clone()
        }

        fn ip_address(&self) -> Option<IpAddr> {
            self.ip_address
        }

        fn mac_address(&self) -> Option<String> {
            self.mac_address.clone()
        }

        fn os_version(&self) -> Option<String> {
            self.os_version.clone()
        }

        fn username(&self) -> Option<String> {
            self.username.clone()
        }

        fn cpu_percent(&self) -> Option<f32> {
            self.cpu_percent
        }

        fn ram_percent(&self) -> Option<f32> {
            self.ram_percent
        }

        fn disk_percent(&self) -> Option<f32> {
            self.disk_percent
        }
    }

    fn populated_probe() -> FakeHostProbe {
        FakeHostProbe {
            hostname: Some("ws-042".to_string()),
            ip_address: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 42))),
            mac_address: Some("3c:52:82:0a:1b:2c".to_string()),
            os_version: Some("Windows 11".to_string()),
            username: Some("jdoe".to_string()),
            cpu_percent: Some(12.5),
            ram_percent: Some(61.0),
            disk_percent: Some(73.4),
        }
    }

    #[test]
    fn snapshot_with_copies_available_facts() {
        let snapshot = snapshot_with(&populated_probe());
        assert_eq!(snapshot.hostname, "ws-042");
        assert_eq!(snapshot.ip_label(), "10.0.0.42");
        assert_eq!(snapshot.os_version, "Windows 11");
        assert_eq!(snapshot.username, "jdoe");
        assert_eq!(snapshot.cpu_label(), "12.5%");
        assert_eq!(snapshot.ram_label(), "61.0%");
        assert_eq!(snapshot.mac_label(), "3C:52:82:0A:1B:2C");
        assert_eq!(snapshot.disk_label(), "73.4%");
        assert!(snapshot.captured_at_ms > 0);
    }

    #[test]
    fn snapshot_with_degrades_missing_facts_to_placeholders() {
        let probe = FakeHostProbe {
            hostname: Some("   ".to_string()),
            cpu_percent: Some(f32::NAN),
            ram_percent: Some(140.0),
            mac_address: Some("00-00-00-00-00-00".to_string()),
            disk_percent: Some(-1.0),
            ..FakeHostProbe::default()
        };
        let snapshot = snapshot_with(&probe);
        assert_eq!(snapshot.hostname, UNKNOWN);
        assert_eq!(snapshot.os_version, UNKNOWN);
        assert_eq!(snapshot.username, UNKNOWN);
        assert_eq!(snapshot.ip_label(), NOT_AVAILABLE);
        assert_eq!(snapshot.cpu_percent, None);
        assert_eq!(snapshot.ram_label(), NOT_AVAILABLE);
        assert_eq!(snapshot.mac_address, None);
        assert_eq!(snapshot.disk_label(), NOT_AVAILABLE);
    }

    #[test]
    fn summary_lines_render_header_rows() {
        let snapshot = snapshot_with(&populated_probe());
        assert_eq!(
            snapshot.summary_lines(),
            [
                "ws-042  |  jdoe  |  Windows 11".to_string(),
                "IP: 10.0.0.42   MAC: 3C:52:82:0A:1B:2C   CPU: 12.5%   RAM: 61.0%   Disk: 73.4%"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn system_block_lists_every_fact() {
        let snapshot = snapshot_with(&FakeHostProbe::default());
        let block = snapshot.system_block();
        assert!(block.starts_with("--- System Information ---\n"));
        assert!(block.contains("Hostname: Unknown\n"));
        assert!(block.contains("IP Address: N/A\n"));
        assert!(block.contains("MAC Address: N/A\n"));
        assert!(block.contains("CPU Usage: N/A\n"));
        assert!(block.contains("RAM Usage: N/A\n"));
        assert!(block.ends_with("Disk Usage: N/A\n"));
    }
}
