use std::net::{IpAddr, UdpSocket};

use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use super::HostProbe;

// Connecting a UDP socket only selects the outbound route; nothing is sent.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";
const SYSTEM_MOUNT_POINTS: [&str; 2] = ["/", "C:\\"];

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostProbe;

impl HostProbe for SystemHostProbe {
    fn hostname(&self) -> Option<String> {
        System::host_name()
    }

    fn ip_address(&self) -> Option<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect(ROUTE_PROBE_ADDR).ok()?;
        socket
            .local_addr()
            .ok()
            .map(|addr| addr.ip())
            .filter(|ip| !ip.is_unspecified())
    }

    fn mac_address(&self) -> Option<String> {
        let networks = Networks::new_with_refreshed_list();
        let mut interfaces: Vec<_> = networks
            .iter()
            .map(|(name, data)| (name.clone(), data.mac_address()))
            .filter(|(_, mac)| mac.0 != [0; 6])
            .collect();
        // HashMap order is unstable; pick the same adapter every time.
        interfaces.sort_by(|(a, _), (b, _)| a.cmp(b));
        interfaces.first().map(|(_, mac)| mac.to_string())
    }

    fn os_version(&self) -> Option<String> {
        System::long_os_version().or_else(|| {
            let name = System::name()?;
            Some(match System::os_version() {
                Some(version) => format!("{name} {version}"),
                None => name,
            })
        })
    }

    fn username(&self) -> Option<String> {
        ["USERNAME", "USER", "LOGNAME"]
            .into_iter()
            .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
    }

    fn cpu_percent(&self) -> Option<f32> {
        let mut system = System::new();
        system.refresh_cpu();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        if system.cpus().is_empty() {
            return None;
        }
        Some(system.global_cpu_info().cpu_usage())
    }

    fn ram_percent(&self) -> Option<f32> {
        let mut system = System::new();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return None;
        }
        Some((system.used_memory() as f64 / total as f64 * 100.0) as f32)
    }

    fn disk_percent(&self) -> Option<f32> {
        let disks = Disks::new_with_refreshed_list();
        let disk = SYSTEM_MOUNT_POINTS
            .iter()
            .find_map(|mount| {
                disks
                    .iter()
                    .find(|disk| disk.mount_point() == std::path::Path::new(mount))
            })
            .or_else(|| disks.iter().next())?;
        let total = disk.total_space();
        if total == 0 {
            return None;
        }
        let used = total.saturating_sub(disk.available_space());
        Some((used as f64 / total as f64 * 100.0) as f32)
    }
}
