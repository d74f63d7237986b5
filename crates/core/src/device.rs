use crate::types::DeviceProfile;

/// Fixed device catalogue, cycled across workers by index.
pub const DEVICES: &[DeviceProfile] = &[
    DeviceProfile {
        id: "desktop-chrome-windows",
        name: "Desktop Chrome (Windows)",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
        platform: "Win32",
    },
    DeviceProfile {
        id: "macbook-safari",
        name: "MacBook Safari",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        accept_language: "en-US,en;q=0.9",
        platform: "MacIntel",
    },
    DeviceProfile {
        id: "firefox-windows",
        name: "Firefox (Windows)",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        accept_language: "en-US,en;q=0.5",
        platform: "Win32",
    },
    DeviceProfile {
        id: "iphone-safari",
        name: "iPhone Safari",
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
        accept_language: "en-US,en;q=0.9",
        platform: "iPhone",
    },
    DeviceProfile {
        id: "android-chrome",
        name: "Android Chrome",
        user_agent: "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
        accept_language: "en-US,en;q=0.9",
        platform: "Linux armv8l",
    },
];

/// Assigns a device to a worker by round-robin of its index.
pub fn device_for_worker(worker_id: usize) -> &'static DeviceProfile {
    &DEVICES[worker_id % DEVICES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robins_across_five_devices() {
        assert_eq!(device_for_worker(0).id, "desktop-chrome-windows");
        assert_eq!(device_for_worker(4).id, "android-chrome");
        assert_eq!(device_for_worker(5).id, "desktop-chrome-windows");
    }
}
