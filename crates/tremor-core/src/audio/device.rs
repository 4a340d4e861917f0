//! Output device enumeration across audio hosts
//!
//! Devices are gathered from every available host rather than only the
//! platform default. On Linux with a JACK server running, the JACK host
//! exposes the server as a single device while ALSA exposes raw hardware;
//! routing the audified output into a monitoring chain requires picking
//! between them explicitly.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Human-readable name for a cpal host backend
fn host_name(host_id: HostId) -> String {
    let name = format!("{host_id:?}");
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        "CoreAudio" => "CoreAudio".to_string(),
        other => other.to_string(),
    }
}

fn host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|id| host_name(*id) == name)
        .and_then(|id| cpal::host_from_id(id).ok())
}

/// An output device an operator can select
#[derive(Debug, Clone)]
pub struct OutputDevice {
    /// Stable identifier for configuration
    pub id: DeviceId,
    /// Device name as reported by the driver
    pub name: String,
    /// Host backend the device belongs to
    pub host: String,
    /// Whether this is its host's default output
    pub is_default: bool,
}

impl std::fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.name)
    }
}

/// Enumerate output devices from every available host
///
/// Hosts that fail to initialize are skipped with a warning. Each host's
/// default device is flagged and sorted to the front of its group.
pub fn available_output_devices() -> Vec<OutputDevice> {
    let mut devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(host) => host,
            Err(e) => {
                log::warn!("Skipping audio host {}: {e}", host_name(host_id));
                continue;
            }
        };
        let host_label = host_name(host_id);

        let default_name = host
            .default_output_device()
            .and_then(|d| d.name().ok());

        let outputs = match host.output_devices() {
            Ok(outputs) => outputs,
            Err(e) => {
                log::warn!("Cannot list outputs on {host_label}: {e}");
                continue;
            }
        };

        for device in outputs {
            let Ok(name) = device.name() else { continue };
            // Devices without any output config are capture-only endpoints
            if device.supported_output_configs().map_or(true, |mut c| c.next().is_none()) {
                continue;
            }
            let is_default = default_name.as_deref() == Some(name.as_str());
            devices.push(OutputDevice {
                id: DeviceId::with_host(&name, &host_label),
                name,
                host: host_label.clone(),
                is_default,
            });
        }
    }

    devices.sort_by_key(|d| !d.is_default);
    devices
}

/// Resolve a configured device id to a cpal device
///
/// Searches the named host first when the id carries one, then every
/// other host, so a saved selection survives a host name going stale.
pub fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    if let Some(host_label) = &id.host {
        if let Some(host) = host_by_name(host_label) {
            if let Some(device) = find_in_host(&host, &id.name) {
                return Ok(device);
            }
        }
    }

    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else { continue };
        if let Some(device) = find_in_host(&host, &id.name) {
            return Ok(device);
        }
    }

    Err(AudioError::DeviceNotFound(id.display_label()))
}

fn find_in_host(host: &Host, name: &str) -> Option<cpal::Device> {
    host.output_devices()
        .ok()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
}

/// Default output device of the default host
pub fn default_output_device() -> AudioResult<cpal::Device> {
    let host = cpal::default_host();
    host.default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice(host_name(host.id())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_does_not_panic() {
        // Headless CI machines may report nothing at all; the contract is
        // only that enumeration never fails and labels are well formed.
        for device in available_output_devices() {
            assert!(!device.name.is_empty());
            assert!(!device.host.is_empty());
            assert_eq!(device.id.name, device.name);
            assert_eq!(device.id.host.as_deref(), Some(device.host.as_str()));
        }
    }

    #[test]
    fn display_label_includes_host() {
        let device = OutputDevice {
            id: DeviceId::with_host("Scarlett 2i2", "ALSA"),
            name: "Scarlett 2i2".to_string(),
            host: "ALSA".to_string(),
            is_default: false,
        };
        assert_eq!(device.to_string(), "[ALSA] Scarlett 2i2");
    }

    #[test]
    fn unknown_device_is_reported_not_found() {
        let id = DeviceId::new("no-such-device-3f9a");
        match find_device_by_id(&id) {
            Err(AudioError::DeviceNotFound(label)) => {
                assert!(label.contains("no-such-device-3f9a"));
            }
            Ok(_) => panic!("nonexistent device resolved"),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
