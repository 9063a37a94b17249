//! Device directory
//!
//! The session-scoped registry of known devices. Insertion order is display
//! order: seed devices first, then devices added by the operator.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::DirectoryError;
use crate::keys::ip::validate_ip_format;

/// A known network appliance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Dotted-quad IPv4 address, unique within a directory
    pub ip: String,

    /// Login name used for the device
    pub username: String,
}

impl Device {
    pub fn new(ip: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            username: username.into(),
        }
    }
}

/// Ordered in-memory device registry
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: Vec<Device>,
}

impl DeviceDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from the configured seed list
    ///
    /// Seed entries with a malformed or repeated IP are skipped.
    pub fn seeded(seed: &[Device]) -> Self {
        let mut directory = Self::new();
        for device in seed {
            if !validate_ip_format(&device.ip) {
                warn!("Skipping seed device with invalid IP: {:?}", device.ip);
                continue;
            }
            if let Err(e) = directory.add(device.clone()) {
                warn!("Skipping seed device: {}", e);
            }
        }
        debug!("Directory seeded with {} devices", directory.len());
        directory
    }

    /// Append a device, rejecting a duplicate IP
    pub fn add(&mut self, device: Device) -> Result<(), DirectoryError> {
        if self.exists(&device.ip) {
            return Err(DirectoryError::DuplicateIp(device.ip));
        }
        self.devices.push(device);
        Ok(())
    }

    /// Remove the device with `ip`, keeping the order of the others
    pub fn remove(&mut self, ip: &str) -> Result<Device, DirectoryError> {
        let index = self
            .devices
            .iter()
            .position(|d| d.ip == ip)
            .ok_or_else(|| DirectoryError::NotFound(ip.to_string()))?;
        Ok(self.devices.remove(index))
    }

    pub fn find(&self, ip: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.ip == ip)
    }

    pub fn exists(&self, ip: &str) -> bool {
        self.find(ip).is_some()
    }

    /// Snapshot of all devices in insertion order
    pub fn all(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
