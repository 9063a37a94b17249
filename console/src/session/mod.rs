//! Operator console session
//!
//! The session owns the device directory and the current-result register
//! and turns operator commands into directory mutations, key requests and
//! notifications. Output goes through injected sinks.

pub mod capabilities;
pub mod commands;
pub mod export;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::directory::{Device, DeviceDirectory};
use crate::errors::DirectoryError;
use crate::health::probe::ServerStatus;
use crate::keys::ip::validate_ip_format;
use crate::keys::result::{ResultPolicy, ResultRegister};
use crate::keys::workflow::KeyRequester;
use crate::session::capabilities::{Clipboard, Confirm, Notifier};
use crate::session::commands::Command;
use crate::session::export::export_key;
use crate::session::render::{render_devices, render_prompt, render_result, Screen, HELP};

const INVALID_IP: &str = "Please enter a valid IP address";

/// Whether the console keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Sinks and prompts the session talks through
#[derive(Clone)]
pub struct Capabilities {
    pub notifier: Arc<dyn Notifier>,
    pub confirm: Arc<dyn Confirm>,
    pub clipboard: Arc<dyn Clipboard>,
    pub screen: Arc<dyn Screen>,
}

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Directory exported key files are written to
    pub download_dir: PathBuf,

    /// Treatment of out-of-order key results
    pub result_policy: ResultPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            result_policy: ResultPolicy::LastWriterWins,
        }
    }
}

/// One operator console session
pub struct Session {
    directory: DeviceDirectory,
    register: ResultRegister,
    selected_ip: Option<String>,
    requester: Arc<dyn KeyRequester>,
    server_status: watch::Receiver<ServerStatus>,
    capabilities: Capabilities,
    download_dir: PathBuf,
}

impl Session {
    pub fn new(
        directory: DeviceDirectory,
        requester: Arc<dyn KeyRequester>,
        server_status: watch::Receiver<ServerStatus>,
        capabilities: Capabilities,
        options: SessionOptions,
    ) -> Self {
        Self {
            directory,
            register: ResultRegister::new(options.result_policy),
            selected_ip: None,
            requester,
            server_status,
            capabilities,
            download_dir: options.download_dir,
        }
    }

    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    pub fn register(&self) -> &ResultRegister {
        &self.register
    }

    pub fn selected_ip(&self) -> Option<&str> {
        self.selected_ip.as_deref()
    }

    /// Prompt text reflecting the latest gateway status
    pub fn prompt(&self) -> String {
        render_prompt(*self.server_status.borrow(), self.selected_ip())
    }

    /// Run one command to completion
    pub async fn dispatch(&mut self, command: Command) -> Flow {
        debug!("Dispatching {:?}", command);
        match command {
            Command::Help => self.capabilities.screen.show(HELP),
            Command::List => self.show_devices(),
            Command::Select(target) => self.select(&target),
            Command::Request(ip) => self.request_key(ip.as_deref()).await,
            Command::Add { ip, username } => self.add_device(&ip, &username),
            Command::Delete(ip) => self.delete_device(&ip).await,
            Command::Show => self.show_result(),
            Command::Copy => self.copy_key(),
            Command::Download => self.download_key().await,
            Command::Dismiss => self.dismiss(),
            Command::Status => self.show_status(),
            Command::Logout => {
                self.capabilities.notifier.info("Logged out successfully");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    pub fn show_devices(&self) {
        self.capabilities
            .screen
            .show(&render_devices(self.directory.all()));
    }

    /// Quick-select by 1-based grid position or by IP
    pub fn select(&mut self, target: &str) {
        let device = match target.parse::<usize>() {
            Ok(n) if n >= 1 => self.directory.all().get(n - 1),
            _ => self.directory.find(target),
        };

        match device {
            Some(device) => {
                let ip = device.ip.clone();
                self.capabilities.notifier.info(&format!("Selected {}", ip));
                self.selected_ip = Some(ip);
            }
            None => self
                .capabilities
                .notifier
                .error(&format!("No device matches {}", target)),
        }
    }

    /// Request a key for `input`, or for the selected device when absent
    pub async fn request_key(&mut self, input: Option<&str>) {
        let ip = match input.map(str::trim).or(self.selected_ip.as_deref()) {
            Some(ip) => ip.to_string(),
            None => {
                self.capabilities.notifier.error(INVALID_IP);
                return;
            }
        };

        if !validate_ip_format(&ip) {
            self.capabilities.notifier.error(INVALID_IP);
            return;
        }

        // a new request hides the previous result
        self.register.dismiss();
        let seq = self.register.begin();
        self.capabilities
            .screen
            .show(&format!("Generating API key for {}...", ip));

        let result = self.requester.request_api_key(&ip).await;
        let stored = self.register.complete(seq, result.clone());
        if !stored {
            return;
        }

        self.capabilities.screen.show(&render_result(&result));
        if result.is_success() {
            self.capabilities
                .notifier
                .success("API key generated successfully!");
        } else {
            let description = result.error.as_deref().unwrap_or(&result.raw_body);
            self.capabilities
                .notifier
                .error(&format!("Error: {}", description));
        }
    }

    pub fn add_device(&mut self, ip: &str, username: &str) {
        let ip = ip.trim();
        if !validate_ip_format(ip) {
            self.capabilities.notifier.error(INVALID_IP);
            return;
        }

        match self.directory.add(Device::new(ip, username.trim())) {
            Ok(()) => {
                info!("Device {} added to session directory", ip);
                self.show_devices();
                self.capabilities
                    .notifier
                    .success(&format!("Device {} added successfully!", ip));
            }
            Err(DirectoryError::DuplicateIp(_)) => self
                .capabilities
                .notifier
                .error("Device with this IP already exists"),
            Err(e) => self.capabilities.notifier.error(&e.to_string()),
        }
    }

    /// Delete after confirmation; unknown IPs are ignored
    pub async fn delete_device(&mut self, ip: &str) {
        let Some(device) = self.directory.find(ip) else {
            debug!("Delete requested for unknown device {}", ip);
            return;
        };

        let message = format!(
            "Are you sure you want to delete device?\n\nIP: {}\nUsername: {}\n\nThis action cannot be undone.",
            device.ip, device.username
        );
        if !self.capabilities.confirm.confirm(&message).await {
            return;
        }

        if self.directory.remove(ip).is_ok() {
            info!("Device {} deleted from session directory", ip);
            self.show_devices();
            self.capabilities
                .notifier
                .success(&format!("Device {} deleted successfully", ip));
        }
    }

    pub fn show_result(&self) {
        match self.register.current() {
            Some(result) => self.capabilities.screen.show(&render_result(result)),
            None => self.capabilities.screen.show("No result."),
        }
    }

    /// Copy the current key; a no-op without a successful result
    pub fn copy_key(&self) {
        let Some((_, key)) = self.register.current_key() else {
            return;
        };

        match self.capabilities.clipboard.write_text(key) {
            Ok(()) => self
                .capabilities
                .notifier
                .success("API key copied to clipboard!"),
            Err(e) => {
                error!("Failed to copy: {}", e);
                self.capabilities.notifier.error("Failed to copy API key");
            }
        }
    }

    /// Export the current key; a no-op without a successful result
    pub async fn download_key(&self) {
        let Some((ip, key)) = self.register.current_key() else {
            return;
        };

        match export_key(&self.download_dir, ip, key).await {
            Ok(path) => {
                self.capabilities
                    .screen
                    .show(&format!("Saved {}", path.display()));
                self.capabilities.notifier.success("API key downloaded!");
            }
            Err(e) => {
                error!("Failed to export API key: {}", e);
                self.capabilities.notifier.error("Failed to download API key");
            }
        }
    }

    pub fn dismiss(&mut self) {
        self.register.dismiss();
    }

    pub fn show_status(&self) {
        let status = *self.server_status.borrow();
        self.capabilities.screen.show(status.label());
    }
}
