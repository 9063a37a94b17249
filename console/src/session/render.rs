//! Text rendering for the console

use std::io::Write;

use colored::Colorize;

use crate::directory::Device;
use crate::health::probe::ServerStatus;
use crate::keys::result::KeyRequestResult;

/// Rendering sink
pub trait Screen: Send + Sync {
    fn show(&self, text: &str);

    /// Show text the operator types after, without a line break
    fn prompt(&self, text: &str) {
        self.show(text);
    }
}

/// Writes rendered text to stdout
#[derive(Debug, Default)]
pub struct StdoutScreen;

impl Screen for StdoutScreen {
    fn show(&self, text: &str) {
        println!("{}", text);
    }

    fn prompt(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

pub const HELP: &str = "\
Commands:
  list                     show known devices
  select <n|ip>            pick a device as the request target
  request [ip]             request an API key (defaults to the selected device)
  add <ip> <username>      add a device to this session
  delete <ip>              remove a device from this session
  show                     show the current result
  copy                     copy the current API key to the clipboard
  download                 save the current API key to a text file
  dismiss                  clear the current result
  status                   show gateway status
  logout | quit            leave the console";

/// Device grid, numbered from 1 for `select`
pub fn render_devices(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "No devices.".dimmed().to_string();
    }

    let ip_width = devices.iter().map(|d| d.ip.len()).max().unwrap_or(0);
    let mut out = format!("{}", "Devices".bold());
    for (i, device) in devices.iter().enumerate() {
        out.push_str(&format!(
            "\n  {:>2}. {:<width$}  {}",
            i + 1,
            device.ip,
            device.username.dimmed(),
            width = ip_width
        ));
    }
    out
}

/// Result panel: status banner, raw body and available actions
pub fn render_result(result: &KeyRequestResult) -> String {
    let banner = if result.is_success() {
        format!("✓ Successfully generated API key for {}", result.target_ip)
            .green()
            .bold()
    } else {
        format!("✗ Failed to generate API key for {}", result.target_ip)
            .red()
            .bold()
    };

    let mut out = format!("{}\n{}", banner, result.raw_body);
    if result.is_success() {
        out.push_str(&format!("\n{}", "Actions: copy | download | dismiss".dimmed()));
    } else if let Some(error) = result.error.as_deref().filter(|e| *e != result.raw_body) {
        out.push_str(&format!("\n{}", error.red()));
    }
    out
}

/// Input prompt with the gateway indicator and the selected device
pub fn render_prompt(status: ServerStatus, selected: Option<&str>) -> String {
    let indicator = match status {
        ServerStatus::Online => "●".green(),
        ServerStatus::Offline => "●".red(),
        ServerStatus::Unknown => "●".yellow(),
    };
    match selected {
        Some(ip) => format!("{} keyvault [{}]> ", indicator, ip),
        None => format!("{} keyvault> ", indicator),
    }
}
