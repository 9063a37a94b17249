//! Plain-text key export

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use tracing::info;

use crate::errors::KeyVaultError;
use crate::filesys::file::File;

/// File name for an exported key, e.g. `apikey_10.0.0.1_2026-10-16T09-30-00-123Z.txt`
pub fn export_file_name(ip: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("apikey_{}_{}.txt", ip, timestamp)
}

/// Contents of an exported key file
pub fn export_contents(ip: &str, api_key: &str, at: DateTime<Utc>) -> String {
    let generated = at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    format!("API Key for {}\nGenerated: {}\n\n{}", ip, generated, api_key)
}

/// Write the key for `ip` into `dir` and return the file path
pub async fn export_key(dir: &Path, ip: &str, api_key: &str) -> Result<PathBuf, KeyVaultError> {
    let now = Utc::now();
    let file = File::new(dir.join(export_file_name(ip, now)));
    file.write_private(&export_contents(ip, api_key, now)).await?;

    info!("Exported API key for {} to {}", ip, file.path().display());
    Ok(file.path().to_path_buf())
}
