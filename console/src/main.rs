//! KeyVault - Entry Point
//!
//! Operator console for generating firewall API keys through the KeyVault
//! gateway. Run with `--serve` to start the gateway itself.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use keyvault::app::options::{ConsoleOptions, GatewayOptions};
use keyvault::app::run::{run_console, run_gateway};
use keyvault::logs::{init_logging, LogLevel, LogOptions, LogTarget};
use keyvault::session::capabilities::{ConsoleNotifier, LineInput, PromptConfirm, SystemClipboard};
use keyvault::session::render::StdoutScreen;
use keyvault::session::Capabilities;
use keyvault::storage::layout::StorageLayout;
use keyvault::storage::settings::Settings;
use keyvault::utils::version_info;

use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return;
    }

    let layout = match cli_args.get("config-dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };

    // Retrieve the settings file
    let mut settings = match Settings::load(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return;
        }
    };
    if let Some(level) = cli_args.get("log-level") {
        match level.parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => eprintln!("{e}, keeping {}", settings.log_level.to_filter_string()),
        }
    }

    let serve = cli_args.contains_key("serve");

    // Initialize logging; the console owns stdout so it logs to file
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        target: if serve {
            LogTarget::Stdout
        } else {
            LogTarget::File(layout.logs_dir())
        },
        json_format: cli_args.contains_key("json-logs"),
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    if serve {
        let mut options = GatewayOptions::from(&settings);
        if let Ok(port) = env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => options.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value {:?}", port),
            }
        }

        info!("Running KeyVault gateway {} on port {}", version.version, options.server.port);
        if let Err(e) = run_gateway(options, await_shutdown_signal()).await {
            error!("Failed to run the gateway: {e}");
        }
        return;
    }

    let options = ConsoleOptions::from(&settings);
    info!("Running KeyVault console with options: {:?}", options);

    let input = Arc::new(LineInput::stdin());
    let capabilities = Capabilities {
        notifier: Arc::new(ConsoleNotifier),
        confirm: Arc::new(PromptConfirm::new(input.clone())),
        clipboard: Arc::new(SystemClipboard),
        screen: Arc::new(StdoutScreen),
    };

    if let Err(e) = run_console(options, input, capabilities, await_shutdown_signal()).await {
        error!("Failed to run the console: {e}");
        eprintln!("{e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
