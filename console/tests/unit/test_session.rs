//! Console session tests with injected capabilities

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keyvault::app::options::{ConsoleOptions, LifecycleOptions};
use keyvault::app::run::run_console;
use keyvault::directory::{Device, DeviceDirectory};
use keyvault::errors::KeyVaultError;
use keyvault::health::probe::ServerStatus;
use keyvault::keys::result::{KeyRequestResult, WorkflowState};
use keyvault::keys::workflow::KeyRequester;
use keyvault::session::capabilities::{Clipboard, Confirm, Level, LineInput, Notification, Notifier};
use keyvault::session::commands::Command;
use keyvault::session::render::Screen;
use keyvault::session::{Capabilities, Flow, Session, SessionOptions};
use tokio::sync::{mpsc, watch};

#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(Level, String)> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| (n.level, n.message.clone()))
            .collect()
    }

    fn last(&self) -> Option<(Level, String)> {
        self.messages().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
struct RecordingScreen {
    lines: Mutex<Vec<String>>,
}

impl RecordingScreen {
    fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl Screen for RecordingScreen {
    fn show(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

struct FixedConfirm {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl FixedConfirm {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Confirm for FixedConfirm {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer
    }
}

#[derive(Default)]
struct FakeClipboard {
    fail: AtomicBool,
    written: Mutex<Vec<String>>,
}

impl Clipboard for FakeClipboard {
    fn write_text(&self, text: &str) -> Result<(), KeyVaultError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(KeyVaultError::ClipboardError("no display".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Succeeds for 10.0.0.1, fails for everything else
#[derive(Default)]
struct FakeRequester {
    calls: AtomicUsize,
}

#[async_trait]
impl KeyRequester for FakeRequester {
    async fn request_api_key(&self, ip: &str) -> KeyRequestResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ip == "10.0.0.1" {
            KeyRequestResult::success(
                ip,
                "KEY-1",
                "<response status='success'><key>KEY-1</key></response>".to_string(),
            )
        } else {
            KeyRequestResult::failure(ip, "HTTP 502: Bad Gateway")
        }
    }
}

struct Harness {
    session: Session,
    notifier: Arc<RecordingNotifier>,
    screen: Arc<RecordingScreen>,
    confirm: Arc<FixedConfirm>,
    clipboard: Arc<FakeClipboard>,
    requester: Arc<FakeRequester>,
    status_tx: watch::Sender<ServerStatus>,
    download_dir: tempfile::TempDir,
}

fn harness(confirm_answer: bool) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let screen = Arc::new(RecordingScreen::default());
    let confirm = Arc::new(FixedConfirm::new(confirm_answer));
    let clipboard = Arc::new(FakeClipboard::default());
    let requester = Arc::new(FakeRequester::default());
    let (status_tx, status_rx) = watch::channel(ServerStatus::Online);
    let download_dir = tempfile::tempdir().unwrap();

    let directory = DeviceDirectory::seeded(&[
        Device::new("10.0.0.1", "admin"),
        Device::new("10.0.0.2", "netops"),
    ]);
    let capabilities = Capabilities {
        notifier: notifier.clone(),
        confirm: confirm.clone(),
        clipboard: clipboard.clone(),
        screen: screen.clone(),
    };
    let session = Session::new(
        directory,
        requester.clone(),
        status_rx,
        capabilities,
        SessionOptions {
            download_dir: download_dir.path().to_path_buf(),
            ..Default::default()
        },
    );

    Harness {
        session,
        notifier,
        screen,
        confirm,
        clipboard,
        requester,
        status_tx,
        download_dir,
    }
}

#[tokio::test]
async fn test_request_invalid_ip_issues_no_request() {
    let mut h = harness(true);

    h.session.request_key(Some("10.0.0.256")).await;
    assert_eq!(h.requester.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.notifier.last(),
        Some((Level::Error, "Please enter a valid IP address".to_string()))
    );
    assert!(h.session.register().current().is_none());
}

#[tokio::test]
async fn test_request_without_target_or_selection() {
    let mut h = harness(true);

    h.session.request_key(None).await;
    assert_eq!(h.requester.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.notifier.last().unwrap().0, Level::Error);
}

#[tokio::test]
async fn test_request_success_sets_current_result() {
    let mut h = harness(true);

    h.session.request_key(Some(" 10.0.0.1 ")).await;
    assert_eq!(h.session.register().state(), WorkflowState::Completed);
    assert_eq!(h.session.register().current_key(), Some(("10.0.0.1", "KEY-1")));
    assert!(h.screen.contains("Generating API key for 10.0.0.1..."));
    assert!(h.screen.contains("Successfully generated API key for 10.0.0.1"));
    assert_eq!(
        h.notifier.last(),
        Some((Level::Success, "API key generated successfully!".to_string()))
    );
}

#[tokio::test]
async fn test_request_failure_notifies_error() {
    let mut h = harness(true);

    h.session.request_key(Some("10.0.0.2")).await;
    let current = h.session.register().current().unwrap();
    assert!(!current.is_success());
    assert!(h.session.register().current_key().is_none());
    assert_eq!(
        h.notifier.last(),
        Some((Level::Error, "Error: HTTP 502: Bad Gateway".to_string()))
    );
}

#[tokio::test]
async fn test_select_then_request_uses_selection() {
    let mut h = harness(true);

    h.session.select("1");
    assert_eq!(h.session.selected_ip(), Some("10.0.0.1"));
    h.session.select("10.0.0.2");
    assert_eq!(h.session.selected_ip(), Some("10.0.0.2"));
    h.session.select("7");
    assert_eq!(h.session.selected_ip(), Some("10.0.0.2"));
    assert_eq!(h.notifier.last().unwrap().0, Level::Error);

    h.session.request_key(None).await;
    assert_eq!(h.session.register().current().unwrap().target_ip, "10.0.0.2");
}

#[tokio::test]
async fn test_add_device_validation_and_duplicates() {
    let mut h = harness(true);

    h.session.add_device("10.0.0.300", "admin");
    assert_eq!(
        h.notifier.last(),
        Some((Level::Error, "Please enter a valid IP address".to_string()))
    );

    h.session.add_device("10.0.0.1", "other");
    assert_eq!(
        h.notifier.last(),
        Some((Level::Error, "Device with this IP already exists".to_string()))
    );
    assert_eq!(h.session.directory().len(), 2);

    h.session.add_device("10.0.0.3", "ops");
    assert_eq!(
        h.notifier.last(),
        Some((Level::Success, "Device 10.0.0.3 added successfully!".to_string()))
    );
    let ips: Vec<&str> = h.session.directory().all().iter().map(|d| d.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
}

#[tokio::test]
async fn test_delete_device_confirmed() {
    let mut h = harness(true);

    h.session.delete_device("10.0.0.2").await;
    assert!(!h.session.directory().exists("10.0.0.2"));
    let asked = h.confirm.asked.lock().unwrap().clone();
    assert_eq!(asked.len(), 1);
    assert!(asked[0].contains("IP: 10.0.0.2"));
    assert!(asked[0].contains("Username: netops"));
    assert_eq!(
        h.notifier.last(),
        Some((Level::Success, "Device 10.0.0.2 deleted successfully".to_string()))
    );
}

#[tokio::test]
async fn test_delete_device_declined() {
    let mut h = harness(false);

    h.session.delete_device("10.0.0.2").await;
    assert!(h.session.directory().exists("10.0.0.2"));
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_device_is_noop() {
    let mut h = harness(true);

    h.session.delete_device("10.9.9.9").await;
    assert_eq!(h.session.directory().len(), 2);
    assert!(h.confirm.asked.lock().unwrap().is_empty());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_copy_key() {
    let mut h = harness(true);

    // nothing to copy yet
    h.session.copy_key();
    assert!(h.notifier.messages().is_empty());

    h.session.request_key(Some("10.0.0.1")).await;
    h.session.copy_key();
    assert_eq!(*h.clipboard.written.lock().unwrap(), vec!["KEY-1".to_string()]);
    assert_eq!(
        h.notifier.last(),
        Some((Level::Success, "API key copied to clipboard!".to_string()))
    );

    h.clipboard.fail.store(true, Ordering::SeqCst);
    h.session.copy_key();
    assert_eq!(
        h.notifier.last(),
        Some((Level::Error, "Failed to copy API key".to_string()))
    );
}

#[tokio::test]
async fn test_download_key_writes_file() {
    let mut h = harness(true);

    h.session.request_key(Some("10.0.0.1")).await;
    h.session.download_key().await;
    assert_eq!(
        h.notifier.last(),
        Some((Level::Success, "API key downloaded!".to_string()))
    );

    let entries: Vec<_> = std::fs::read_dir(h.download_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("apikey_10.0.0.1_"));
    assert!(name.ends_with(".txt"));

    let contents = std::fs::read_to_string(&entries[0]).unwrap();
    assert!(contents.starts_with("API Key for 10.0.0.1\nGenerated: "));
    assert!(contents.ends_with("\n\nKEY-1"));
}

#[tokio::test]
async fn test_download_after_failure_is_noop() {
    let mut h = harness(true);

    h.session.request_key(Some("10.0.0.2")).await;
    let before = h.notifier.messages().len();
    h.session.download_key().await;
    assert_eq!(h.notifier.messages().len(), before);
    assert_eq!(std::fs::read_dir(h.download_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_dismiss_clears_result() {
    let mut h = harness(true);

    h.session.request_key(Some("10.0.0.1")).await;
    assert_eq!(h.session.dispatch(Command::Dismiss).await, Flow::Continue);
    assert!(h.session.register().current().is_none());
    assert_eq!(h.session.register().state(), WorkflowState::Idle);

    h.session.show_result();
    assert!(h.screen.contains("No result."));
}

#[tokio::test]
async fn test_logout_exits() {
    let mut h = harness(true);

    assert_eq!(h.session.dispatch(Command::Logout).await, Flow::Exit);
    assert_eq!(
        h.notifier.last(),
        Some((Level::Info, "Logged out successfully".to_string()))
    );
}

#[tokio::test]
async fn test_status_reflects_indicator() {
    let h = harness(true);

    h.session.show_status();
    assert!(h.screen.contains("Server Online"));
    h.status_tx.send_replace(ServerStatus::Offline);
    h.session.show_status();
    assert!(h.screen.contains("Server Offline"));
}

#[tokio::test]
async fn test_run_console_until_logout() {
    // Nothing listens on the gateway origin, so the request fails
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let notifier = Arc::new(RecordingNotifier::default());
    let screen = Arc::new(RecordingScreen::default());
    let capabilities = Capabilities {
        notifier: notifier.clone(),
        confirm: Arc::new(FixedConfirm::new(true)),
        clipboard: Arc::new(FakeClipboard::default()),
        screen: screen.clone(),
    };

    let input = Arc::new(LineInput::new(Cursor::new(
        "list\nbogus\nadd 10.0.0.9 ops\nrequest 10.0.0.9\nquit\nlist\n".as_bytes().to_vec(),
    )));
    let options = ConsoleOptions {
        lifecycle: LifecycleOptions {
            logout_delay: Duration::from_millis(10),
            max_shutdown_delay: Duration::from_secs(5),
        },
        backend_base_url: origin,
        request_timeout: Duration::from_secs(5),
        devices: vec![Device::new("10.0.0.1", "admin")],
        ..Default::default()
    };

    run_console(options, input, capabilities, std::future::pending())
        .await
        .unwrap();

    let messages = notifier.messages();
    assert!(messages
        .iter()
        .any(|(level, m)| *level == Level::Error && m.starts_with("Unknown command: bogus")));
    assert!(messages.contains(&(Level::Success, "Device 10.0.0.9 added successfully!".to_string())));
    assert!(messages
        .iter()
        .any(|(level, m)| *level == Level::Error && m.starts_with("Error: ")));
    assert!(messages.contains(&(Level::Info, "Logged out successfully".to_string())));
    assert!(screen.contains("Failed to generate API key for 10.0.0.9"));
}

fn idle_console_options() -> (ConsoleOptions, Arc<RecordingNotifier>, Capabilities) {
    let notifier = Arc::new(RecordingNotifier::default());
    let capabilities = Capabilities {
        notifier: notifier.clone(),
        confirm: Arc::new(FixedConfirm::new(true)),
        clipboard: Arc::new(FakeClipboard::default()),
        screen: Arc::new(RecordingScreen::default()),
    };
    let options = ConsoleOptions {
        lifecycle: LifecycleOptions {
            logout_delay: Duration::from_millis(10),
            max_shutdown_delay: Duration::from_secs(5),
        },
        backend_base_url: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    (options, notifier, capabilities)
}

#[tokio::test]
async fn test_run_console_stops_on_shutdown_while_reader_idle() {
    let (options, notifier, capabilities) = idle_console_options();

    // The writer half stays open, so the reader never yields a line
    let (_writer, reader) = tokio::io::duplex(64);
    let input = Arc::new(LineInput::new(tokio::io::BufReader::new(reader)));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_console(
            options,
            input,
            capabilities,
            tokio::time::sleep(Duration::from_millis(50)),
        ),
    )
    .await;

    assert!(result.expect("console did not stop on shutdown").is_ok());
    assert!(!notifier
        .messages()
        .contains(&(Level::Info, "Logged out successfully".to_string())));
}

#[tokio::test]
async fn test_run_console_stops_on_shutdown_with_channel_input() {
    let (options, _notifier, capabilities) = idle_console_options();

    // Sender held open, as the stdin thread does while blocked on a read
    let (_tx, rx) = mpsc::channel::<String>(4);
    let input = Arc::new(LineInput::from_receiver(rx));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_console(
            options,
            input,
            capabilities,
            tokio::time::sleep(Duration::from_millis(50)),
        ),
    )
    .await;

    assert!(result.expect("console did not stop on shutdown").is_ok());
}

#[tokio::test]
async fn test_channel_input_ends_when_senders_drop() {
    let (tx, rx) = mpsc::channel::<String>(4);
    let input = LineInput::from_receiver(rx);

    tx.send("list".to_string()).await.unwrap();
    drop(tx);

    assert_eq!(input.next_line().await.as_deref(), Some("list"));
    assert_eq!(input.next_line().await, None);
}
