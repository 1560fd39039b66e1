//! Share link handling
//!
//! The canonical link of a project page can be copied to the clipboard or
//! handed to a social channel through an intent URL opened by a
//! [`LinkLauncher`].

pub mod system;

pub use system::{SystemClipboard, SystemLauncher};

use crate::config::ShareConfig;
use crate::models::{ShareChannel, ShareTarget};
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Writes text to the system clipboard
pub trait Clipboard: Send + Sync {
    fn write_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), String>>;
}

/// Opens a URL in a new browsing context
pub trait LinkLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Percent-encode everything except the characters JavaScript's
/// `encodeURIComponent` leaves alone.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Share actions for one project page
pub struct ShareController {
    project_id: u64,
    config: ShareConfig,
    clipboard: Arc<dyn Clipboard>,
    launcher: Arc<dyn LinkLauncher>,
    modal_open: AtomicBool,
}

impl ShareController {
    pub fn new(
        project_id: u64,
        config: ShareConfig,
        clipboard: Arc<dyn Clipboard>,
        launcher: Arc<dyn LinkLauncher>,
    ) -> Self {
        Self {
            project_id,
            config,
            clipboard,
            launcher,
            modal_open: AtomicBool::new(false),
        }
    }

    /// Canonical URL of the project page, unmodified
    pub fn share_url(&self) -> String {
        self.config.project_url(self.project_id)
    }

    pub fn open_modal(&self) {
        self.modal_open.store(true, Ordering::SeqCst);
    }

    pub fn close_modal(&self) {
        self.modal_open.store(false, Ordering::SeqCst);
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open.load(Ordering::SeqCst)
    }

    /// Intent URL for a social channel; `None` for the clipboard
    pub fn intent_url(&self, channel: ShareChannel) -> Option<String> {
        let url = encode_uri_component(&self.share_url());
        let text = encode_uri_component(&self.config.promo_text);
        match channel {
            ShareChannel::Clipboard => None,
            ShareChannel::WhatsApp => Some(format!("https://wa.me/?text={}%20{}", text, url)),
            ShareChannel::Facebook => Some(format!(
                "https://www.facebook.com/sharer/sharer.php?u={}",
                url
            )),
            ShareChannel::Gmail => Some(format!(
                "mailto:?subject={}&body={}%0A{}",
                encode_uri_component(&self.config.email_subject),
                text,
                url
            )),
        }
    }

    /// Write the canonical URL to the clipboard
    pub async fn copy_to_clipboard(&self) -> Result<ShareTarget, String> {
        let url = self.share_url();
        self.clipboard.write_text(&url).await?;
        log::info!("Copied share link for project {}", self.project_id);
        Ok(ShareTarget {
            url,
            channel: ShareChannel::Clipboard,
        })
    }

    /// Share through a channel. Nothing is retried; a failure is returned once.
    pub async fn share_via(&self, channel: ShareChannel) -> Result<ShareTarget, String> {
        let Some(intent) = self.intent_url(channel) else {
            return self.copy_to_clipboard().await;
        };
        self.launcher.open(&intent)?;
        log::info!("Opened {} share for project {}", channel, self.project_id);
        Ok(ShareTarget {
            url: intent,
            channel,
        })
    }

    /// Copy arbitrary text (the diagram markup)
    pub async fn copy_text(&self, text: &str) -> Result<(), String> {
        self.clipboard.write_text(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClipboard {
        written: Mutex<Vec<String>>,
    }

    impl Clipboard for FakeClipboard {
        fn write_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), String>> {
            Box::pin(async move {
                self.written.lock().unwrap().push(text.to_string());
                Ok(())
            })
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LinkLauncher for FakeLauncher {
        fn open(&self, url: &str) -> Result<(), String> {
            if self.fail {
                return Err("popup blocked".to_string());
            }
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn controller(
        clipboard: Arc<FakeClipboard>,
        launcher: Arc<FakeLauncher>,
    ) -> ShareController {
        ShareController::new(42, ShareConfig::default(), clipboard, launcher)
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(
            encode_uri_component("http://localhost:3000/project/42"),
            "http%3A%2F%2Flocalhost%3A3000%2Fproject%2F42"
        );
        assert_eq!(encode_uri_component("a b!"), "a%20b!");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn test_share_url_is_unmodified() {
        let c = controller(Arc::default(), Arc::default());
        assert_eq!(c.share_url(), "http://localhost:3000/project/42");
    }

    #[test]
    fn test_intent_urls() {
        let c = controller(Arc::default(), Arc::default());
        let url = "http%3A%2F%2Flocalhost%3A3000%2Fproject%2F42";
        let text = "Check%20out%20my%20system%20architecture%20designed%20with%20AI%20UML!";

        assert_eq!(
            c.intent_url(ShareChannel::WhatsApp).unwrap(),
            format!("https://wa.me/?text={}%20{}", text, url)
        );
        assert_eq!(
            c.intent_url(ShareChannel::Facebook).unwrap(),
            format!("https://www.facebook.com/sharer/sharer.php?u={}", url)
        );
        assert_eq!(
            c.intent_url(ShareChannel::Gmail).unwrap(),
            format!(
                "mailto:?subject=AI%20Architecture%20Design&body={}%0A{}",
                text, url
            )
        );
        assert_eq!(c.intent_url(ShareChannel::Clipboard), None);
    }

    #[tokio::test]
    async fn test_clipboard_channel_copies_link() {
        let clipboard = Arc::new(FakeClipboard::default());
        let launcher = Arc::new(FakeLauncher::default());
        let c = controller(clipboard.clone(), launcher.clone());

        let target = c.share_via(ShareChannel::Clipboard).await.unwrap();
        assert_eq!(target.url, "http://localhost:3000/project/42");
        assert_eq!(
            clipboard.written.lock().unwrap().as_slice(),
            ["http://localhost:3000/project/42"]
        );
        assert!(launcher.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_launcher_failure_surfaces_once() {
        let launcher = Arc::new(FakeLauncher {
            fail: true,
            ..Default::default()
        });
        let c = controller(Arc::default(), launcher);
        assert_eq!(
            c.share_via(ShareChannel::Facebook).await,
            Err("popup blocked".to_string())
        );
    }

    #[test]
    fn test_modal_flag() {
        let c = controller(Arc::default(), Arc::default());
        assert!(!c.is_modal_open());
        c.open_modal();
        assert!(c.is_modal_open());
        c.close_modal();
        assert!(!c.is_modal_open());
    }
}
