// Desktop clipboard and URL launcher backed by platform commands

use super::{Clipboard, LinkLauncher};
use futures_util::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

/// Clipboard tools, in order of preference, with the arguments that make them
/// read from stdin into the primary clipboard
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

/// Pipes text into the first clipboard tool found on PATH
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn resolve() -> Option<(PathBuf, &'static [&'static str])> {
        CLIPBOARD_TOOLS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|path| {
                log::debug!("[SystemClipboard] Using {} at {:?}", name, path);
                (path, *args)
            })
        })
    }
}

impl Clipboard for SystemClipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let (program, args) = Self::resolve().ok_or_else(|| {
                "No clipboard tool found (tried wl-copy, xclip, xsel, pbcopy, clip)".to_string()
            })?;

            let mut child = tokio::process::Command::new(&program)
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| format!("Failed to start {:?}: {}", program, e))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(text.as_bytes())
                    .await
                    .map_err(|e| format!("Failed to write to clipboard: {}", e))?;
            }

            let status = child
                .wait()
                .await
                .map_err(|e| format!("Clipboard tool failed: {}", e))?;
            if !status.success() {
                return Err(format!("Clipboard tool exited with {}", status));
            }
            Ok(())
        })
    }
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }

    fn command_for(url: &str) -> std::process::Command {
        let os = if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        };
        launcher_command(os, url)
    }
}

/// Command that hands `url` to the default handler on `os`. Never routed
/// through cmd.exe, which splits a URL at `&`.
fn launcher_command(os: &str, url: &str) -> std::process::Command {
    let (program, args): (&str, &[&str]) = match os {
        "windows" => ("rundll32", &["url.dll,FileProtocolHandler"]),
        "macos" => ("open", &[]),
        _ => ("xdg-open", &[]),
    };
    let mut cmd = std::process::Command::new(program);
    cmd.args(args).arg(url);
    cmd
}

/// Start a handler without blocking on it; a background thread reaps it
fn spawn_detached(
    mut cmd: std::process::Command,
) -> std::io::Result<std::thread::JoinHandle<Option<std::process::ExitStatus>>> {
    let mut child = cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                log::warn!("[SystemLauncher] URL handler exited with {}", status);
            }
            Some(status)
        }
        Err(e) => {
            log::warn!("[SystemLauncher] Failed to wait for URL handler: {}", e);
            None
        }
    }))
}

impl LinkLauncher for SystemLauncher {
    fn open(&self, url: &str) -> Result<(), String> {
        spawn_detached(Self::command_for(url))
            .map(|_| ())
            .map_err(|e| format!("Failed to open {}: {}", url, e))
    }
}
