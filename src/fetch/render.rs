//! Rendered tier: a persistent Node/puppeteer sidecar spoken to over stdio.
//!
//! The sidecar is spawned lazily on the first render and reused for the life
//! of the process. One browser, one page per render request. Requests and
//! replies are single JSON lines tagged with a request id, so renders from
//! concurrent offer tasks share the sidecar without queueing behind each
//! other; a reader task dispatches replies by id.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex, OnceCell};
use tracing::{debug, warn};

use super::validate_url;
use crate::error::{Error, Result};

const RENDER_SCRIPT: &str = include_str!("../../assets/render.mjs");

pub const DEFAULT_WAIT_MS: u64 = 8_000;
pub const MAX_WAIT_MS: u64 = 20_000;

/// Upper bound on a whole render round trip, including browser launch.
const RENDER_DEADLINE: Duration = Duration::from_secs(45);

static ENGINE: OnceCell<RenderEngine> = OnceCell::const_new();

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    id: u64,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<&'a str>,
    wait_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RenderReply {
    #[serde(default)]
    id: u64,
    ok: bool,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    html: String,
    #[serde(default)]
    error: Option<String>,
}

/// One spawned sidecar process plus the in-flight request table.
struct Sidecar {
    child: Mutex<Child>,
    stdin: Mutex<Option<ChildStdin>>,
    pending: StdMutex<HashMap<u64, oneshot::Sender<RenderReply>>>,
    next_id: AtomicU64,
}

impl Sidecar {
    fn spawn() -> Result<Arc<Self>> {
        let script = ensure_render_script()?;
        debug!("spawning render sidecar: node {}", script.display());

        let mut child = Command::new("node")
            .arg(&script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Render(format!("failed to start node: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Render("sidecar stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| Error::Render("sidecar stdout unavailable".to_string()))?;

        let sidecar = Arc::new(Sidecar {
            child: Mutex::new(child),
            stdin: Mutex::new(Some(stdin)),
            pending: StdMutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        });

        tokio::spawn(read_loop(Arc::clone(&sidecar), stdout));
        Ok(sidecar)
    }

    async fn alive(&self) -> bool {
        matches!(self.child.lock().await.try_wait(), Ok(None))
    }

    /// Sends one request line. The reply arrives through `pending`.
    async fn send(&self, line: &[u8]) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        let stdin = stdin
            .as_mut()
            .ok_or_else(|| Error::Render("sidecar is shutting down".to_string()))?;
        stdin
            .write_all(line)
            .await
            .map_err(|e| Error::Render(format!("failed to write to sidecar: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| Error::Render(format!("failed to flush sidecar: {e}")))
    }

    fn abandon(&self, id: u64) {
        self.pending.lock().expect("pending lock").remove(&id);
    }
}

/// Reads reply lines and routes each one to the waiting request.
async fn read_loop(sidecar: Arc<Sidecar>, mut stdout: BufReader<ChildStdout>) {
    let mut line = String::new();
    loop {
        line.clear();
        match stdout.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let reply: RenderReply = match serde_json::from_str(line.trim()) {
            Ok(r) => r,
            Err(e) => {
                warn!("discarding malformed sidecar reply: {e}");
                continue;
            }
        };

        let waiter = sidecar.pending.lock().expect("pending lock").remove(&reply.id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => warn!(id = reply.id, "sidecar reply for unknown request"),
        }
    }

    // Dropping the senders wakes every in-flight render with a closed-channel
    // error.
    sidecar.pending.lock().expect("pending lock").clear();
}

/// Process-wide render engine over one shared sidecar.
pub struct RenderEngine {
    inner: Mutex<Option<Arc<Sidecar>>>,
}

impl RenderEngine {
    fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    /// The shared engine instance, created on first use.
    pub async fn shared() -> &'static RenderEngine {
        ENGINE.get_or_init(|| async { RenderEngine::new() }).await
    }

    /// Renders a page and returns the origin status with its post-JavaScript
    /// HTML.
    ///
    /// Waits for `wait_selector` when given, otherwise for the sidecar's
    /// built-in price selector list. `wait_ms` is clamped to [`MAX_WAIT_MS`].
    pub async fn render(
        &self,
        url: &str,
        wait_selector: Option<&str>,
        wait_ms: u64,
        user_agent: Option<&str>,
    ) -> Result<(u16, String)> {
        validate_url(url)?;

        let sidecar = self.obtain().await?;
        let id = sidecar.next_id.fetch_add(1, Ordering::Relaxed);

        let request = RenderRequest {
            id,
            url,
            selector: wait_selector,
            wait_ms: wait_ms.min(MAX_WAIT_MS),
            user_agent,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| Error::Render(format!("failed to encode render request: {e}")))?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        sidecar.pending.lock().expect("pending lock").insert(id, tx);

        if let Err(e) = sidecar.send(line.as_bytes()).await {
            sidecar.abandon(id);
            self.discard(&sidecar).await;
            return Err(e);
        }

        match tokio::time::timeout(RENDER_DEADLINE, rx).await {
            Ok(Ok(reply)) if reply.ok => Ok((reply.status, reply.html)),
            Ok(Ok(reply)) => Err(Error::Render(
                reply.error.unwrap_or_else(|| "unknown render failure".to_string()),
            )),
            Ok(Err(_)) => {
                // The reader loop ended underneath us.
                self.discard(&sidecar).await;
                Err(Error::Render("sidecar closed its output".to_string()))
            }
            Err(_) => {
                sidecar.abandon(id);
                Err(Error::Render("render timed out".to_string()))
            }
        }
    }

    /// Returns the live sidecar, spawning or respawning as needed.
    async fn obtain(&self) -> Result<Arc<Sidecar>> {
        let mut guard = self.inner.lock().await;
        if let Some(sidecar) = guard.as_ref() {
            if sidecar.alive().await {
                return Ok(Arc::clone(sidecar));
            }
            warn!("render sidecar exited, respawning");
            *guard = None;
        }

        let sidecar = Sidecar::spawn()?;
        *guard = Some(Arc::clone(&sidecar));
        Ok(sidecar)
    }

    /// Drops a sidecar that misbehaved so the next render respawns cleanly.
    async fn discard(&self, sidecar: &Arc<Sidecar>) {
        let mut guard = self.inner.lock().await;
        if let Some(current) = guard.as_ref() {
            if Arc::ptr_eq(current, sidecar) {
                *guard = None;
            }
        }
        drop(guard);
        let _ = sidecar.child.lock().await.kill().await;
    }

    /// Stops the sidecar and its browser.
    pub async fn shutdown(&self) {
        let taken = self.inner.lock().await.take();
        if let Some(sidecar) = taken {
            // Closing stdin asks the sidecar to shut down its browser.
            sidecar.stdin.lock().await.take();
            let mut child = sidecar.child.lock().await;
            let wait = tokio::time::timeout(Duration::from_secs(5), child.wait()).await;
            if wait.is_err() {
                let _ = child.kill().await;
            }
        }
    }

    /// Shuts down the shared engine if it was ever started.
    pub async fn shutdown_shared() {
        if let Some(engine) = ENGINE.get() {
            engine.shutdown().await;
        }
    }
}

/// Materializes the sidecar script under the user cache directory.
fn ensure_render_script() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| Error::Render("no cache directory available".to_string()))?
        .join("price-scout");
    std::fs::create_dir_all(&dir)
        .map_err(|e| Error::Render(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join("render.mjs");
    let stale = match std::fs::read_to_string(&path) {
        Ok(existing) => existing != RENDER_SCRIPT,
        Err(_) => true,
    };
    if stale {
        std::fs::write(&path, RENDER_SCRIPT)
            .map_err(|e| Error::Render(format!("failed to write {}: {e}", path.display())))?;
    }

    Ok(path)
}

/// Whether the rendered tier can run at all on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Ready,
    NodeMissing,
}

impl RenderStatus {
    /// Probes for a usable `node` binary.
    pub async fn probe() -> Self {
        let check = Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match check {
            Ok(status) if status.success() => RenderStatus::Ready,
            _ => RenderStatus::NodeMissing,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            RenderStatus::Ready => None,
            RenderStatus::NodeMissing => {
                Some("Node.js with puppeteer is required for rendered fetches")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request_encoding() {
        let request = RenderRequest {
            id: 3,
            url: "https://example.com/p/1",
            selector: Some(".price"),
            wait_ms: 8_000,
            user_agent: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"id":3,"url":"https://example.com/p/1","selector":".price","waitMs":8000}"#
        );
    }

    #[test]
    fn test_render_reply_keeps_origin_status() {
        // A soft-404 product page renders fine but must not read as a 200.
        let reply: RenderReply =
            serde_json::from_str(r#"{"id":1,"ok":true,"status":404,"html":"<p>gone</p>"}"#)
                .unwrap();
        assert!(reply.ok);
        assert_eq!(reply.status, 404);
        assert_eq!(reply.html, "<p>gone</p>");

        let ok: RenderReply =
            serde_json::from_str(r#"{"id":2,"ok":true,"status":200,"html":"<p></p>"}"#).unwrap();
        assert_eq!(ok.status, 200);
    }

    #[test]
    fn test_render_reply_error_decoding() {
        let err: RenderReply =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"nav timeout"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.id, 4);
        assert_eq!(err.error.as_deref(), Some("nav timeout"));
    }

    #[test]
    fn test_wait_clamp() {
        assert_eq!(50_000u64.min(MAX_WAIT_MS), MAX_WAIT_MS);
        assert_eq!(5_000u64.min(MAX_WAIT_MS), 5_000);
    }

    #[tokio::test]
    async fn test_render_rejects_invalid_url() {
        let engine = RenderEngine::new();
        let err = engine.render("not-a-url", None, DEFAULT_WAIT_MS, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_reply_dispatch_by_id() {
        // Replies may arrive in any order; each must reach its own waiter.
        let pending: StdMutex<HashMap<u64, oneshot::Sender<RenderReply>>> =
            StdMutex::new(HashMap::new());

        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        pending.lock().unwrap().insert(1, tx1);
        pending.lock().unwrap().insert(2, tx2);

        for line in [
            r#"{"id":2,"ok":true,"status":200,"html":"second"}"#,
            r#"{"id":1,"ok":true,"status":404,"html":"first"}"#,
        ] {
            let reply: RenderReply = serde_json::from_str(line).unwrap();
            let tx = pending.lock().unwrap().remove(&reply.id).unwrap();
            tx.send(reply).unwrap();
        }

        let first = rx1.await.unwrap();
        let second = rx2.await.unwrap();
        assert_eq!((first.status, first.html.as_str()), (404, "first"));
        assert_eq!((second.status, second.html.as_str()), (200, "second"));
    }
}
