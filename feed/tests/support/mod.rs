use anyhow::{Result, anyhow};
use async_trait::async_trait;
use feed::{Connector, FrameStream};
use futures_util::{StreamExt, stream};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

/// What the next connection attempt does.
pub enum Script {
    Fail,
    /// Opens, yields the frames, then closes.
    Frames(Vec<String>),
    /// Opens, yields the frames, then stays open.
    Hold(Vec<String>),
}

/// Connector that plays back a script and reports when each attempt happened.
/// Attempts past the end of the script fail.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Script>>,
    attempts: mpsc::UnboundedSender<Instant>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Script>) -> (Arc<Self>, mpsc::UnboundedReceiver<Instant>) {
        let (attempts, rx) = mpsc::unbounded_channel();
        let connector = Self {
            script: Mutex::new(script.into()),
            attempts,
        };
        (Arc::new(connector), rx)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &Url) -> Result<FrameStream> {
        let _ = self.attempts.send(Instant::now());
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Script::Fail);

        let frames: FrameStream = match step {
            Script::Fail => return Err(anyhow!("connection refused")),
            Script::Frames(frames) => Box::pin(stream::iter(frames.into_iter().map(Ok::<_, anyhow::Error>))),
            Script::Hold(frames) => Box::pin(
                stream::iter(frames.into_iter().map(Ok::<_, anyhow::Error>)).chain(stream::pending()),
            ),
        };
        Ok(frames)
    }
}

pub fn test_url() -> Url {
    Url::parse("ws://replay.test/ws/replay").unwrap()
}

/// Whole seconds between consecutive attempts.
pub fn gaps(attempts: &[Instant]) -> Vec<u64> {
    attempts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_secs_f64().round() as u64)
        .collect()
}

pub async fn collect_attempts(rx: &mut mpsc::UnboundedReceiver<Instant>, count: usize) -> Vec<Instant> {
    let mut seen = Vec::with_capacity(count);
    while seen.len() < count {
        seen.push(rx.recv().await.expect("connector dropped before enough attempts"));
    }
    seen
}
