//! Fake audio source port
//!
//! Records every call the engine makes and lets tests script play
//! rejections and end-of-track signals.

use pacetune_engine::{AudioSourcePort, AudioSourceRef, PlayRejected};
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct PortInner {
    loaded: Option<AudioSourceRef>,
    paused: bool,
    rate: f64,
    play_attempts: usize,
    seek_count: usize,
    reject_next_play: bool,
    loads: Vec<AudioSourceRef>,
    rates: Vec<f64>,
}

pub struct FakePort {
    inner: Mutex<PortInner>,
    ended_tx: broadcast::Sender<()>,
}

impl FakePort {
    pub fn new() -> Self {
        let (ended_tx, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(PortInner {
                paused: true,
                rate: 1.0,
                ..PortInner::default()
            }),
            ended_tx,
        }
    }

    /// Make the next play request fail like a platform autoplay block
    pub fn reject_next_play(&self) {
        self.inner.lock().unwrap().reject_next_play = true;
    }

    /// Fire an end-of-source notification
    pub fn emit_ended(&self) {
        let _ = self.ended_tx.send(());
    }

    pub fn loaded_uri(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .loaded
            .as_ref()
            .map(|s| s.uri().to_string())
    }

    /// Rate currently applied to the port
    pub fn current_rate(&self) -> f64 {
        self.inner.lock().unwrap().rate
    }

    /// Every rate handed to `set_rate`, in call order
    pub fn rates(&self) -> Vec<f64> {
        self.inner.lock().unwrap().rates.clone()
    }

    /// Every source handed to `load`, in call order
    pub fn loads(&self) -> Vec<AudioSourceRef> {
        self.inner.lock().unwrap().loads.clone()
    }

    pub fn play_attempts(&self) -> usize {
        self.inner.lock().unwrap().play_attempts
    }

    pub fn seek_count(&self) -> usize {
        self.inner.lock().unwrap().seek_count
    }
}

#[async_trait::async_trait]
impl AudioSourcePort for FakePort {
    fn load(&self, source: &AudioSourceRef) {
        let mut inner = self.inner.lock().unwrap();
        inner.loaded = Some(source.clone());
        inner.paused = true;
        inner.loads.push(source.clone());
    }

    async fn play(&self) -> Result<(), PlayRejected> {
        let mut inner = self.inner.lock().unwrap();
        inner.play_attempts += 1;
        if std::mem::take(&mut inner.reject_next_play) {
            return Err(PlayRejected::new("blocked by platform policy"));
        }
        inner.paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.inner.lock().unwrap().paused = true;
    }

    fn seek_to_start(&self) {
        self.inner.lock().unwrap().seek_count += 1;
    }

    fn set_rate(&self, rate: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.rate = rate;
        inner.rates.push(rate);
    }

    fn current_source(&self) -> Option<AudioSourceRef> {
        self.inner.lock().unwrap().loaded.clone()
    }

    fn is_paused(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.loaded.is_none() || inner.paused
    }

    fn subscribe_ended(&self) -> broadcast::Receiver<()> {
        self.ended_tx.subscribe()
    }
}
