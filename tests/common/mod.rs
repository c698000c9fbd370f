//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tickerwatch::domain::entities::message::Message;
use tickerwatch::domain::error::DomainError;
use tickerwatch::domain::ports::arbitrator::{Arbitrator, Verdict};
use tickerwatch::infrastructure::config::settings::Config;
use tickerwatch::TickerWatch;

#[derive(Debug, Clone)]
pub enum Script {
    Verdict(Verdict),
    Fail,
    Slow(std::time::Duration, Verdict),
}

/// Scripted arbitrator that counts how often it is consulted.
pub struct FakeArbitrator {
    script: Script,
    calls: AtomicUsize,
}

impl FakeArbitrator {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn agreeing(confidence: f64) -> Arc<Self> {
        Self::new(Script::Verdict(verdict(true, confidence)))
    }

    pub fn disagreeing() -> Arc<Self> {
        Self::new(Script::Verdict(verdict(false, 0.9)))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Script::Fail)
    }

    pub fn slow(millis: u64) -> Arc<Self> {
        Self::new(Script::Slow(
            std::time::Duration::from_millis(millis),
            verdict(true, 0.9),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Arbitrator for FakeArbitrator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn classify(&self, _symbol: &str, _excerpts: &[String]) -> Result<Verdict, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Verdict(v) => Ok(v.clone()),
            Script::Fail => Err(DomainError::Arbitration("provider returned 503".into())),
            Script::Slow(delay, v) => {
                tokio::time::sleep(*delay).await;
                Ok(v.clone())
            }
        }
    }
}

pub fn verdict(is_genuine_stock: bool, confidence: f64) -> Verdict {
    Verdict {
        is_genuine_stock,
        confidence,
        reasoning: "scripted".into(),
    }
}

pub fn test_config() -> Config {
    let mut config = Config::in_memory();
    config.engine.arbitration_batch_delay_ms = 0;
    config
}

pub fn setup_with(arbitrator: Arc<FakeArbitrator>) -> TickerWatch {
    TickerWatch::with_providers(test_config(), arbitrator).unwrap()
}

pub fn setup() -> (TickerWatch, Arc<FakeArbitrator>) {
    let arbitrator = FakeArbitrator::agreeing(0.9);
    (setup_with(arbitrator.clone()), arbitrator)
}

/// Whole-second timestamp `minutes` before now, inside the catch-up window.
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    let now = Utc::now() - Duration::minutes(minutes);
    DateTime::from_timestamp(now.timestamp(), 0).unwrap()
}

pub fn msg(id: &str, text: &str, observed_at: DateTime<Utc>) -> Message {
    Message::new(id, "trading-floor", "trader-1", text, observed_at)
}

pub fn msg_from(id: &str, author: &str, text: &str, observed_at: DateTime<Utc>) -> Message {
    Message::new(id, "trading-floor", author, text, observed_at)
}
