//! Trading-context signals used by both scoring and blacklist re-admission.

use crate::domain::values::context::ContextSignals;
use regex::Regex;
use std::sync::LazyLock;

/// Trading verbs and slang, matched as case-insensitive substrings.
const TRADER_TERMS: &[&str] = &[
    "enter",
    "entry",
    "exit",
    "long",
    "short",
    "target",
    "runner",
    "halt",
    "calls",
    "puts",
    "buying",
    "bought",
    "selling",
    "sold",
    "scalp",
    "swing",
    "trim",
    "stop loss",
    "stopped out",
    "position",
    "shares",
    "breakout",
    "squeeze",
    "bounce",
    "dip",
    "moon",
    "ripping",
    "pump",
    "bagholding",
    "premarket",
    "pre-market",
    "after hours",
    "afterhours",
    "float",
    "catalyst",
    "earnings",
    "filled",
    "avg",
    "resistance",
    "support",
    "gap up",
    "gap down",
    "volume",
    "reversal",
    "adding",
];

const HALT_TERMS: &[&str] = &[
    "halt",
    "resume",
    "luld",
    "circuit breaker",
    "trading pause",
    "paused",
];

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[$€£¥¢]\s?\d|\b\d+\.\d+\b|\b\d+\s?(?:c|¢)(?:\s|$)|\b(?:price|pt|bid|ask|strike|premium|cents|dollars?|per share)\b",
    )
    .expect("valid price pattern")
});

#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> ContextSignals {
        let lower = text.to_lowercase();
        ContextSignals::new(
            TRADER_TERMS.iter().any(|t| lower.contains(t)),
            PRICE.is_match(text),
            HALT_TERMS.iter().any(|t| lower.contains(t)),
        )
    }

    /// Phrasing strong enough to count toward re-admitting a blacklisted symbol.
    pub fn is_strong_trading_context(&self, text: &str) -> bool {
        self.analyze(text).has_trader_context
    }
}
