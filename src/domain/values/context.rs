use serde::Serialize;

/// Trading-context signals found in one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ContextSignals {
    pub has_trader_context: bool,
    pub has_price_context: bool,
    pub has_halt_language: bool,
    pub context_strength: f64,
}

impl ContextSignals {
    pub fn new(has_trader_context: bool, has_price_context: bool, has_halt_language: bool) -> Self {
        let context_strength = match (has_trader_context, has_price_context) {
            (true, true) => 0.8,
            (true, false) | (false, true) => 0.5,
            (false, false) => 0.0,
        };
        Self {
            has_trader_context,
            has_price_context,
            has_halt_language,
            context_strength,
        }
    }
}
