//! Deterministic confidence scoring.

use crate::application::settings::EngineSettings;
use crate::domain::entities::candidate::Candidate;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::context::ContextSignals;
use crate::domain::values::symbol::base_symbol;

/// Ambiguous tokens that are far more often English or chat slang than tickers.
const STOPWORDS: &[&str] = &[
    "A", "I", "AM", "AN", "AS", "AT", "BE", "BY", "DO", "GO", "HE", "IF", "IN", "IS", "IT",
    "ME", "MY", "NO", "OF", "OH", "OK", "ON", "OR", "SO", "TO", "UP", "US", "WE", "ALL", "AND",
    "ANY", "ARE", "BIG", "BUT", "CAN", "DAY", "FOR", "GET", "GOT", "HAS", "HOW", "LOL", "NEW",
    "NOT", "NOW", "ONE", "OUT", "SEE", "THE", "TOO", "TWO", "WAY", "WHO", "WHY", "YES", "YOU",
    "ALSO", "BEEN", "GOOD", "HAVE", "HERE", "JUST", "LIKE", "LOOK", "MORE", "MOST", "NEXT",
    "ONLY", "OPEN", "REAL", "SOME", "THAT", "THIS", "VERY", "WELL", "WHAT", "WHEN", "WILL",
    "WITH", "ATH", "CEO", "DD", "EOD", "EPS", "ETF", "FOMO", "FYI", "GG", "HOD", "IMO", "IPO",
    "LOD", "OTC", "PM", "PT", "SEC", "USA", "USD", "WW", "YOLO",
];

pub fn is_stopword(symbol: &str) -> bool {
    let base = base_symbol(symbol);
    STOPWORDS.contains(&base)
}

#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    settings: EngineSettings,
}

impl ConfidenceScorer {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Score a candidate against the message's context signals. Pure function
    /// of its inputs; the result is always within `[0, 1]`.
    pub fn score(&self, candidate: &Candidate, signals: &ContextSignals) -> Confidence {
        let method = candidate.extraction_method;
        let mut score = candidate.base_confidence;

        if is_stopword(&candidate.symbol) && !method.is_cashtag_derived() {
            score += self.settings.stopword_penalty;
            if !signals.has_trader_context {
                score += self.settings.no_context_penalty;
            }
        }

        if signals.has_trader_context {
            if let Some(floor) = method.context_floor() {
                score = score.max(floor);
            }
        }

        if signals.has_price_context {
            score += self.settings.price_context_bonus;
        }
        if signals.has_halt_language {
            score += self.settings.halt_bonus;
        }

        Confidence::clamped(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::extraction_method::ExtractionMethod;

    fn scorer() -> ConfidenceScorer {
        ConfidenceScorer::new(EngineSettings::default())
    }

    fn candidate(symbol: &str, method: ExtractionMethod) -> Candidate {
        Candidate::new(symbol.to_string(), method, symbol.to_string(), 0)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_all_caps_without_context_keeps_base() {
        let s = scorer().score(
            &candidate("XPON", ExtractionMethod::AllCaps),
            &ContextSignals::new(false, false, false),
        );
        assert!(approx(s.value(), 0.60));
    }

    #[test]
    fn test_trader_context_raises_to_floor() {
        let s = scorer().score(
            &candidate("XPON", ExtractionMethod::AllCaps),
            &ContextSignals::new(true, false, false),
        );
        assert!(approx(s.value(), 0.85));

        let s = scorer().score(
            &candidate("XPON", ExtractionMethod::MixedCase),
            &ContextSignals::new(true, false, false),
        );
        assert!(approx(s.value(), 0.70));
    }

    #[test]
    fn test_stopword_penalties() {
        let s = scorer().score(
            &candidate("NOW", ExtractionMethod::AllCaps),
            &ContextSignals::new(false, false, false),
        );
        assert!(approx(s.value(), 0.0));

        let s = scorer().score(
            &candidate("NOW", ExtractionMethod::AllCaps),
            &ContextSignals::new(false, true, false),
        );
        assert!(approx(s.value(), 0.10));
    }

    #[test]
    fn test_cashtag_exempt_from_stopword_penalty() {
        let s = scorer().score(
            &candidate("ALL", ExtractionMethod::Cashtag),
            &ContextSignals::new(false, false, false),
        );
        assert!(approx(s.value(), 0.95));
    }

    #[test]
    fn test_bonuses_and_clamp() {
        let s = scorer().score(
            &candidate("XPON", ExtractionMethod::Cashtag),
            &ContextSignals::new(true, true, true),
        );
        assert_eq!(s.value(), 1.0);
    }

    #[test]
    fn test_clamped_for_every_method_and_signal_combination() {
        let methods = [
            ExtractionMethod::Cashtag,
            ExtractionMethod::AllCaps,
            ExtractionMethod::MixedCaseCashtag,
            ExtractionMethod::SingleLetterCashtag,
            ExtractionMethod::PriceTargetPhrase,
            ExtractionMethod::MixedCase,
        ];
        let harsh = ConfidenceScorer::new(EngineSettings {
            stopword_penalty: -5.0,
            no_context_penalty: -5.0,
            price_context_bonus: 5.0,
            halt_bonus: 5.0,
            ..EngineSettings::default()
        });
        for method in methods {
            for symbol in ["XPON", "THE"] {
                for bits in 0..8u8 {
                    let signals = ContextSignals::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
                    let s = harsh.score(&candidate(symbol, method), &signals).value();
                    assert!((0.0..=1.0).contains(&s), "{symbol} {method} {bits}: {s}");
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let c = candidate("XPON", ExtractionMethod::AllCaps);
        let signals = ContextSignals::new(true, true, false);
        let first = scorer().score(&c, &signals);
        for _ in 0..100 {
            assert_eq!(scorer().score(&c, &signals), first);
        }
    }

    #[test]
    fn test_stopword_uses_base_symbol() {
        assert!(is_stopword("THE"));
        assert!(is_stopword("ALL.B"));
        assert!(!is_stopword("XPON"));
    }
}
