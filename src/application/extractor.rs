//! Candidate extraction from raw message text.

use crate::domain::entities::candidate::Candidate;
use crate::domain::values::extraction_method::ExtractionMethod;
use crate::domain::values::symbol::normalize_symbol;
use regex::{Match, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static CASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z]{1,5})(?:[.\-][A-Za-z0-9]{1,3})?").expect("valid cashtag pattern")
});

static ALL_CAPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{2,5}(?:[.\-][A-Z]{1,3})?\b").expect("valid all-caps pattern")
});

static PRICE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,5})\s+(?i:pt|price target|target)\s*:?\s*\$?\d")
        .expect("valid price-target pattern")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{2,5}\b").expect("valid word pattern"));

#[derive(Debug, Default, Clone, Copy)]
pub struct CandidateExtractor;

impl CandidateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Unique candidates for `text`, one per normalized symbol, ordered by
    /// position. When several rules capture the same symbol the highest base
    /// confidence wins, then rule priority, then the earliest occurrence.
    pub fn extract(&self, text: &str) -> Vec<Candidate> {
        let mut found: Vec<Candidate> = Vec::new();
        self.cashtags(text, &mut found);
        self.all_caps(text, &mut found);
        self.price_targets(text, &mut found);
        self.mixed_case(text, &mut found);

        let mut best: HashMap<String, Candidate> = HashMap::new();
        for candidate in found {
            match best.get(&candidate.symbol) {
                Some(current) if !outranks(&candidate, current) => {}
                _ => {
                    best.insert(candidate.symbol.clone(), candidate);
                }
            }
        }

        let mut candidates: Vec<Candidate> = best.into_values().collect();
        candidates.sort_by_key(|c| c.position);
        candidates
    }

    fn cashtags(&self, text: &str, out: &mut Vec<Candidate>) {
        for caps in CASHTAG.captures_iter(text) {
            let (Some(whole), Some(letters)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if next_is_alphanumeric(text, whole.end()) {
                continue;
            }
            let letters = letters.as_str();
            let method = if letters.len() == 1 {
                ExtractionMethod::SingleLetterCashtag
            } else if letters.chars().all(|c| c.is_ascii_uppercase()) {
                ExtractionMethod::Cashtag
            } else {
                ExtractionMethod::MixedCaseCashtag
            };
            push_candidate(text, whole, method, out);
        }
    }

    fn all_caps(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in ALL_CAPS.find_iter(text) {
            if prev_char(text, m.start()) == Some('$') {
                continue;
            }
            push_candidate(text, m, ExtractionMethod::AllCaps, out);
        }
    }

    fn price_targets(&self, text: &str, out: &mut Vec<Candidate>) {
        for caps in PRICE_TARGET.captures_iter(text) {
            let Some(symbol) = caps.get(1) else {
                continue;
            };
            if prev_char(text, symbol.start()) == Some('$') {
                continue;
            }
            push_candidate(text, symbol, ExtractionMethod::PriceTargetPhrase, out);
        }
    }

    fn mixed_case(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in WORD.find_iter(text) {
            if !m.as_str().chars().any(|c| c.is_ascii_lowercase()) {
                continue;
            }
            if prev_char(text, m.start()) == Some('$') {
                continue;
            }
            push_candidate(text, m, ExtractionMethod::MixedCase, out);
        }
    }
}

fn outranks(challenger: &Candidate, current: &Candidate) -> bool {
    if challenger.base_confidence != current.base_confidence {
        return challenger.base_confidence > current.base_confidence;
    }
    if challenger.extraction_method != current.extraction_method {
        return challenger.extraction_method < current.extraction_method;
    }
    challenger.position < current.position
}

fn push_candidate(text: &str, m: Match<'_>, method: ExtractionMethod, out: &mut Vec<Candidate>) {
    let Some(symbol) = normalize_symbol(m.as_str()) else {
        return;
    };
    let position = text[..m.start()].chars().count();
    out.push(Candidate::new(symbol, method, m.as_str().to_string(), position));
}

fn prev_char(text: &str, byte_idx: usize) -> Option<char> {
    text[..byte_idx].chars().next_back()
}

fn next_is_alphanumeric(text: &str, byte_idx: usize) -> bool {
    text[byte_idx..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Candidate> {
        CandidateExtractor::new().extract(text)
    }

    fn find<'a>(candidates: &'a [Candidate], symbol: &str) -> Option<&'a Candidate> {
        candidates.iter().find(|c| c.symbol == symbol)
    }

    #[test]
    fn test_cashtag() {
        let c = extract("$SLDP pennant setting up now");
        let sldp = find(&c, "SLDP").unwrap();
        assert_eq!(sldp.extraction_method, ExtractionMethod::Cashtag);
        assert_eq!(sldp.base_confidence, 0.95);
        assert_eq!(sldp.position, 0);
        assert_eq!(sldp.original_text, "$SLDP");
    }

    #[test]
    fn test_cashtag_class_suffix_normalized() {
        let c = extract("loading $BRK-B and $bf.b today");
        assert_eq!(find(&c, "BRK.B").unwrap().extraction_method, ExtractionMethod::Cashtag);
        assert_eq!(
            find(&c, "BF.B").unwrap().extraction_method,
            ExtractionMethod::MixedCaseCashtag
        );
    }

    #[test]
    fn test_cashtag_too_long_is_not_a_candidate() {
        let c = extract("$ABCDEFG is not a ticker");
        assert!(find(&c, "ABCDE").is_none());
    }

    #[test]
    fn test_all_caps() {
        let c = extract("XPON ww here for next leg up");
        let xpon = find(&c, "XPON").unwrap();
        assert_eq!(xpon.extraction_method, ExtractionMethod::AllCaps);
        assert_eq!(xpon.base_confidence, 0.60);
    }

    #[test]
    fn test_lowercase_cashtag() {
        let c = extract("grabbed some $xpon");
        let xpon = find(&c, "XPON").unwrap();
        assert_eq!(xpon.extraction_method, ExtractionMethod::MixedCaseCashtag);
        assert_eq!(xpon.base_confidence, 0.85);
    }

    #[test]
    fn test_single_letter_requires_cashtag() {
        let c = extract("$F looks good, F is also a grade");
        let f = find(&c, "F").unwrap();
        assert_eq!(f.extraction_method, ExtractionMethod::SingleLetterCashtag);
        assert_eq!(f.position, 0);

        let c = extract("I think F is fine");
        assert!(find(&c, "F").is_none());
        assert!(find(&c, "I").is_none());
    }

    #[test]
    fn test_cashtag_wins_over_bare_occurrence() {
        let c = extract("XPON again, adding $XPON here");
        let xpon: Vec<_> = c.iter().filter(|c| c.symbol == "XPON").collect();
        assert_eq!(xpon.len(), 1);
        assert_eq!(xpon[0].extraction_method, ExtractionMethod::Cashtag);
        assert_eq!(xpon[0].position, 19);
    }

    #[test]
    fn test_price_target_phrase() {
        let c = extract("XPON pt $7 by friday");
        let xpon = find(&c, "XPON").unwrap();
        assert_eq!(xpon.extraction_method, ExtractionMethod::PriceTargetPhrase);
        assert_eq!(xpon.base_confidence, 0.75);
    }

    #[test]
    fn test_mixed_case_is_low_confidence() {
        let c = extract("Xpon is moving");
        let xpon = find(&c, "XPON").unwrap();
        assert_eq!(xpon.extraction_method, ExtractionMethod::MixedCase);
        assert_eq!(xpon.base_confidence, 0.30);
    }

    #[test]
    fn test_positions_are_character_offsets() {
        let c = extract("🚀🚀 $XPON");
        assert_eq!(find(&c, "XPON").unwrap().position, 3);
    }

    #[test]
    fn test_output_sorted_by_position() {
        let c = extract("$SLDP and $XPON and $AAPL");
        let positions: Vec<usize> = c.iter().map(|c| c.position).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }
}
