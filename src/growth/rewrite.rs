//! Parametric string rewriting
//!
//! Each generation replaces every symbol with its mapped production; absent
//! symbols reproduce themselves. The length cap bounds the build without
//! splitting a production mid-token, so the result may run over by at most
//! one replacement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Symbol to replacement mapping. Keys not present map to identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules(HashMap<char, String>);

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, symbol: char, replacement: impl Into<String>) -> &mut Self {
        self.0.insert(symbol, replacement.into());
        self
    }

    pub fn get(&self, symbol: char) -> Option<&str> {
        self.0.get(&symbol).map(String::as_str)
    }

    /// Length of the longest single production (1 for an empty rule set,
    /// since identity reproduces one symbol).
    pub fn longest_production(&self) -> usize {
        self.0.values().map(String::len).max().unwrap_or(0).max(1)
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for Rules {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(c, s)| (c, s.into())).collect())
    }
}

/// Rewrite `axiom` through `generations` passes, bounded by `max_len`.
///
/// The current generation's build aborts once the partial string reaches
/// `max_len`; generation passes stop once the sentence is at the cap. Zero
/// generations returns the axiom unchanged.
pub fn rewrite(axiom: &str, rules: &Rules, generations: u32, max_len: usize) -> String {
    let mut sentence = axiom.to_owned();

    for _ in 0..generations {
        let mut next = String::with_capacity(sentence.len().min(max_len));
        for symbol in sentence.chars() {
            match rules.get(symbol) {
                Some(replacement) => next.push_str(replacement),
                None => next.push(symbol),
            }
            if next.len() >= max_len {
                break;
            }
        }
        sentence = next;
        if sentence.len() >= max_len {
            break;
        }
    }

    sentence
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn algae_rules() -> Rules {
        Rules::from_iter([('A', "AB"), ('B', "A")])
    }

    #[test]
    fn test_zero_generations_returns_axiom() {
        assert_eq!(rewrite("A", &algae_rules(), 0, 1000), "A");
    }

    #[test]
    fn test_empty_axiom_stays_empty() {
        assert_eq!(rewrite("", &algae_rules(), 5, 1000), "");
    }

    #[test]
    fn test_algae_two_generations() {
        // A -> AB -> ABA
        assert_eq!(rewrite("A", &algae_rules(), 2, 1000), "ABA");
    }

    #[test]
    fn test_unmapped_symbols_are_identity() {
        let rules = Rules::from_iter([('X', "F[+X][-X]")]);
        assert_eq!(rewrite("F+X", &rules, 1, 1000), "F+F[+X][-X]");
    }

    #[test]
    fn test_self_and_empty_mappings_are_valid() {
        let mut rules = Rules::new();
        rules.set('F', "F").set('G', "");
        assert_eq!(rewrite("FGF", &rules, 3, 1000), "FF");
    }

    #[test]
    fn test_cap_bounds_without_hard_truncation() {
        let rules = Rules::from_iter([('A', "AA")]);
        let out = rewrite("A", &rules, 10, 5);
        assert!(out.len() <= 5 + rules.longest_production());
        assert!(out.chars().all(|c| c == 'A'));
    }

    #[test]
    fn test_stops_generating_once_capped() {
        // Cap reached on generation 3; further generations must not grow it
        let rules = Rules::from_iter([('A', "AA")]);
        let capped = rewrite("A", &rules, 3, 6);
        let more = rewrite("A", &rules, 30, 6);
        assert_eq!(capped, more);
    }

    proptest! {
        #[test]
        fn prop_length_bounded_by_cap_plus_one_production(
            axiom in "[AB]{1,8}",
            generations in 1u32..12,
            max_len in 1usize..200,
        ) {
            let rules = algae_rules();
            let out = rewrite(&axiom, &rules, generations, max_len);
            prop_assert!(out.len() <= max_len + rules.longest_production());
        }
    }
}
