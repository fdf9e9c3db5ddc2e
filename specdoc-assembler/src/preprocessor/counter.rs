use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

/// What a counter counts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CounterKind {
    Integer,
    LowerLetter,
    UpperLetter,
}

/// A named counter. Created on first use; the seed, if any, is its first value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Counter {
    kind: CounterKind,
    /// The last value handed out. For letters, `a` is 1.
    current: i64,
}

impl Counter {
    /// A counter whose next value is `seed`, or 1 / `a` without one.
    fn seeded(seed: Option<&str>) -> Result<Self, String> {
        let Some(seed) = seed.map(str::trim).filter(|seed| !seed.is_empty()) else {
            return Ok(Self {
                kind: CounterKind::Integer,
                current: 0,
            });
        };
        if let Ok(value) = seed.parse::<i64>() {
            let current = value
                .checked_sub(1)
                .ok_or_else(|| format!("'{seed}' is below the smallest counter value"))?;
            return Ok(Self {
                kind: CounterKind::Integer,
                current,
            });
        }
        let mut chars = seed.chars();
        match (chars.next(), chars.next()) {
            (Some(letter @ 'a'..='z'), None) => Ok(Self {
                kind: CounterKind::LowerLetter,
                current: i64::from(u32::from(letter) - u32::from('a')),
            }),
            (Some(letter @ 'A'..='Z'), None) => Ok(Self {
                kind: CounterKind::UpperLetter,
                current: i64::from(u32::from(letter) - u32::from('A')),
            }),
            _ => Err(format!("'{seed}' is neither a number nor a single letter")),
        }
    }

    fn increment(&mut self) -> Result<String, String> {
        self.current = self
            .current
            .checked_add(1)
            .ok_or_else(|| format!("counter overflows past {}", self.current))?;
        Ok(match self.kind {
            CounterKind::Integer => self.current.to_string(),
            CounterKind::LowerLetter => letters(self.current, b'a'),
            CounterKind::UpperLetter => letters(self.current, b'A'),
        })
    }
}

/// Bijective base-26: 1 is `a`, 26 is `z`, 27 is `aa`.
fn letters(value: i64, base: u8) -> String {
    let mut value = value.max(1);
    let mut out = Vec::new();
    while value > 0 {
        value -= 1;
        // rem_euclid(26) always fits in a u8.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let digit = value.rem_euclid(26) as u8;
        out.push(base + digit);
        value /= 26;
    }
    out.iter().rev().map(|byte| char::from(*byte)).collect()
}

/// Every counter of a build, shared across included files.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    counters: FxHashMap<String, Counter>,
}

impl Counters {
    /// Step counter `name`, creating it from `seed` on first use, and return the new value.
    pub(crate) fn next(&mut self, name: &str, seed: Option<&str>) -> Result<String, String> {
        let counter = match self.counters.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Counter::seeded(seed)?),
        };
        counter.increment()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn run(seed: Option<&str>, times: usize) -> Result<Vec<String>, String> {
        let mut counters = Counters::default();
        (0..times).map(|_| counters.next("c", seed)).collect()
    }

    #[rstest]
    #[case::default(None, vec!["1", "2", "3"])]
    #[case::number(Some("7"), vec!["7", "8", "9"])]
    #[case::lower(Some("y"), vec!["y", "z", "aa"])]
    #[case::upper(Some("Z"), vec!["Z", "AA", "AB"])]
    fn test_counter_sequence(
        #[case] seed: Option<&str>,
        #[case] expected: Vec<&str>,
    ) -> Result<(), String> {
        assert_eq!(run(seed, 3)?, expected);
        Ok(())
    }

    #[test]
    fn test_seed_only_applies_on_creation() -> Result<(), String> {
        let mut counters = Counters::default();
        assert_eq!(counters.next("n", Some("5"))?, "5");
        assert_eq!(counters.next("n", Some("100"))?, "6");
        assert_eq!(counters.next("other", None)?, "1");
        Ok(())
    }

    #[test]
    fn test_invalid_seed() {
        assert!(run(Some("abc"), 1).is_err());
    }

    #[test]
    fn test_seed_at_the_bounds() -> Result<(), String> {
        assert!(run(Some("-9223372036854775808"), 1).is_err());
        assert_eq!(
            run(Some("9223372036854775807"), 1)?,
            vec!["9223372036854775807"]
        );
        assert!(run(Some("9223372036854775807"), 2).is_err());
        Ok(())
    }

    #[test]
    fn test_letters() {
        assert_eq!(letters(1, b'a'), "a");
        assert_eq!(letters(26, b'a'), "z");
        assert_eq!(letters(27, b'a'), "aa");
        assert_eq!(letters(52, b'a'), "az");
        assert_eq!(letters(53, b'a'), "ba");
    }
}
