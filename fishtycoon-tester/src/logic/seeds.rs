use anyhow::{Result, bail};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;

/// A seed requested on the command line, with the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub token: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            token: seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates keep their first position.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            match u64::from_str_radix(hex, 16) {
                Ok(value) => value,
                Err(_) => bail!("Unrecognized seed token: {token}"),
            }
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(seed) {
            seeds.push(SeedInfo {
                seed,
                token: token.clone(),
            });
        }
    }

    if seeds.is_empty() {
        seeds.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xF15A"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values, vec![42, 7, 0xF15A]);
        assert_eq!(seeds[2].token, "0xF15A");
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", "5"])).unwrap();
        assert_eq!(seeds.len(), 1);
        let fallback = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(fallback, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn rejects_words() {
        assert!(resolve_seed_inputs(&tokens(&["trout"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
