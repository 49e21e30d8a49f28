//! Short code generator
//!
//! Produces fixed-length random codes from a configurable alphabet using
//! rejection sampling over a cryptographically secure random source, so every
//! alphabet character is equally likely regardless of the alphabet size.

use std::collections::HashSet;

use rand::CryptoRng;

use crate::error::GeneratorError;

/// Default URL-safe alphabet: digits, upper and lower case letters, `_` and `-`
pub const URL_SAFE_ALPHABET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";

pub const ALPHANUMERIC_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const NUMERIC_ALPHABET: &str = "0123456789";

/// Default number of characters in a generated code
pub const DEFAULT_LENGTH: usize = 6;

pub const MIN_ALPHABET_LEN: usize = 2;
pub const MAX_ALPHABET_LEN: usize = 1024;

/// Random code generator with an instance-level default alphabet and length
///
/// # Example
///
/// ```
/// # use tinylink::generator::CodeGenerator;
/// let generator = CodeGenerator::numeric(4).unwrap();
/// let code = generator.generate();
/// assert_eq!(code.len(), 4);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl CodeGenerator {
    pub fn new(alphabet: &str, length: usize) -> Result<Self, GeneratorError> {
        check_length(length)?;
        Ok(Self {
            alphabet: parse_alphabet(alphabet)?,
            length,
        })
    }

    pub fn url_safe(length: usize) -> Result<Self, GeneratorError> {
        Self::new(URL_SAFE_ALPHABET, length)
    }

    pub fn alphanumeric(length: usize) -> Result<Self, GeneratorError> {
        Self::new(ALPHANUMERIC_ALPHABET, length)
    }

    pub fn numeric(length: usize) -> Result<Self, GeneratorError> {
        Self::new(NUMERIC_ALPHABET, length)
    }

    /// Generates a code of the default length.
    pub fn generate(&self) -> String {
        secure_string(&mut rand::rng(), &self.alphabet, self.length)
    }

    /// Generates a code of `length` characters, overriding the default for
    /// this call only.
    pub fn generate_with_length(&self, length: usize) -> Result<String, GeneratorError> {
        check_length(length)?;
        Ok(secure_string(&mut rand::rng(), &self.alphabet, length))
    }

    /// Replaces the alphabet. `None` restores [`URL_SAFE_ALPHABET`].
    pub fn set_alphabet(&mut self, alphabet: Option<&str>) -> Result<(), GeneratorError> {
        self.alphabet = parse_alphabet(alphabet.unwrap_or(URL_SAFE_ALPHABET))?;
        Ok(())
    }

    pub fn set_default_length(&mut self, length: usize) -> Result<(), GeneratorError> {
        check_length(length)?;
        self.length = length;
        Ok(())
    }

    pub fn alphabet(&self) -> String {
        self.alphabet.iter().collect()
    }

    pub fn default_length(&self) -> usize {
        self.length
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            alphabet: URL_SAFE_ALPHABET.chars().collect(),
            length: DEFAULT_LENGTH,
        }
    }
}

fn check_length(length: usize) -> Result<(), GeneratorError> {
    if length < 1 {
        return Err(GeneratorError::InvalidConfiguration(
            "length must be an integer >= 1".to_string(),
        ));
    }
    Ok(())
}

fn parse_alphabet(alphabet: &str) -> Result<Vec<char>, GeneratorError> {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.len() < MIN_ALPHABET_LEN {
        return Err(GeneratorError::InvalidConfiguration(format!(
            "alphabet must have at least {} characters",
            MIN_ALPHABET_LEN
        )));
    }
    if chars.len() > MAX_ALPHABET_LEN {
        return Err(GeneratorError::InvalidConfiguration(format!(
            "alphabet must have at most {} characters",
            MAX_ALPHABET_LEN
        )));
    }
    // a repeated symbol would be drawn more often than the others
    let mut seen = HashSet::with_capacity(chars.len());
    if let Some(dup) = chars.iter().find(|c| !seen.insert(**c)) {
        return Err(GeneratorError::InvalidConfiguration(format!(
            "alphabet contains {:?} more than once",
            dup
        )));
    }
    Ok(chars)
}

/// Draws `length` characters from `alphabet` by rejection sampling.
///
/// Each random unit is masked down to the smallest power of two covering the
/// alphabet; values past the end of the alphabet are discarded. The mask makes
/// every draw at least 50% likely to be accepted, so the loop terminates.
fn secure_string<R>(rng: &mut R, alphabet: &[char], length: usize) -> String
where
    R: CryptoRng + ?Sized,
{
    let size = alphabet.len();
    let mask = size.next_power_of_two() - 1;
    // alphabets past 256 characters need two bytes per index
    let width = if mask > usize::from(u8::MAX) { 2 } else { 1 };
    // ~1.6x the expected number of draws, so a second batch is rare
    let step = (8 * mask * length) / (5 * size) + 1;

    let mut buf = vec![0u8; step * width];
    let mut code = String::with_capacity(length);
    let mut accepted = 0;

    loop {
        rng.fill_bytes(&mut buf);
        for unit in buf.chunks_exact(width) {
            let raw = unit
                .iter()
                .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
            if let Some(ch) = alphabet.get(raw & mask) {
                code.push(*ch);
                accepted += 1;
                if accepted == length {
                    return code;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_default_generator() {
        let generator = CodeGenerator::default();
        assert_eq!(generator.default_length(), DEFAULT_LENGTH);
        assert_eq!(generator.alphabet(), URL_SAFE_ALPHABET);

        let code = generator.generate();
        assert_eq!(code.chars().count(), 6);
        assert!(code.chars().all(|c| URL_SAFE_ALPHABET.contains(c)));
    }

    #[test]
    fn test_url_safe_alphabet_has_64_unique_chars() {
        let unique: HashSet<char> = URL_SAFE_ALPHABET.chars().collect();
        assert_eq!(unique.len(), 64);
    }

    #[test]
    fn test_generated_length_and_membership() {
        for alphabet in ["ab", NUMERIC_ALPHABET, ALPHANUMERIC_ALPHABET, "xyz"] {
            let generator = CodeGenerator::new(alphabet, 6).unwrap();
            for length in [1, 2, 7, 20, 64] {
                let code = generator.generate_with_length(length).unwrap();
                assert_eq!(code.chars().count(), length);
                assert!(code.chars().all(|c| alphabet.contains(c)));
            }
        }
    }

    #[test]
    fn test_wide_alphabet_uses_every_index() {
        // 300 distinct characters forces the two-byte path
        let alphabet: String = (0..300u32)
            .filter_map(|i| char::from_u32(0x4E00 + i))
            .collect();
        let generator = CodeGenerator::new(&alphabet, 8).unwrap();

        let code = generator.generate_with_length(5_000).unwrap();
        assert_eq!(code.chars().count(), 5_000);
        assert!(code.chars().all(|c| alphabet.contains(c)));

        let seen: HashSet<char> = code.chars().collect();
        // with 5000 draws over 300 symbols, missing any is vanishingly unlikely
        assert_eq!(seen.len(), 300);
    }

    #[test]
    fn test_presets() {
        let code = CodeGenerator::numeric(8).unwrap().generate();
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code = CodeGenerator::alphanumeric(8).unwrap().generate();
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));

        let code = CodeGenerator::url_safe(12).unwrap().generate();
        assert_eq!(code.len(), 12);
    }

    #[test]
    fn test_invalid_length() {
        assert!(matches!(
            CodeGenerator::new(URL_SAFE_ALPHABET, 0),
            Err(GeneratorError::InvalidConfiguration(_))
        ));

        let generator = CodeGenerator::default();
        assert!(generator.generate_with_length(0).is_err());
    }

    #[test]
    fn test_invalid_alphabet() {
        assert!(CodeGenerator::new("", 6).is_err());
        assert!(CodeGenerator::new("a", 6).is_err());
        assert!(CodeGenerator::new("aa", 6).is_err());
        assert!(CodeGenerator::new("abcda", 6).is_err());

        let too_big: String = (0..1025u32)
            .filter_map(|i| char::from_u32(0x4E00 + i))
            .collect();
        assert_eq!(too_big.chars().count(), 1025);
        assert!(CodeGenerator::new(&too_big, 6).is_err());

        let max: String = too_big.chars().take(MAX_ALPHABET_LEN).collect();
        assert!(CodeGenerator::new(&max, 6).is_ok());
    }

    #[test]
    fn test_setters_validate() {
        let mut generator = CodeGenerator::default();

        generator.set_default_length(10).unwrap();
        assert_eq!(generator.generate().len(), 10);
        assert!(generator.set_default_length(0).is_err());
        assert_eq!(generator.default_length(), 10);

        generator.set_alphabet(Some("01")).unwrap();
        assert!(generator.generate().chars().all(|c| c == '0' || c == '1'));
        assert!(generator.set_alphabet(Some("z")).is_err());
        assert!(generator.set_alphabet(Some("0101")).is_err());
        assert_eq!(generator.alphabet(), "01");

        generator.set_alphabet(None).unwrap();
        assert_eq!(generator.alphabet(), URL_SAFE_ALPHABET);
    }

    /// Chi-square goodness of fit over 100k single-character draws.
    ///
    /// A ten-symbol alphabet under an unmasked `byte % 10` would favour
    /// 0..=5 (26/256 vs 25/256), which pushes the statistic near 36.
    #[test]
    fn test_uniform_distribution() {
        const DRAWS: usize = 100_000;
        // 0.9999 quantile of chi-square with 9 degrees of freedom
        const CRITICAL: f64 = 33.72;

        let generator = CodeGenerator::numeric(1).unwrap();
        let mut counts: HashMap<char, usize> = HashMap::new();
        for _ in 0..DRAWS {
            for c in generator.generate().chars() {
                *counts.entry(c).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 10);
        let expected = DRAWS as f64 / 10.0;
        let chi_square: f64 = counts
            .values()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        assert!(
            chi_square < CRITICAL,
            "chi-square {chi_square:.2} exceeds {CRITICAL}: {counts:?}"
        );
    }
}
