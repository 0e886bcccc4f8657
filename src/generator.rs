// src/generator.rs
use crate::error::{GeneratorError, GeneratorResult};
use crate::models::LastGenerated;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

const LETTER_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGIT_CHARS: &[u8] = b"0123456789";
const SPECIAL_CHARS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub length: usize,
    pub use_letters: bool,
    pub use_digits: bool,
    pub use_special: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            length: 12,
            use_letters: true,
            use_digits: true,
            use_special: true,
        }
    }
}

impl GenerationOptions {
    /// Builds options from a signed length. Negative lengths are rejected.
    pub fn new(length: i64, use_letters: bool, use_digits: bool, use_special: bool) -> GeneratorResult<Self> {
        let length = usize::try_from(length)
            .map_err(|_| GeneratorError::InvalidLength(length.to_string()))?;
        Ok(GenerationOptions { length, use_letters, use_digits, use_special })
    }

    /// Builds options from raw text, as typed into the length field.
    pub fn from_input(length: &str, use_letters: bool, use_digits: bool, use_special: bool) -> GeneratorResult<Self> {
        let trimmed = length.trim();
        let parsed: i64 = trimmed
            .parse()
            .map_err(|_| GeneratorError::InvalidLength(trimmed.to_string()))?;
        Self::new(parsed, use_letters, use_digits, use_special)
    }

    /// The character pool: letters, then digits, then specials.
    pub fn pool(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        if self.use_letters {
            pool.extend_from_slice(LETTER_CHARS);
        }
        if self.use_digits {
            pool.extend_from_slice(DIGIT_CHARS);
        }
        if self.use_special {
            pool.extend_from_slice(SPECIAL_CHARS);
        }
        pool
    }
}

/// Generates a password with the thread-local RNG. See `generate_password_with`.
pub fn generate_password(options: &GenerationOptions) -> String {
    generate_password_with(options, &mut thread_rng())
}

/// Draws `options.length` characters uniformly, with replacement, from the pool.
/// An empty pool yields an empty string; callers decide whether that's an error.
pub fn generate_password_with<R: Rng + ?Sized>(options: &GenerationOptions, rng: &mut R) -> String {
    let pool = options.pool();
    if pool.is_empty() {
        return String::new();
    }
    (0..options.length)
        .filter_map(|_| pool.choose(&mut *rng))
        .map(|&b| b as char)
        .collect()
}

/// Generate action used by the shells: an empty pool or an empty result is
/// a validation error rather than a password.
pub fn generate_for_shell(options: &GenerationOptions) -> GeneratorResult<LastGenerated> {
    if options.pool().is_empty() {
        return Err(GeneratorError::NoCharacterClassSelected);
    }
    let password = generate_password(options);
    if password.is_empty() {
        return Err(GeneratorError::InvalidLength(options.length.to_string()));
    }
    log::debug!("Generated a password of length {}", password.len());
    Ok(LastGenerated::new(password))
}
