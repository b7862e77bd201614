//! Random password generation.
//!
//! Lower-case letters are always in the pool; upper-case, digits and
//! symbols are added per request.  Every requested class is guaranteed at
//! least one character: one random position is reserved per class, the
//! rest is drawn uniformly from the combined pool, and the result is
//! shuffled once more so reserved positions carry no pattern.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &[u8] = b"0123456789";
pub const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{}\\|;:'\",.<>/?`~";

/// Length used when the caller asks for zero characters.
pub const DEFAULT_LENGTH: usize = 16;

/// Which character classes a generated password must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharClasses {
    pub special: bool,
    pub numbers: bool,
    pub mixed_case: bool,
}

impl Default for CharClasses {
    fn default() -> Self {
        Self {
            special: true,
            numbers: true,
            mixed_case: true,
        }
    }
}

impl CharClasses {
    fn sets(&self) -> Vec<&'static [u8]> {
        let mut sets = vec![LOWERCASE];
        if self.mixed_case {
            sets.push(UPPERCASE);
        }
        if self.numbers {
            sets.push(DIGITS);
        }
        if self.special {
            sets.push(SYMBOLS);
        }
        sets
    }
}

/// Generate a password of `length` characters.
///
/// A `length` of zero falls back to `DEFAULT_LENGTH`; a length shorter
/// than the number of requested classes is raised to that number.
pub fn generate(length: usize, classes: CharClasses) -> Zeroizing<String> {
    let sets = classes.sets();
    let requested = if length == 0 { DEFAULT_LENGTH } else { length };
    let length = requested.max(sets.len());
    let pool: Vec<u8> = sets.concat();

    let mut rng = rand::rng();
    let mut chars = Zeroizing::new(
        (0..length)
            .map(|_| pool[rng.random_range(0..pool.len())])
            .collect::<Vec<u8>>(),
    );

    let mut positions: Vec<usize> = (0..length).collect();
    positions.shuffle(&mut rng);
    for (set, &pos) in sets.iter().zip(&positions) {
        chars[pos] = set[rng.random_range(0..set.len())];
    }

    chars.shuffle(&mut rng);
    Zeroizing::new(chars.iter().map(|&b| char::from(b)).collect())
}
