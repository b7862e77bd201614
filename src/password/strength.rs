//! Heuristic password strength.
//!
//! This is a quick scorer for user feedback, not an entropy estimate.
//! Points are awarded for length tiers (8, 12, 16) and character-class
//! diversity (2, 3, 4 classes); points are taken away for single-class
//! passwords, one dominant character, repeated or sequential runs, and
//! runs lifted from a QWERTY keyboard row.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ALL_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static ALL_LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());

const KEYBOARD_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strength {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=1 => Strength::VeryWeak,
            2 => Strength::Weak,
            3 => Strength::Medium,
            4 => Strength::Strong,
            _ => Strength::VeryStrong,
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strength::VeryWeak => "very weak",
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
            Strength::VeryStrong => "very strong",
        })
    }
}

pub fn evaluate(password: &str) -> Strength {
    Strength::from_score(score(password))
}

/// Raw heuristic score; `evaluate` buckets it.
pub fn score(password: &str) -> i32 {
    let chars: Vec<char> = password.chars().collect();
    if chars.is_empty() {
        return 0;
    }

    let mut score = [8, 12, 16].iter().filter(|&&n| chars.len() >= n).count() as i32;

    let classes = [
        chars.iter().any(|c| c.is_lowercase()),
        chars.iter().any(|c| c.is_uppercase()),
        chars.iter().any(|c| c.is_ascii_digit()),
        chars.iter().any(|c| !c.is_alphanumeric()),
    ]
    .iter()
    .filter(|&&present| present)
    .count();
    score += [2, 3, 4].iter().filter(|&&n| classes >= n).count() as i32;

    if ALL_DIGITS.is_match(password) || ALL_LETTERS.is_match(password) {
        score -= 1;
    }
    if dominant_char(&chars) {
        score -= 1;
    }
    if has_repeated_run(&chars) {
        score -= 1;
    }
    if has_sequential_run(&chars) {
        score -= 1;
    }
    score -= keyboard_rows_hit(password);

    score
}

/// More than a quarter of the password is one character.
fn dominant_char(chars: &[char]) -> bool {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for &c in chars {
        *counts.entry(c).or_default() += 1;
    }
    counts.values().any(|&n| n * 4 > chars.len())
}

/// Three or more identical characters in a row.
fn has_repeated_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Three consecutive letters or digits in ascending or descending order
/// ("abc", "321").
fn has_sequential_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| {
        if !w.iter().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        let [a, b, c] = [w[0], w[1], w[2]].map(|ch| ch.to_ascii_lowercase() as i32);
        (b - a == 1 && c - b == 1) || (a - b == 1 && b - c == 1)
    })
}

/// Number of QWERTY rows containing some 3-character run of the password.
fn keyboard_rows_hit(password: &str) -> i32 {
    let lower: Vec<char> = password.to_lowercase().chars().collect();
    let windows: Vec<String> = lower.windows(3).map(|w| w.iter().collect()).collect();

    KEYBOARD_ROWS
        .iter()
        .filter(|row| windows.iter().any(|w| row.contains(w.as_str())))
        .count() as i32
}
