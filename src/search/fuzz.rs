//! Partial-ratio fuzzy matching.
//!
//! Scores are on a 0-100 scale. `ratio` is the normalized indel similarity
//! `2 * LCS / (len_a + len_b)`; `partial_ratio` slides the shorter string over
//! the longer one and keeps the best window, so extra characters on either side
//! of the match do not lower the score.

use unicode_normalization::UnicodeNormalization;

/// Lower-case and NFC-normalize text for comparison.
pub fn prepare(s: &str) -> Vec<char> {
    s.nfc().collect::<String>().to_lowercase().chars().collect()
}

/// Longest common subsequence length, O(min) space.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let (a, b) = if a.len() < b.len() { (b, a) } else { (a, b) };
    if b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Indel similarity of two char slices, 0-100.
pub fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_length(a, b)) as f64 / total as f64
}

/// Best window similarity of two prepared strings, 0-100.
pub fn partial_ratio_chars(s1: &[char], s2: &[char]) -> f64 {
    if s1.is_empty() && s2.is_empty() {
        return 100.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let (shorter, longer) = if s1.len() <= s2.len() { (s1, s2) } else { (s2, s1) };
    if shorter.len() == longer.len() {
        return ratio_chars(shorter, longer);
    }
    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        best = best.max(ratio_chars(shorter, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Partial ratio of two raw strings, case and normalization insensitive.
pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    partial_ratio_chars(&prepare(s1), &prepare(s2))
}
