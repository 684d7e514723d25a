/// Live verdict on the typed buffer, recomputed from scratch on every
/// keystroke. A true character mismatch anywhere outranks case-only slips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Clean,
    CaseMismatch,
    CharMismatch,
}

/// Position-by-position comparison of the typed buffer against the target,
/// up to the shorter of the two. Characters typed past the end of the target
/// are ignored here (they still count toward the character-based speed).
pub fn classify(typed: &str, target: &str) -> Classification {
    let mut case_slip = false;

    for (typed_char, expected_char) in typed.chars().zip(target.chars()) {
        if typed_char != expected_char {
            if typed_char.to_lowercase().eq(expected_char.to_lowercase()) {
                case_slip = true;
            } else {
                return Classification::CharMismatch;
            }
        }
    }

    if case_slip {
        Classification::CaseMismatch
    } else {
        Classification::Clean
    }
}

/// Character-based speed: five typed characters count as one word unit.
/// Used when a trial ends by timeout or a manual stop.
pub fn chars_per_min(typed_chars: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        (typed_chars as f64 / 5.0) / (elapsed_secs / 60.0)
    } else {
        0.0
    }
}

/// Word-count speed, used when a trial ends by typing the target exactly.
pub fn words_per_min(words: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        words as f64 / elapsed_secs * 60.0
    } else {
        0.0
    }
}
