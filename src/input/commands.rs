//! # Key Scripts
//!
//! Compact key sequences for headless play, e.g. `3d2sD q`.
//!
//! A run of digits repeats the key that follows it. Whitespace is ignored.

use crate::{BrambleError, BrambleResult};

/// Largest repeat count a script may ask for
pub const MAX_REPEAT: usize = 10_000;

/// Expands a key script into individual key presses.
///
/// # Examples
///
/// ```
/// use bramble::parse_script;
///
/// assert_eq!(parse_script("3d w").unwrap(), vec!['d', 'd', 'd', 'w']);
/// assert!(parse_script("4").is_err());
/// ```
pub fn parse_script(script: &str) -> BrambleResult<Vec<char>> {
    let mut keys = Vec::new();
    let mut count: Option<usize> = None;

    for c in script.chars().filter(|c| !c.is_whitespace()) {
        if let Some(digit) = c.to_digit(10) {
            let value = count.unwrap_or(0) * 10 + digit as usize;
            if value > MAX_REPEAT {
                return Err(BrambleError::InvalidAction(format!(
                    "repeat count above {} in key script",
                    MAX_REPEAT
                )));
            }
            count = Some(value);
            continue;
        }
        let repeat = count.take().unwrap_or(1);
        keys.extend(std::iter::repeat(c).take(repeat));
    }

    if count.is_some() {
        return Err(BrambleError::InvalidAction(
            "key script ends with a repeat count".to_string(),
        ));
    }
    Ok(keys)
}
