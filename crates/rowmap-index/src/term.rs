//! Search-term keyboard-layout normalization.
//!
//! A search that finds nothing was often typed in the wrong keyboard
//! layout: a user meaning "привет" with a Latin layout active produces
//! "ghbdtn". The zero-hit retry swaps every character between the QWERTY
//! and ЙЦУКЕН layouts, in both directions.

/// QWERTY key and the ЙЦУКЕН character on the same key.
const PAIRS: &[(char, char)] = &[
    ('q', 'й'),
    ('w', 'ц'),
    ('e', 'у'),
    ('r', 'к'),
    ('t', 'е'),
    ('y', 'н'),
    ('u', 'г'),
    ('i', 'ш'),
    ('o', 'щ'),
    ('p', 'з'),
    ('[', 'х'),
    (']', 'ъ'),
    ('a', 'ф'),
    ('s', 'ы'),
    ('d', 'в'),
    ('f', 'а'),
    ('g', 'п'),
    ('h', 'р'),
    ('j', 'о'),
    ('k', 'л'),
    ('l', 'д'),
    (';', 'ж'),
    ('\'', 'э'),
    ('z', 'я'),
    ('x', 'ч'),
    ('c', 'с'),
    ('v', 'м'),
    ('b', 'и'),
    ('n', 'т'),
    ('m', 'ь'),
    (',', 'б'),
    ('.', 'ю'),
    ('/', '.'),
];

fn map_char(c: char) -> Option<char> {
    for (latin, cyrillic) in PAIRS {
        if c == *latin {
            return Some(*cyrillic);
        }
        if c == *cyrillic {
            return Some(*latin);
        }
    }
    None
}

/// Transpose a term between the QWERTY and ЙЦУКЕН layouts.
///
/// Characters on neither layout (digits, spaces) pass through unchanged;
/// case is preserved.
#[must_use]
pub fn switch_keyboard_layout(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if let Some(mapped) = map_char(c) {
            out.push(mapped);
            continue;
        }

        let mut lower = c.to_lowercase();
        let lowered = lower.next();
        if lower.next().is_none() {
            if let Some(mapped) = lowered.and_then(map_char) {
                if c.is_uppercase() {
                    out.extend(mapped.to_uppercase());
                    continue;
                }
            }
        }

        out.push(c);
    }
    out
}
