//! Text normalization shared by the classifier and the extractors.
//!
//! Two levels are provided:
//! - [`normalize_text`] folds spelling variants but keeps punctuation, so
//!   extractors can still see `+966`, `ر.س` and e-mail addresses.
//! - [`clean_text`] additionally replaces punctuation with spaces and is the
//!   input of intent scoring.

/// Lowercase, strip Arabic diacritics and tatweel, fold alef variants and
/// Arabic-Indic digits, and collapse whitespace.
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            // Harakat, superscript alef, tatweel.
            '\u{064B}'..='\u{0652}' | '\u{0670}' | '\u{0640}' => {}
            'أ' | 'إ' | 'آ' | 'ٱ' => out.push('ا'),
            '\u{0660}'..='\u{0669}' => out.push(fold_digit(ch, 0x0660)),
            '\u{06F0}'..='\u{06F9}' => out.push(fold_digit(ch, 0x06F0)),
            '٫' => out.push('.'),
            '،' => out.push(','),
            '؟' => out.push('?'),
            c => out.extend(c.to_lowercase()),
        }
    }
    collapse_whitespace(&out)
}

/// [`normalize_text`] plus punctuation and symbols replaced by spaces.
pub fn clean_text(input: &str) -> String {
    let normalized = normalize_text(input);
    let stripped: String = normalized
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&stripped)
}

fn fold_digit(ch: char, zero: u32) -> char {
    char::from_digit(ch as u32 - zero, 10).unwrap_or(ch)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics_and_tatweel() {
        assert_eq!(normalize_text("شُحْنَـــة"), "شحنة");
    }

    #[test]
    fn test_folds_alef_variants() {
        assert_eq!(normalize_text("أنشئ إلغاء آخر"), "انشئ الغاء اخر");
    }

    #[test]
    fn test_folds_arabic_indic_digits() {
        assert_eq!(normalize_text("١٢٣٤٥٦٧٨"), "12345678");
        assert_eq!(normalize_text("۰۵۰"), "050");
    }

    #[test]
    fn test_lowercases_and_collapses() {
        assert_eq!(normalize_text("  Track   MY\tShipment "), "track my shipment");
    }

    #[test]
    fn test_normalize_keeps_punctuation() {
        assert_eq!(normalize_text("+966 500 ر.س"), "+966 500 ر.س");
    }

    #[test]
    fn test_clean_strips_punctuation() {
        assert_eq!(clean_text("تتبع الشحنة، رقم: 123!"), "تتبع الشحنة رقم 123");
        assert_eq!(clean_text("وين شحنتي؟؟ 📦"), "وين شحنتي");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("?!."), "");
    }
}
