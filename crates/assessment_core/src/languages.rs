//! crates/assessment_core/src/languages.rs
//!
//! Static ISO 639 code to English name table, plus the small helpers the
//! web layer and generation prompts use to turn codes into readable names.

use crate::domain::LanguageCode;

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("tr", "Turkish"),
    ("pl", "Polish"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("el", "Greek"),
    ("he", "Hebrew"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("tl", "Filipino"),
    ("cs", "Czech"),
    ("sk", "Slovak"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("bg", "Bulgarian"),
    ("hr", "Croatian"),
    ("sr", "Serbian"),
    ("sl", "Slovenian"),
    ("et", "Estonian"),
    ("lv", "Latvian"),
    ("lt", "Lithuanian"),
    ("uk", "Ukrainian"),
    ("be", "Belarusian"),
    ("ka", "Georgian"),
    ("hy", "Armenian"),
    ("az", "Azerbaijani"),
    ("kk", "Kazakh"),
    ("ky", "Kyrgyz"),
    ("uz", "Uzbek"),
    ("mn", "Mongolian"),
    ("ne", "Nepali"),
    ("si", "Sinhala"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("bn", "Bengali"),
    ("gu", "Gujarati"),
    ("pa", "Punjabi"),
    ("ur", "Urdu"),
    ("fa", "Persian"),
    ("ps", "Pashto"),
    ("ku", "Kurdish"),
    ("am", "Amharic"),
    ("ti", "Tigrinya"),
    ("om", "Oromo"),
    ("so", "Somali"),
    ("sw", "Swahili"),
    ("zu", "Zulu"),
    ("xh", "Xhosa"),
    ("af", "Afrikaans"),
    ("sq", "Albanian"),
    ("eu", "Basque"),
    ("ca", "Catalan"),
    ("gl", "Galician"),
    ("is", "Icelandic"),
    ("ga", "Irish"),
    ("mt", "Maltese"),
    ("cy", "Welsh"),
    ("br", "Breton"),
    ("gd", "Scottish Gaelic"),
    ("fo", "Faroese"),
    ("lb", "Luxembourgish"),
    ("rm", "Romansh"),
    ("mi", "Maori"),
    ("sm", "Samoan"),
    ("to", "Tongan"),
    ("fj", "Fijian"),
    ("haw", "Hawaiian"),
    ("mg", "Malagasy"),
    ("ny", "Chichewa"),
    ("sn", "Shona"),
    ("st", "Sesotho"),
    ("tn", "Setswana"),
    ("ts", "Tsonga"),
    ("ve", "Venda"),
    ("ss", "Swati"),
    ("nr", "Ndebele"),
    ("nso", "Northern Sotho"),
    ("wo", "Wolof"),
    ("yo", "Yoruba"),
    ("ig", "Igbo"),
    ("ha", "Hausa"),
    ("ff", "Fulah"),
    ("lg", "Luganda"),
    ("rw", "Kinyarwanda"),
    ("rn", "Kirundi"),
    ("ln", "Lingala"),
    ("sg", "Sango"),
    ("kg", "Kongo"),
    ("ak", "Akan"),
    ("tw", "Twi"),
    ("bm", "Bambara"),
    ("my", "Burmese"),
    ("km", "Khmer"),
    ("lo", "Lao"),
    ("dz", "Dzongkha"),
    ("bo", "Tibetan"),
    ("ug", "Uyghur"),
    ("yi", "Yiddish"),
    ("ji", "Yiddish"),
    ("eo", "Esperanto"),
    ("ia", "Interlingua"),
    ("ie", "Interlingue"),
    ("io", "Ido"),
    ("vo", "Volapük"),
    ("la", "Latin"),
    ("sa", "Sanskrit"),
    ("pi", "Pali"),
    ("grc", "Ancient Greek"),
    ("got", "Gothic"),
    ("non", "Old Norse"),
    ("gmh", "Middle High German"),
    ("ang", "Old English"),
    ("sga", "Old Irish"),
    ("goh", "Old High German"),
    ("osx", "Old Saxon"),
    ("chu", "Church Slavonic"),
];

/// Looks up the English name for a code (case-insensitive).
pub fn language_name(code: &str) -> Option<&'static str> {
    let normalized = code.trim().to_ascii_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == normalized)
        .map(|(_, name)| *name)
}

/// Name to show for a code: the table entry, or the code upper-cased when unknown.
pub fn display_name(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return "Unknown Language".to_string();
    }
    language_name(trimmed)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_uppercase())
}

/// Name used when prompting a generator for `code`, falling back to the caller's input.
pub(crate) fn prompt_name(code: &LanguageCode, original_input: &str) -> String {
    match language_name(code.as_str()) {
        Some(name) => name.to_string(),
        None if !original_input.trim().is_empty() => normalize_language_name(original_input),
        None => code.as_str().to_uppercase(),
    }
}

/// Turns either a code or a full name into a display name.
///
/// Inputs longer than two characters are treated as names and capitalized;
/// anything shorter goes through the code table.
pub fn normalize_language_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return "English".to_string();
    }
    if trimmed.chars().count() > 2 {
        let mut chars = trimmed.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        };
    }
    display_name(trimmed)
}

/// True when `input` looks like a code (2 or 3 ASCII letters, surrounding whitespace ignored).
pub fn is_language_code(input: &str) -> bool {
    let trimmed = input.trim();
    (2..=3).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_alphabetic())
}

pub fn supported_language_codes() -> impl Iterator<Item = &'static str> {
    LANGUAGE_NAMES.iter().map(|(code, _)| *code)
}

pub fn supported_language_names() -> impl Iterator<Item = &'static str> {
    LANGUAGE_NAMES.iter().map(|(_, name)| *name)
}
