//! Language detection consumed by the event layer.
//!
//! The pipeline treats detection as an opaque `detect(text) -> (code,
//! confidence)` call behind the [`LanguageDetector`] trait; the default
//! implementation wraps whatlang with a short-phrase heuristic table for
//! greetings the statistical detector gets wrong.

use whatlang::Lang;

/// Languages the relay is prepared to translate between.
pub const SUPPORTED_LANGS: [&str; 16] = [
    "en", "es", "fr", "de", "ja", "ko", "zh", "hi", "ar", "ru", "pt", "it", "nl", "pl", "sv", "tr",
];

/// Outcome of one detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO-639-1 code, empty when detection was inconclusive.
    pub language: String,
    pub confidence: f64,
}

impl Detection {
    fn none() -> Self {
        Self {
            language: String::new(),
            confidence: 0.0,
        }
    }
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

/// whatlang-backed detector.
pub struct WhatlangDetector;

// High-frequency greetings where trigram detection is unreliable.
const HEURISTICS: [(&str, &str, f64); 3] = [
    ("bonjour", "fr", 0.95),
    ("hola", "es", 0.95),
    ("hello", "en", 0.95),
];

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        let cleaned = text.trim();
        if cleaned.is_empty() {
            return Detection::none();
        }

        let lowered = cleaned.to_lowercase();
        for (token, lang, confidence) in HEURISTICS {
            if lowered == token {
                return Detection {
                    language: lang.to_string(),
                    confidence,
                };
            }
        }

        // Long messages detect fine from a prefix; cap the work.
        let sample: String = cleaned.chars().take(400).collect();
        match whatlang::detect(&sample) {
            Some(info) => Detection {
                language: lang_to_code(info.lang()),
                confidence: info.confidence(),
            },
            None => Detection::none(),
        }
    }
}

fn lang_to_code(lang: Lang) -> String {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Hin => "hi",
        Lang::Ara => "ar",
        Lang::Rus => "ru",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Swe => "sv",
        Lang::Tur => "tr",
        other => return other.code().to_string(),
    }
    .to_string()
}

/// Whether a code is one the relay translates between.
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGS.contains(&code.to_lowercase().as_str())
}
