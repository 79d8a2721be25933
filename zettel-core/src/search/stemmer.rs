//! English stemming, backed by the Snowball stemmer from `rust-stemmers`.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

static ENGLISH: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Reduce a lowercase term to its stem
pub fn stem(term: &str) -> String {
    ENGLISH.stem(term).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plurals_and_participles() {
        assert_eq!(stem("caresses"), "caress");
        assert_eq!(stem("ponies"), "poni");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("sets"), "set");
        assert_eq!(stem("hopping"), "hop");
    }

    #[test]
    fn test_domain_terms_share_stems() {
        assert_eq!(stem("topology"), stem("topological"));
        assert_eq!(stem("spaces"), "space");
        assert_eq!(stem("continuous"), stem("continuity"));
        assert_eq!(stem("union"), "union");
        assert_eq!(stem("cauchy"), "cauchi");
    }

    #[test]
    fn test_short_words_untouched() {
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("the"), "the");
    }
}
