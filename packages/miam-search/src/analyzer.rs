//! Language-aware text analyzer for recipe fields
//!
//! Pipeline:
//!
//! 1. `SimpleTokenizer`: split on non-alphanumeric characters
//! 2. `RemoveLongFilter`: drop tokens over 40 bytes
//! 3. `LowerCaser`
//! 4. `StopWordFilter`: language stop words ("de", "la", "the", ...)
//! 5. `Stemmer`: Snowball stemming ("tomates" → "tomat")
//! 6. `AsciiFoldingFilter`: "crème" and "creme" index the same
//!
//! Removed stop words keep their position slot, so a phrase query built
//! from the same pipeline still lines up with the indexed positions.

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{
    AsciiFoldingFilter, Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer,
    StopWordFilter, TextAnalyzer, TokenStream,
};
use tantivy::Index;

/// Name the analyzer is registered under on every index
pub const RECIPE_ANALYZER: &str = "miam_text";

const MAX_TOKEN_LEN: usize = 40;

/// Languages the recipe analyzer can stem and filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerLanguage {
    #[default]
    French,
    English,
}

impl AnalyzerLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerLanguage::French => "french",
            AnalyzerLanguage::English => "english",
        }
    }

    fn tantivy_language(self) -> Language {
        match self {
            AnalyzerLanguage::French => Language::French,
            AnalyzerLanguage::English => Language::English,
        }
    }
}

impl std::fmt::Display for AnalyzerLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the recipe analyzer for `language`.
pub fn build_recipe_analyzer(language: AnalyzerLanguage) -> TextAnalyzer {
    let language = language.tantivy_language();
    let stop_words =
        StopWordFilter::new(language).unwrap_or_else(|| StopWordFilter::remove(Vec::new()));

    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
        .filter(LowerCaser)
        .filter(stop_words)
        .filter(Stemmer::new(language))
        .filter(AsciiFoldingFilter)
        .build()
}

/// Register the recipe analyzer on `index`.
///
/// Tokenizers are not persisted with the index, so this runs on every open.
pub fn register_recipe_analyzer(index: &Index, language: AnalyzerLanguage) {
    index
        .tokenizers()
        .register(RECIPE_ANALYZER, build_recipe_analyzer(language));
}

/// Tokens produced for `text`, with their positions
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut stream = analyzer.token_stream(text);
    stream.process(&mut |token| tokens.push((token.position, token.text.clone())));
    tokens
}
