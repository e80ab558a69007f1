use crate::models::{DocumentDetail, DocumentSummary};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const TOP_TOKEN_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    pub token: String,
    pub count: usize,
}

/// Lexical statistics for one document. Built fresh by [`analyze`] for every document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub original_word_count: usize,
    pub unique_original_words: usize,
    pub processed_word_count: usize,
    pub unique_processed_words: usize,
    pub token_count: usize,
    pub unique_tokens: usize,
    pub token_frequency: HashMap<String, usize>,
    pub top_tokens: Vec<TokenCount>,
    pub reduction_percentage: f64,
    pub avg_word_length: f64,
    pub paragraph_count: usize,
    pub char_count: usize,
    pub char_count_no_spaces: usize,
}

pub fn analyze(doc: &DocumentDetail) -> AnalyticsReport {
    let original_words: Vec<&str> = doc.original_text.split_whitespace().collect();
    let unique_original_words = original_words
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<HashSet<_>>()
        .len();

    let processed_words: Vec<&str> = doc.processed_text.split_whitespace().collect();
    let unique_processed_words = processed_words.iter().collect::<HashSet<_>>().len();

    let counts = count_in_first_seen_order(&doc.tokens);
    let top_tokens = top_tokens(&counts, TOP_TOKEN_LIMIT);
    let token_count = doc.tokens.len();

    let reduction_percentage = if original_words.is_empty() {
        0.0
    } else {
        let removed = original_words.len() as f64 - token_count as f64;
        round_one_decimal(removed / original_words.len() as f64 * 100.0).clamp(0.0, 100.0)
    };

    let avg_word_length = if token_count == 0 {
        0.0
    } else {
        let total_chars: usize = doc.tokens.iter().map(|token| token.chars().count()).sum();
        round_one_decimal(total_chars as f64 / token_count as f64)
    };

    AnalyticsReport {
        original_word_count: original_words.len(),
        unique_original_words,
        processed_word_count: processed_words.len(),
        unique_processed_words,
        token_count,
        unique_tokens: counts.len(),
        token_frequency: counts
            .iter()
            .map(|entry| (entry.token.clone(), entry.count))
            .collect(),
        top_tokens,
        reduction_percentage,
        avg_word_length,
        paragraph_count: paragraphs(&doc.original_text).len(),
        char_count: doc.original_text.chars().count(),
        char_count_no_spaces: doc
            .original_text
            .chars()
            .filter(|character| !character.is_whitespace())
            .count(),
    }
}

/// Text runs separated by blank lines, trimmed, with empty runs dropped.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

fn count_in_first_seen_order(tokens: &[String]) -> Vec<TokenCount> {
    let mut positions = HashMap::<&str, usize>::new();
    let mut counts: Vec<TokenCount> = Vec::new();

    for token in tokens {
        match positions.get(token.as_str()) {
            Some(&position) => counts[position].count += 1,
            None => {
                positions.insert(token.as_str(), counts.len());
                counts.push(TokenCount {
                    token: token.clone(),
                    count: 1,
                });
            }
        }
    }

    counts
}

fn top_tokens(counts: &[TokenCount], limit: usize) -> Vec<TokenCount> {
    let mut ranked = counts.to_vec();
    // stable: equal counts keep first-occurrence order
    ranked.sort_by(|left, right| right.count.cmp(&left.count));
    ranked.truncate(limit);
    ranked
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub total_words: u64,
    pub avg_words: u64,
}

pub fn collection_stats(documents: &[DocumentSummary]) -> CollectionStats {
    let total_words: u64 = documents.iter().map(|doc| doc.word_count).sum();
    let avg_words = if documents.is_empty() {
        0
    } else {
        (total_words as f64 / documents.len() as f64).round() as u64
    };

    CollectionStats {
        total_documents: documents.len(),
        total_words,
        avg_words,
    }
}
