//! TF-IDF vectorizer for recipe text.
//!
//! Turns each recipe's "cook method + ingredients + diet labels" text into an
//! L2-normalized sparse term-weight vector.
//!
//! ## Pipeline
//! 1. Lowercase, then split into tokens of two or more word characters
//! 2. Drop English stop words
//! 3. Emit word n-grams (1 to 3 by default), joined with a single space
//! 4. Keep terms whose document frequency lies within `[min_df, max_df]`
//!    (both proportions of the corpus size)
//! 5. Weight by raw term count × smoothed idf, `ln((1 + n) / (1 + df)) + 1`
//! 6. L2-normalize each row

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// English stop words removed before n-grams are formed.
///
/// Single-letter entries are omitted; the tokenizer never yields them.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
    "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
    "did", "doing", "an", "the", "and", "but", "if", "or", "because", "as", "until",
    "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
    "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very", "can", "will", "just", "don", "should", "now", "ll", "re",
    "ve", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma",
    "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(&token)
}

/// Lowercase `text` and split it into runs of two or more word characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_string())
        .collect()
}

/// Word n-grams of every length in `min_n..=max_n`, shorter grams first
pub fn word_ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

/// Sparse row vector with strictly increasing indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Dot product against a dense vector of matching dimension
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&idx, &value)| value * dense.get(idx).copied().unwrap_or(0.0))
            .sum()
    }

    /// Dot product against another sparse vector
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut total = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    total += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        total
    }
}

/// TF-IDF vectorizer with a vocabulary frozen by `fit_transform`
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    ngram_range: (usize, usize),
    min_df: f64,
    max_df: f64,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            ngram_range: (1, 3),
            min_df: 0.01,
            max_df: 0.8,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Configure the n-gram lengths (default: 1 to 3)
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Minimum document frequency as a proportion of documents (default: 0.01)
    pub fn with_min_df(mut self, min_df: f64) -> Self {
        self.min_df = min_df;
        self
    }

    /// Maximum document frequency as a proportion of documents (default: 0.8)
    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df;
        self
    }

    /// Number of terms kept in the vocabulary
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Vocabulary terms in feature-index order
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.idf.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.as_str();
        }
        names
    }

    fn analyze(&self, doc: &str) -> Vec<String> {
        let tokens: Vec<String> = tokenize(doc)
            .into_iter()
            .filter(|token| !is_stop_word(token))
            .collect();
        word_ngrams(&tokens, self.ngram_range.0, self.ngram_range.1)
    }

    fn term_counts(&self, doc: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for gram in self.analyze(doc) {
            *counts.entry(gram).or_insert(0) += 1;
        }
        counts
    }

    /// Learn vocabulary and idf from `documents`, then vectorize them.
    ///
    /// Returns one row per document, in input order. If pruning leaves no terms,
    /// every row is empty.
    pub fn fit_transform(&mut self, documents: &[String]) -> Vec<SparseVector> {
        let counts: Vec<HashMap<String, usize>> = documents
            .par_iter()
            .map(|doc| self.term_counts(doc))
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc_counts in &counts {
            for term in doc_counts.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len() as f64;
        let min_count = self.min_df * n_docs;
        let max_count = self.max_df * n_docs;

        let mut kept: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|&(_, df)| (df as f64) >= min_count && (df as f64) <= max_count)
            .collect();
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        self.vocabulary = kept
            .iter()
            .enumerate()
            .map(|(idx, (term, _))| (term.to_string(), idx))
            .collect();
        self.idf = kept
            .iter()
            .map(|&(_, df)| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        debug!(
            "TF-IDF vocabulary: {} terms kept from {} documents",
            self.idf.len(),
            documents.len()
        );

        counts
            .par_iter()
            .map(|doc_counts| self.weigh(doc_counts))
            .collect()
    }

    /// Vectorize a new document against the frozen vocabulary
    pub fn transform(&self, document: &str) -> SparseVector {
        self.weigh(&self.term_counts(document))
    }

    fn weigh(&self, counts: &HashMap<String, usize>) -> SparseVector {
        let mut entries: Vec<(usize, f64)> = counts
            .iter()
            .filter_map(|(term, &tf)| {
                self.vocabulary
                    .get(term)
                    .map(|&idx| (idx, tf as f64 * self.idf[idx]))
            })
            .collect();
        entries.sort_unstable_by_key(|&(idx, _)| idx);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }

        let (indices, values) = entries.into_iter().unzip();
        SparseVector { indices, values }
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}
