//! TF-IDF document ranking.
//!
//! Text goes through `ml::text::preprocess` (stop words dropped, job-title
//! words stemmed), and tokens are the runs of two or more word characters
//! left in each preprocessed word. IDF is smoothed
//! (`ln((1 + n) / (1 + df)) + 1`) and vectors are L2-normalised, so cosine
//! similarity is a plain dot product.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::ml::compile_regex;
use crate::ml::text::preprocess;

pub const MAX_FEATURES: usize = 5000;

static TOKEN: Lazy<Regex> = Lazy::new(|| compile_regex(r"\b\w\w+\b"));

#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("Ranking model has not been fitted")]
    NotFitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    /// 1-based position of the document in the input, before sorting.
    pub rank: usize,
    pub document: String,
    pub similarity: f64,
    /// `similarity * 100`.
    pub score: f64,
}

pub type SparseVector = BTreeMap<usize, f64>;

#[derive(Debug, Clone)]
pub struct RankingModel {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl Default for RankingModel {
    fn default() -> Self {
        Self::new(MAX_FEATURES)
    }
}

impl RankingModel {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learns the vocabulary and IDF weights. When the corpus has more distinct
    /// terms than `max_features`, the most frequent terms are kept (ties broken
    /// alphabetically).
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut terms: Vec<(String, usize)> = term_counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(self.max_features);

        let mut kept: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        kept.sort();

        let n = documents.len() as f64;
        self.idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
    }

    /// L2-normalised TF-IDF vector. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> Result<SparseVector, RankingError> {
        if !self.is_fitted() {
            return Err(RankingError::NotFitted);
        }
        let mut vector = SparseVector::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *vector.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, weight) in vector.iter_mut() {
            *weight *= self.idf[*index];
        }
        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        Ok(vector)
    }

    /// Ranks `documents` against `query`, most similar first. Documents with
    /// equal similarity keep their input order.
    pub fn rank_documents<S: AsRef<str>>(
        &self,
        query: &str,
        documents: &[S],
    ) -> Result<Vec<RankedDocument>, RankingError> {
        let query_vector = self.transform(query)?;
        let mut results = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let similarity = dot(&query_vector, &self.transform(doc.as_ref())?);
                Ok(RankedDocument {
                    rank: i + 1,
                    document: doc.as_ref().to_string(),
                    similarity,
                    score: similarity * 100.0,
                })
            })
            .collect::<Result<Vec<_>, RankingError>>()?;

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(results)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    preprocess(text)
        .iter()
        .flat_map(|word| TOKEN.find_iter(word).map(|m| m.as_str().to_string()))
        .collect()
}

fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    a.iter()
        .filter_map(|(index, weight)| b.get(index).map(|other| weight * other))
        .sum()
}
