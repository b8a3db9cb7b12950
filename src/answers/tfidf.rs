//! TF-IDF text vectorizer
//!
//! Lowercases, keeps tokens of two or more word characters, weights terms
//! with smoothed idf (`ln((1 + n) / (1 + df)) + 1`) and L2-normalises
//! each document. Terms unseen at fit time are dropped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid regex"))
}

/// Lowercased tokens of `text`, in order
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fitted vocabulary and idf weights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term -> column index; BTreeMap keeps the artifact diff-stable
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and idf weights from `documents`
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let mut seen: Vec<String> = tokenize(doc.as_ref());
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (index, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Dense, L2-normalised TF-IDF vector of `text`
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = vec![0.0_f32; self.idf.len()];
        for (index, count) in counts {
            vector[index] = count * self.idf[index];
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(
            tokenize("def add(a, b): return a + b"),
            vec!["def", "add", "return"]
        );
        assert_eq!(tokenize("Print X1"), vec!["print", "x1"]);
    }

    #[test]
    fn test_common_terms_weigh_less() {
        let docs = ["return value", "return nothing", "return here"];
        let v = TfidfVectorizer::fit(&docs);
        let common = v.index_of("return").unwrap();
        let rare = v.index_of("value").unwrap();

        let vec = v.transform("return value");
        assert!(vec[rare] > vec[common]);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let v = TfidfVectorizer::fit(&["alpha beta", "beta gamma"]);
        let vec = v.transform("alpha beta beta");
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_terms_give_zero_vector() {
        let v = TfidfVectorizer::fit(&["alpha beta"]);
        let vec = v.transform("zeta");
        assert_eq!(vec.len(), 2);
        assert!(vec.iter().all(|x| *x == 0.0));
    }
}
