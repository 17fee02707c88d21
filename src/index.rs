use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::normalize::normalize;

/// Best corpus entry for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub confidence: f32,
}

/// TF-IDF vector space over the normalized corpus questions.
///
/// Rows of `vectors` are L2-normalized, so cosine similarity against a
/// normalized query vector is a plain dot product. Row `i` always belongs to
/// question `i` of the slice the index was built from.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f32>,
    vectors: Array2<f32>,
}

impl CorpusIndex {
    pub fn build(questions: &[String]) -> Self {
        let normalized: Vec<String> = questions.par_iter().map(|q| normalize(q)).collect();

        let terms: BTreeSet<&str> = normalized
            .iter()
            .flat_map(|doc| doc.split_whitespace())
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();

        let idf = Self::calculate_idf(&normalized, &vocabulary);

        let mut vectors = Array2::zeros((normalized.len(), vocabulary.len()));
        for (i, doc) in normalized.iter().enumerate() {
            let vector = Self::weigh(doc, &vocabulary, &idf);
            vectors.row_mut(i).assign(&vector);
        }

        CorpusIndex {
            vocabulary,
            idf,
            vectors,
        }
    }

    /// Smoothed IDF: ln((1 + n) / (1 + df)) + 1.
    fn calculate_idf(docs: &[String], vocabulary: &HashMap<String, usize>) -> Array1<f32> {
        let total_docs = docs.len() as f32;
        let mut doc_freq = vec![0usize; vocabulary.len()];
        for doc in docs {
            let unique_tokens: BTreeSet<&str> = doc.split_whitespace().collect();
            for token in unique_tokens {
                if let Some(&idx) = vocabulary.get(token) {
                    doc_freq[idx] += 1;
                }
            }
        }
        doc_freq
            .into_iter()
            .map(|freq| ((1.0 + total_docs) / (1.0 + freq as f32)).ln() + 1.0)
            .collect()
    }

    fn weigh(
        normalized: &str,
        vocabulary: &HashMap<String, usize>,
        idf: &Array1<f32>,
    ) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(vocabulary.len());
        for token in normalized.split_whitespace() {
            if let Some(&idx) = vocabulary.get(token) {
                vector[idx] += idf[idx];
            }
        }
        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector / norm
        } else {
            vector
        }
    }

    /// Projects an already-normalized query into the fitted space. Unknown
    /// terms are ignored; an empty query yields the zero vector.
    pub fn vectorize(&self, normalized: &str) -> Array1<f32> {
        Self::weigh(normalized, &self.vocabulary, &self.idf)
    }

    /// Cosine similarity of the query against every corpus entry.
    pub fn similarities(&self, normalized: &str) -> Array1<f32> {
        let query = self.vectorize(normalized);
        self.vectors.dot(&query).mapv(|s| s.clamp(0.0, 1.0))
    }

    /// Arg-max over the corpus; the first of several equal scores wins.
    /// `None` only when the corpus is empty.
    pub fn best_match(&self, normalized: &str) -> Option<Match> {
        self.similarities(normalized)
            .iter()
            .enumerate()
            .fold(None, |best: Option<Match>, (index, &confidence)| match best {
                Some(b) if b.confidence >= confidence => Some(b),
                _ => Some(Match { index, confidence }),
            })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<String> {
        [
            "What is the best time to visit Angkor Wat?",
            "How do I get from Phnom Penh to Siem Reap?",
            "What should I eat in Battambang?",
            "Where can I try the bamboo train?",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn one_vector_per_question() {
        let index = CorpusIndex::build(&questions());
        assert_eq!(index.len(), 4);
        assert!(index.vocabulary_len() > 0);
        assert_eq!(index.vectorize("").len(), index.vocabulary_len());
    }

    #[test]
    fn exact_normalized_match_scores_one() {
        let index = CorpusIndex::build(&questions());
        let m = index
            .best_match(&normalize("best time to visit angkor wat"))
            .unwrap();
        assert_eq!(m.index, 0);
        assert!((m.confidence - 1.0).abs() < 1e-5);
    }

    #[test]
    fn partial_overlap_scores_between_zero_and_one() {
        let index = CorpusIndex::build(&questions());
        let m = index.best_match(&normalize("bamboo train tickets")).unwrap();
        assert_eq!(m.index, 3);
        assert!(m.confidence > 0.0 && m.confidence < 1.0);
    }

    #[test]
    fn empty_and_unknown_queries_score_zero() {
        let index = CorpusIndex::build(&questions());
        assert!(index.similarities("").iter().all(|&s| s == 0.0));
        let m = index.best_match(&normalize("quantum blockchain")).unwrap();
        assert_eq!(m.confidence, 0.0);
        assert_eq!(m.index, 0);
    }

    #[test]
    fn empty_corpus_has_no_match() {
        let index = CorpusIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.best_match("angkor"), None);
    }

    #[test]
    fn corpus_of_stop_words_still_builds() {
        let index = CorpusIndex::build(&["what is it?".to_string()]);
        assert_eq!(index.vocabulary_len(), 0);
        let m = index.best_match("angkor").unwrap();
        assert_eq!(m.confidence, 0.0);
    }
}
