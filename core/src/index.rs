use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::corpus::Document;
use crate::tokenizer::tokenize;

pub type TermId = u32;

/// Dense document-term matrix of tf-idf weights over a closed corpus.
///
/// Rows follow corpus order; columns follow first-occurrence order of terms,
/// which keeps rebuilds from the same inputs identical. Both dimensions are
/// fixed at build time and every operation afterwards is a read.
///
/// Weights use max-term-frequency normalization per document times
/// `ln(N / df)` per term, so they compare across documents without being
/// globally normalized magnitudes.
pub struct TermMatrix {
    urls: Vec<String>,
    titles: Vec<String>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    stopwords: HashSet<String>,
    /// Row-major, `num_docs()` rows by `num_terms()` columns.
    weights: Vec<f32>,
}

impl TermMatrix {
    /// Build the matrix from a finished corpus and a lowercase stopword set.
    pub fn build(docs: &[Document], stopwords: HashSet<String>) -> Self {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut counts: Vec<HashMap<TermId, u32>> = Vec::with_capacity(docs.len());

        for doc in docs {
            let mut raw: HashMap<TermId, u32> = HashMap::new();
            for token in tokenize(&doc.text) {
                if stopwords.contains(&token) {
                    continue;
                }
                let tid = match dictionary.get(&token) {
                    Some(&tid) => tid,
                    None => {
                        let tid = terms.len() as TermId;
                        terms.push(token.clone());
                        dictionary.insert(token, tid);
                        tid
                    }
                };
                *raw.entry(tid).or_insert(0) += 1;
            }
            counts.push(raw);
        }

        let num_docs = docs.len();
        let num_terms = terms.len();

        // df >= 1 for every column: a term only exists because some row has it.
        let mut df = vec![0u32; num_terms];
        for raw in &counts {
            for &tid in raw.keys() {
                df[tid as usize] += 1;
            }
        }
        let n = num_docs as f32;
        let idf: Vec<f32> = df.iter().map(|&d| (n / d as f32).ln()).collect();

        let mut weights = vec![0.0f32; num_docs * num_terms];
        for (row, raw) in counts.iter().enumerate() {
            let max_raw = raw.values().copied().max().unwrap_or(0);
            if max_raw == 0 {
                // document lost every token to filtering; it keeps an
                // all-zero row rather than dividing by zero
                continue;
            }
            let base = row * num_terms;
            for (&tid, &count) in raw {
                let t = tid as usize;
                weights[base + t] = count as f32 / max_raw as f32 * idf[t];
            }
        }

        tracing::info!(num_docs, num_terms, "term matrix built");

        TermMatrix {
            urls: docs.iter().map(|d| d.url.clone()).collect(),
            titles: docs.iter().map(|d| d.title.clone()).collect(),
            dictionary,
            terms,
            stopwords,
            weights,
        }
    }

    pub fn num_docs(&self) -> usize {
        self.urls.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    fn row(&self, doc: usize) -> &[f32] {
        let w = self.num_terms();
        &self.weights[doc * w..(doc + 1) * w]
    }

    fn check_doc(&self, doc: usize) -> Result<()> {
        if doc >= self.num_docs() {
            bail!(
                "document index {doc} out of range (corpus has {} documents)",
                self.num_docs()
            );
        }
        Ok(())
    }

    /// The `n` terms with the highest summed weight across the corpus,
    /// descending; equal sums keep vocabulary column order.
    pub fn top_terms(&self, n: usize) -> Vec<(String, f32)> {
        let mut sums = vec![0.0f32; self.num_terms()];
        for doc in 0..self.num_docs() {
            for (t, &v) in self.row(doc).iter().enumerate() {
                sums[t] += v;
            }
        }
        self.rank_terms(&sums, n)
    }

    /// Same ranking over a single document's row. Errors on a bad index.
    pub fn top_terms_for_doc(&self, n: usize, doc: usize) -> Result<Vec<(String, f32)>> {
        self.check_doc(doc)?;
        Ok(self.rank_terms(self.row(doc), n))
    }

    fn rank_terms(&self, weights: &[f32], n: usize) -> Vec<(String, f32)> {
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| {
            weights[b]
                .partial_cmp(&weights[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        order
            .into_iter()
            .take(n)
            .map(|t| (self.terms[t].clone(), weights[t]))
            .collect()
    }

    /// Resolve a query string to vocabulary columns. `None` when no usable
    /// term survives filtering, or when any surviving term is out of
    /// vocabulary — one unknown term fails the whole query.
    fn resolve_query(&self, text: &str) -> Option<Vec<TermId>> {
        let candidates: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates
            .iter()
            .map(|t| self.dictionary.get(t).copied())
            .collect()
    }

    /// Urls of every document with a positive weight for all query terms,
    /// in corpus order. Unsatisfiable queries match nothing; they are not
    /// errors.
    pub fn query(&self, text: &str) -> Vec<String> {
        let terms = match self.resolve_query(text) {
            Some(t) => t,
            None => return Vec::new(),
        };
        (0..self.num_docs())
            .filter(|&doc| {
                let row = self.row(doc);
                terms.iter().all(|&t| row[t as usize] > 0.0)
            })
            .map(|doc| self.urls[doc].clone())
            .collect()
    }

    /// Urls of the `n` highest-scoring documents for the query, where a
    /// document's score is the sum of its weights over the query terms.
    /// Documents matching only some terms still score; ties go to the lower
    /// document index. `n` past the corpus size returns every document.
    pub fn query_scored(&self, text: &str, n: usize) -> Vec<String> {
        let terms = match self.resolve_query(text) {
            Some(t) => t,
            None => return Vec::new(),
        };
        let mut scored: Vec<(usize, f32)> = (0..self.num_docs())
            .map(|doc| {
                let row = self.row(doc);
                (doc, terms.iter().map(|&t| row[t as usize]).sum())
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored
            .into_iter()
            .take(n)
            .map(|(doc, _)| self.urls[doc].clone())
            .collect()
    }

    /// Cosine similarity between two documents' weight rows. A row with zero
    /// norm has similarity 0 against everything, including itself.
    pub fn similarity(&self, a: usize, b: usize) -> Result<f32> {
        self.check_doc(a)?;
        self.check_doc(b)?;
        Ok(cosine(self.row(a), self.row(b)))
    }

    /// Titles of the `n` documents most similar to `doc`, most similar
    /// first, ties to the lower document index. `doc` itself is excluded;
    /// the result is a true ordered top-n, not an unordered partition.
    pub fn most_similar(&self, doc: usize, n: usize) -> Result<Vec<String>> {
        self.check_doc(doc)?;
        let query_row = self.row(doc);
        let mut sims: Vec<(usize, f32)> = (0..self.num_docs())
            .filter(|&other| other != doc)
            .map(|other| (other, cosine(query_row, self.row(other))))
            .collect();
        sims.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        Ok(sims
            .into_iter()
            .take(n)
            .map(|(d, _)| self.titles[d].clone())
            .collect())
    }

    /// One document's full term -> weight distribution, for the word-cloud
    /// renderer. Owned copies, never views into the table.
    pub fn doc_weights(&self, doc: usize) -> Result<HashMap<String, f32>> {
        self.check_doc(doc)?;
        Ok(self
            .terms
            .iter()
            .cloned()
            .zip(self.row(doc).iter().copied())
            .collect())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
