//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

use ndarray::Array2;

// Vocabulary is...
//
// token -> column, in order of first appearance across the corpus
//
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms : Vec<String>,
    indices : HashMap<String, usize>,
}

impl Index<usize> for Vocabulary {
    type Output = str;

    fn index(&self, column : usize) -> &Self::Output {
        match self.terms.get(column) {
            Some(term) => term.as_str(),
            None => panic!("Index<usize> Error: attempted to access an undefined column"),
        }
    }
}

impl Vocabulary {

    pub fn build<S : AsRef<str>>(documents : &[Vec<S>]) -> Vocabulary {
        let mut vocabulary = Vocabulary::default();

        for tokens in documents {
            for token in tokens {
                vocabulary.insert(token.as_ref());
            }
        }

        vocabulary
    }

    fn insert(&mut self, token : &str) -> usize {
        if let Some(&column) = self.indices.get(token) {
            return column;
        }

        let column = self.terms.len();
        self.terms.push(token.to_string());
        self.indices.insert(token.to_string(), column);
        column
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, token : &str) -> Option<usize> {
        self.indices.get(token).copied()
    }

    pub fn term(&self, column : usize) -> Option<&str> {
        self.terms.get(column).map(|t| t.as_str())
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

} // end Vocabulary

// DocumentTermMatrix is a compressed-row count matrix
//
// row d holds (column, count) pairs for document d, sorted by column
//
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermMatrix {
    n_cols : usize,
    indptr : Vec<usize>,
    indices : Vec<usize>,
    counts : Vec<u64>,
}

impl DocumentTermMatrix {

    pub fn from_rows(rows : Vec<Vec<(usize, u64)>>, n_cols : usize) -> DocumentTermMatrix {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut counts = Vec::new();

        indptr.push(0);
        for row in rows {
            let mut merged : BTreeMap<usize, u64> = BTreeMap::new();
            for (column, count) in row {
                if column < n_cols && count > 0 {
                    *merged.entry(column).or_insert(0) += count;
                }
            }
            for (column, count) in merged {
                indices.push(column);
                counts.push(count);
            }
            indptr.push(indices.len());
        }

        DocumentTermMatrix { n_cols, indptr, indices, counts }
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Column indices and counts of one document.
    pub fn row(&self, d : usize) -> (&[usize], &[u64]) {
        let (start, end) = (self.indptr[d], self.indptr[d + 1]);
        (&self.indices[start..end], &self.counts[start..end])
    }

    pub fn row_total(&self, d : usize) -> u64 {
        self.row(d).1.iter().sum()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn get(&self, d : usize, w : usize) -> u64 {
        let (columns, counts) = self.row(d);
        match columns.binary_search(&w) {
            Ok(pos) => counts[pos],
            Err(_) => 0,
        }
    }

    /// A new matrix holding the given rows, in the given order.
    pub fn select_rows(&self, rows : &[usize]) -> DocumentTermMatrix {
        let selected = rows.iter().map(|&d| {
            let (columns, counts) = self.row(d);
            columns.iter().copied().zip(counts.iter().copied()).collect()
        }).collect();

        DocumentTermMatrix::from_rows(selected, self.n_cols)
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut document_term_matrix : Array2<f64> = Array2::zeros((self.n_rows(), self.n_cols));

        for d in 0..self.n_rows() {
            let (columns, counts) = self.row(d);
            for (&w, &c) in columns.iter().zip(counts.iter()) {
                document_term_matrix[[d, w]] += c as f64;
            }
        }

        document_term_matrix
    }

} // end DocumentTermMatrix

/// Builds the vocabulary from the corpus and counts every document against it.
pub fn fit_transform<S : AsRef<str>>(documents : &[Vec<S>]) -> (Vocabulary, DocumentTermMatrix) {
    let vocabulary = Vocabulary::build(documents);
    let matrix = transform(&vocabulary, documents);
    (vocabulary, matrix)
}

/// Counts documents against an existing vocabulary; unknown tokens are
/// ignored.
pub fn transform<S : AsRef<str>>(vocabulary : &Vocabulary, documents : &[Vec<S>]) -> DocumentTermMatrix {
    let rows = documents.iter().map(|tokens| {
        let mut histogram : BTreeMap<usize, u64> = BTreeMap::new();
        for token in tokens {
            if let Some(column) = vocabulary.get(token.as_ref()) {
                *histogram.entry(column).or_insert(0) += 1;
            }
        }
        histogram.into_iter().collect()
    }).collect();

    DocumentTermMatrix::from_rows(rows, vocabulary.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<&'static str>> {
        vec![
            vec!["cat", "sat", "mat", "cat"],
            vec![],
            vec!["dog", "cat"],
        ]
    }

    #[test]
    fn vocabulary_in_first_appearance_order() {
        let vocabulary = Vocabulary::build(&corpus());
        assert_eq!(vocabulary.terms(), &["cat", "sat", "mat", "dog"]);
        assert_eq!(vocabulary.get("dog"), Some(3));
        assert_eq!(&vocabulary[1], "sat");
        assert_eq!(vocabulary.get("bird"), None);
    }

    #[test]
    fn counts_and_shape() {
        let (vocabulary, matrix) = fit_transform(&corpus());

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), vocabulary.len());
        assert_eq!(matrix.get(0, 0), 2);
        assert_eq!(matrix.get(0, 3), 0);
        assert_eq!(matrix.row_total(1), 0);
        assert_eq!(matrix.row(2), (&[0usize, 3][..], &[1u64, 1][..]));
        assert_eq!(matrix.total(), 6);
    }

    #[test]
    fn dense_matches_sparse() {
        let (_, matrix) = fit_transform(&corpus());
        let dense = matrix.to_dense();

        assert_eq!(dense.shape(), &[3, 4]);
        assert_eq!(dense[[0, 0]], 2.0);
        assert_eq!(dense.row(1).sum(), 0.0);
        assert_eq!(dense.sum(), 6.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        assert_eq!(fit_transform(&corpus()), fit_transform(&corpus()));
    }

    #[test]
    fn transform_ignores_unknown_tokens() {
        let vocabulary = Vocabulary::build(&corpus());
        let matrix = transform(&vocabulary, &[vec!["bird", "dog", "dog"]]);
        assert_eq!(matrix.row(0), (&[3usize][..], &[2u64][..]));
    }

    #[test]
    fn select_rows_keeps_order() {
        let (_, matrix) = fit_transform(&corpus());
        let subset = matrix.select_rows(&[2, 0]);

        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.n_cols(), 4);
        assert_eq!(subset.get(0, 3), 1);
        assert_eq!(subset.get(1, 0), 2);
    }
}
