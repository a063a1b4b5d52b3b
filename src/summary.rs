//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::cmp::Ordering;
use std::fmt;

use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::vectorizer::Vocabulary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub topic : usize,
    /// (word, weight), heaviest first
    pub words : Vec<(String, f64)>,
}

impl TopicSummary {
    pub fn terms(&self) -> Vec<&str> {
        self.words.iter().map(|(w, _)| w.as_str()).collect()
    }
}

impl fmt::Display for TopicSummary {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic {}: {}", self.topic, self.terms().join(" "))
    }
}

/// The `n` heaviest words of every topic row.
///
/// Words are ordered by descending weight, ties by ascending vocabulary
/// column. Asking for more words than the vocabulary holds is an
/// `InvalidArgument` error rather than a silent cap.
pub fn top_summary(topic_word_matrix : &Array2<f64>, vocabulary : &Vocabulary, n : usize) -> Result<Vec<TopicSummary>> {
    if topic_word_matrix.ncols() != vocabulary.len() {
        return Err(PipelineError::InvalidArgument(format!(
            "topic-word matrix has {} columns but the vocabulary has {} terms",
            topic_word_matrix.ncols(),
            vocabulary.len()
        )));
    }
    if n > vocabulary.len() {
        return Err(PipelineError::InvalidArgument(format!(
            "asked for {} words per topic but the vocabulary has {} terms",
            n,
            vocabulary.len()
        )));
    }

    let summaries = topic_word_matrix
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(topic, row)| {
            let mut ranked : Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
            ranked.truncate(n);

            let words = ranked.into_iter().map(|(w, weight)| (vocabulary[w].to_string(), weight)).collect();
            TopicSummary { topic, words }
        })
        .collect();

    Ok(summaries)
}

/// Dominant topic of every document row.
///
/// A linear scan keeping the first strictly greater weight, so ties resolve
/// to the lowest topic index and an all-zero row gets topic 0.
pub fn assign_topics(document_topic_matrix : &Array2<f64>) -> Vec<usize> {
    document_topic_matrix
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best_topic : usize = 0;
            let mut best_weight = f64::NEG_INFINITY;
            for (topic, &weight) in row.iter().enumerate() {
                if weight > best_weight {
                    best_topic = topic;
                    best_weight = weight;
                }
            }
            best_topic
        })
        .collect()
}
