//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::document::Document;
use crate::error::{PipelineError, Result, Stage};
use crate::normalizer::Normalizer;
use crate::search::{CandidateScore, GridSearch};
use crate::summary::{assign_topics, top_summary, TopicSummary};
use crate::vectorizer::{self, Vocabulary};

/// A document with its topic weights and dominant topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedDocument {
    #[serde(flatten)]
    pub document : Document,
    pub topic_weights : Vec<f64>,
    pub topic : usize,
}

#[derive(Debug, Clone)]
pub struct TopicAnalysis {
    pub documents : Vec<AnnotatedDocument>,
    pub summaries : Vec<TopicSummary>,
    pub n_topics : usize,
    pub scores : Vec<CandidateScore>,
    pub vocabulary : Vocabulary,
}

impl TopicAnalysis {
    pub fn get(&self, id : &str) -> Option<&AnnotatedDocument> {
        self.documents.iter().find(|d| d.document.id == id)
    }
}

/// Fills in `tokens` for every document, keeping corpus order.
pub fn clean(documents : Vec<Document>, normalizer : &Normalizer) -> Vec<Document> {
    let cleaned : Vec<Document> = documents
        .into_iter()
        .map(|mut document| {
            document.tokens = normalizer.normalize(&document.text);
            document
        })
        .collect();

    let tokens : usize = cleaned.iter().map(|d| d.tokens.len()).sum();
    info!(documents = cleaned.len(), tokens, "cleaned documents");
    cleaned
}

/// Vectorizes cleaned documents, searches the candidate topic counts, and
/// joins each document's topic weights back by document id.
pub fn fit_topics(documents : Vec<Document>, candidate_topic_counts : &[usize], config : &PipelineConfig) -> Result<TopicAnalysis> {
    let mut rows : HashMap<String, usize> = HashMap::with_capacity(documents.len());
    for (row, document) in documents.iter().enumerate() {
        if rows.insert(document.id.clone(), row).is_some() {
            return Err(PipelineError::data(document.id.clone(), "duplicate document id").in_stage(Stage::Vectorize));
        }
    }

    let (vocabulary, matrix) = {
        let token_lists : Vec<Vec<&str>> = documents.iter().map(|d| d.tokens.iter().map(String::as_str).collect()).collect();
        vectorizer::fit_transform(&token_lists)
    };
    info!(documents = matrix.n_rows(), terms = vocabulary.len(), nonzero = matrix.nnz(), "vectorized corpus");

    let search = GridSearch::new(candidate_topic_counts.to_vec(), config.lda.clone(), config.folds)
        .map_err(|e| e.in_stage(Stage::Fit))?;
    let result = search.fit(&matrix).map_err(|e| e.in_stage(Stage::Fit))?;
    let document_topic = result.model.transform(&matrix).map_err(|e| e.in_stage(Stage::Fit))?;
    info!(n_topics = result.n_topics, iterations = result.model.n_iter(), "fitted topic model");

    let top_words = config.top_words.min(vocabulary.len());
    if top_words < config.top_words {
        debug!(requested = config.top_words, top_words, "vocabulary smaller than requested summary length");
    }
    let summaries = top_summary(result.model.components(), &vocabulary, top_words).map_err(|e| e.in_stage(Stage::Summarize))?;
    let assignments = assign_topics(&document_topic);

    let annotated = documents
        .into_iter()
        .map(|document| {
            let row = rows[&document.id];
            AnnotatedDocument {
                topic_weights : document_topic.row(row).to_vec(),
                topic : assignments[row],
                document,
            }
        })
        .collect();

    Ok(TopicAnalysis {
        documents : annotated,
        summaries,
        n_topics : result.n_topics,
        scores : result.scores,
        vocabulary,
    })
}
