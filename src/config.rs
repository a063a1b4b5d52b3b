//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::env;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::lda::LdaConfig;
use crate::search::DEFAULT_FOLDS;

pub const DEFAULT_TOP_WORDS : usize = 10;
pub const DEFAULT_TOPIC_COUNTS : [usize; 1] = [5];

/// Settings for one pipeline run.
///
/// `from_env` reads `NEWS_LDA_*` variables on top of the defaults; the
/// command line overrides both.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Words listed per topic summary
    pub top_words : usize,
    /// Cross-validation folds for the topic-count search
    pub folds : usize,
    /// Everything but the topic count, which comes from the candidates
    pub lda : LdaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            top_words : DEFAULT_TOP_WORDS,
            folds : DEFAULT_FOLDS,
            lda : LdaConfig::default(),
        }
    }
}

impl PipelineConfig {

    pub fn from_env() -> Result<Self> {
        let mut config = PipelineConfig::default();

        if let Some(v) = read_var("NEWS_LDA_TOP_WORDS")? { config.top_words = v; }
        if let Some(v) = read_var("NEWS_LDA_FOLDS")? { config.folds = v; }
        if let Some(v) = read_var("NEWS_LDA_MAX_ITER")? { config.lda.max_iter = v; }
        if let Some(v) = read_var("NEWS_LDA_BATCH_SIZE")? { config.lda.batch_size = v; }
        if let Some(v) = read_var("NEWS_LDA_LEARNING_OFFSET")? { config.lda.learning_offset = v; }
        if let Some(v) = read_var("NEWS_LDA_LEARNING_DECAY")? { config.lda.learning_decay = v; }
        if let Some(v) = read_var("NEWS_LDA_EVALUATE_EVERY")? { config.lda.evaluate_every = v; }
        if let Some(v) = read_var("NEWS_LDA_SEED")? { config.lda.random_state = v; }
        if let Some(v) = read_var::<f64>("NEWS_LDA_DOC_TOPIC_PRIOR")? { config.lda.doc_topic_prior = Some(v); }
        if let Some(v) = read_var::<f64>("NEWS_LDA_TOPIC_WORD_PRIOR")? { config.lda.topic_word_prior = Some(v); }

        Ok(config)
    }

    pub fn with_max_iter(mut self, n : usize) -> Self {
        self.lda.max_iter = n;
        self
    }

    pub fn with_seed(mut self, seed : u64) -> Self {
        self.lda.random_state = seed;
        self
    }

} // end PipelineConfig

/// Candidate topic counts from `NEWS_LDA_TOPICS` ("5" or "4,5,6").
pub fn topic_counts_from_env() -> Result<Option<Vec<usize>>> {
    match env::var("NEWS_LDA_TOPICS") {
        Ok(raw) => parse_topic_counts(&raw).map(Some),
        Err(_) => Ok(None),
    }
}

pub fn parse_topic_counts(raw : &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|e| PipelineError::config(format!("topic count {:?}: {}", s, e))))
        .collect()
}

fn read_var<T>(name : &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PipelineError::config(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
