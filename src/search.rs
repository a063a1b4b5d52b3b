//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// Picks the number of topics by k-fold cross-validation on held-out
// approximate log-likelihood, then refits the winner on every document.
//
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::lda::{LatentDirichletAllocation, LdaConfig, TopicModel};
use crate::vectorizer::DocumentTermMatrix;

pub const DEFAULT_FOLDS : usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub n_topics : usize,
    /// Mean held-out score; in-sample when no cross-validation ran
    pub mean_score : f64,
    pub fold_scores : Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub n_topics : usize,
    pub model : TopicModel,
    pub scores : Vec<CandidateScore>,
}

pub struct GridSearch {
    candidates : Vec<usize>,
    base : LdaConfig,
    folds : usize,
}

impl GridSearch {

    /// `base` supplies every setting except the topic count.
    pub fn new(candidates : Vec<usize>, base : LdaConfig, folds : usize) -> Result<Self> {
        if candidates.is_empty() {
            return Err(PipelineError::config("no candidate topic counts given"));
        }
        if folds < 2 {
            return Err(PipelineError::config(format!("cross-validation needs at least 2 folds, got {}", folds)));
        }
        if let Some(&k) = candidates.iter().find(|&&k| k < 1) {
            return Err(PipelineError::config(format!("candidate topic count {} is below 1", k)));
        }
        base.clone().n_topics(candidates[0]).validate()?;

        Ok(GridSearch { candidates, base, folds })
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn fit(&self, document_word_matrix : &DocumentTermMatrix) -> Result<SearchResult> {
        let n = document_word_matrix.n_rows();
        let w = document_word_matrix.n_cols();

        if n == 0 || w == 0 {
            return Err(PipelineError::config(format!("document-term matrix is empty ({} x {})", n, w)));
        }
        if let Some(&k) = self.candidates.iter().find(|&&k| k >= w) {
            return Err(PipelineError::config(format!("{} topics requested but the vocabulary has only {} terms", k, w)));
        }

        if self.candidates.len() == 1 {
            let n_topics = self.candidates[0];
            let model = self.estimator(n_topics)?.fit(document_word_matrix)?;
            let score = model.score(document_word_matrix)?;
            info!(n_topics, score, "fitted single candidate");

            return Ok(SearchResult {
                n_topics,
                model,
                scores : vec![CandidateScore { n_topics, mean_score : score, fold_scores : Vec::new() }],
            });
        }

        if n < self.folds {
            return self.fit_in_sample(document_word_matrix);
        }

        let splits = kfold(n, self.folds);
        let mut scores : Vec<CandidateScore> = Vec::with_capacity(self.candidates.len());

        for &n_topics in self.candidates.iter() {
            let estimator = self.estimator(n_topics)?;
            let mut fold_scores : Vec<f64> = Vec::with_capacity(splits.len());

            for (fold, (train, test)) in splits.iter().enumerate() {
                let model = estimator.fit(&document_word_matrix.select_rows(train))?;
                let score = model.score(&document_word_matrix.select_rows(test))?;
                debug!(n_topics, fold, score, "held-out score");
                fold_scores.push(score);
            }

            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            info!(n_topics, mean_score, "scored candidate");
            scores.push(CandidateScore { n_topics, mean_score, fold_scores });
        }

        let best = best_candidate(&scores)?;
        let n_topics = scores[best].n_topics;
        let model = self.estimator(n_topics)?.fit(document_word_matrix)?;
        info!(n_topics, "refitted best candidate on all documents");

        Ok(SearchResult { n_topics, model, scores })
    }

    // too few documents to hold any out
    //
    fn fit_in_sample(&self, document_word_matrix : &DocumentTermMatrix) -> Result<SearchResult> {
        let mut scores : Vec<CandidateScore> = Vec::with_capacity(self.candidates.len());
        let mut models : Vec<TopicModel> = Vec::with_capacity(self.candidates.len());

        for &n_topics in self.candidates.iter() {
            let model = self.estimator(n_topics)?.fit(document_word_matrix)?;
            let mean_score = model.score(document_word_matrix)?;
            info!(n_topics, mean_score, "scored candidate in-sample");
            scores.push(CandidateScore { n_topics, mean_score, fold_scores : Vec::new() });
            models.push(model);
        }

        let best = best_candidate(&scores)?;
        let model = models.swap_remove(best);
        Ok(SearchResult { n_topics : scores[best].n_topics, model, scores })
    }

    fn estimator(&self, n_topics : usize) -> Result<LatentDirichletAllocation> {
        LatentDirichletAllocation::new(self.base.clone().n_topics(n_topics))
    }

} // end GridSearch

// highest mean score wins; ties go to the earlier candidate
//
fn best_candidate(scores : &[CandidateScore]) -> Result<usize> {
    let means : Array1<f64> = scores.iter().map(|s| s.mean_score).collect();
    means.argmax().map_err(|e| PipelineError::config(format!("candidate scores cannot be ranked: {}", e)))
}

/// Contiguous k-fold splits as (train rows, test rows). The first
/// `n % folds` folds hold one extra row.
pub fn kfold(n : usize, folds : usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut splits = Vec::with_capacity(folds);
    let mut start : usize = 0;

    for f in 0..folds {
        let size = n / folds + if f < n % folds { 1 } else { 0 };
        let end = start + size;
        let test : Vec<usize> = (start..end).collect();
        let train : Vec<usize> = (0..start).chain(end..n).collect();
        splits.push((train, test));
        start = end;
    }

    splits
}
