//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// This file implements LDA w/Online Variational Bayes by:
//
//     M. Hoffman, D. Blei, F. Bach. "Online Learning for Latent Dirichlet Allocation." NIPS 2010.
//
// https://github.com/blei-lab/onlineldavb
//
use std::ops::Range;

use ndarray::{Array1, Array2, Axis, Zip};
use ndarray_rand::rand_distr::Gamma;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use statrs::function::gamma::{digamma, ln_gamma};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::vectorizer::DocumentTermMatrix;

const EPS : f64 = 1e-100;

// λ is drawn from Gamma(shape, scale) before the first batch
const INIT_SHAPE : f64 = 100.0;
const INIT_SCALE : f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    /// Number of topics
    pub n_topics : usize,
    /// Document-topic prior (alpha); `None` means 1 / n_topics
    pub doc_topic_prior : Option<f64>,
    /// Topic-word prior (eta); `None` means 1 / n_topics
    pub topic_word_prior : Option<f64>,
    /// Passes over the corpus; the only termination guarantee
    pub max_iter : usize,
    pub batch_size : usize,
    /// tau_0, down-weights early batches
    pub learning_offset : f64,
    /// kappa, in (0.5, 1.0] for guaranteed convergence
    pub learning_decay : f64,
    /// Stop the per-document E-step once the mean change of gamma drops below this
    pub mean_change_tol : f64,
    pub max_doc_update_iter : usize,
    /// Evaluate perplexity every n passes (0 = never); stop early when it settles
    pub evaluate_every : usize,
    pub perp_tol : f64,
    pub random_state : u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics : 10,
            doc_topic_prior : None,
            topic_word_prior : None,
            max_iter : 30,
            batch_size : 128,
            learning_offset : 10.0,
            learning_decay : 0.7,
            mean_change_tol : 1e-3,
            max_doc_update_iter : 100,
            evaluate_every : 0,
            perp_tol : 1e-1,
            random_state : 0,
        }
    }
}

impl LdaConfig {

    pub fn new(n_topics : usize) -> Self {
        Self { n_topics, ..Default::default() }
    }

    pub fn n_topics(mut self, n_topics : usize) -> Self {
        self.n_topics = n_topics;
        self
    }

    pub fn doc_topic_prior(mut self, alpha : f64) -> Self {
        self.doc_topic_prior = Some(alpha);
        self
    }

    pub fn topic_word_prior(mut self, eta : f64) -> Self {
        self.topic_word_prior = Some(eta);
        self
    }

    pub fn max_iter(mut self, n : usize) -> Self {
        self.max_iter = n;
        self
    }

    pub fn batch_size(mut self, n : usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn evaluate_every(mut self, n : usize) -> Self {
        self.evaluate_every = n;
        self
    }

    pub fn random_state(mut self, seed : u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.doc_topic_prior.unwrap_or(1.0 / self.n_topics as f64)
    }

    pub fn eta(&self) -> f64 {
        self.topic_word_prior.unwrap_or(1.0 / self.n_topics as f64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_topics < 1 {
            return Err(PipelineError::config("number of topics must be at least 1"));
        }
        if self.max_iter < 1 {
            return Err(PipelineError::config("max_iter must be at least 1"));
        }
        if self.batch_size < 1 {
            return Err(PipelineError::config("batch_size must be at least 1"));
        }
        if self.max_doc_update_iter < 1 {
            return Err(PipelineError::config("max_doc_update_iter must be at least 1"));
        }
        if !(self.learning_decay > 0.0 && self.learning_decay <= 1.0) {
            return Err(PipelineError::config(format!("learning_decay must be in (0, 1], got {}", self.learning_decay)));
        }
        if !(self.learning_offset >= 0.0) {
            return Err(PipelineError::config(format!("learning_offset must be non-negative, got {}", self.learning_offset)));
        }
        if !(self.mean_change_tol > 0.0) || !(self.perp_tol >= 0.0) {
            return Err(PipelineError::config("tolerances must be positive"));
        }
        for (name, prior) in [("doc_topic_prior", self.doc_topic_prior), ("topic_word_prior", self.topic_word_prior)] {
            if let Some(value) = prior {
                if !(value > 0.0) || !value.is_finite() {
                    return Err(PipelineError::config(format!("{} must be positive, got {}", name, value)));
                }
            }
        }
        Ok(())
    }

} // end LdaConfig

pub struct LatentDirichletAllocation {
    config : LdaConfig,
}

impl LatentDirichletAllocation {

    pub fn new(config : LdaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    /// Fits λ over the whole matrix, one mini-batch at a time.
    ///
    /// Fails only on shape problems: an empty matrix, or at least as many
    /// topics as vocabulary columns. Non-convergence is not an error; the
    /// pass cap bounds the work.
    pub fn fit(&self, document_word_matrix : &DocumentTermMatrix) -> Result<TopicModel> {
        let d : usize = document_word_matrix.n_rows();
        let w : usize = document_word_matrix.n_cols();
        let t : usize = self.config.n_topics;

        if d == 0 || w == 0 {
            return Err(PipelineError::config(format!("document-term matrix is empty ({} x {})", d, w)));
        }
        if t >= w {
            return Err(PipelineError::config(format!("{} topics requested but the vocabulary has only {} terms", t, w)));
        }

        let init = Gamma::new(INIT_SHAPE, INIT_SCALE)
            .map_err(|e| PipelineError::config(format!("topic-word initialization: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.config.random_state);

        let mut model = TopicModel {
            components : Array2::random_using((t, w), init, &mut rng),
            exp_dirichlet_component : Array2::zeros((t, w)),
            alpha : self.config.alpha(),
            eta : self.config.eta(),
            mean_change_tol : self.config.mean_change_tol,
            max_doc_update_iter : self.config.max_doc_update_iter,
            n_batch_iter : 1,
            n_iter : 0,
            bound_history : Vec::new(),
        };
        model.refresh_expectation();

        let total_words = document_word_matrix.total() as f64;
        let mut last_perplexity : Option<f64> = None;

        for i in 0..self.config.max_iter {
            let mut start : usize = 0;
            while start < d {
                let end = (start + self.config.batch_size).min(d);
                self.update_batch(&mut model, document_word_matrix, start..end);
                start = end;
            }
            model.n_iter = i + 1;

            if self.config.evaluate_every > 0 && (i + 1) % self.config.evaluate_every == 0 {
                let gamma = model.infer(document_word_matrix, 0..d);
                let bound = model.approx_bound(document_word_matrix, &gamma);
                model.bound_history.push(bound);

                let perplexity = perplexity_from_bound(bound, total_words);
                debug!(iteration = i + 1, bound, perplexity, "lda pass");

                if let Some(last) = last_perplexity {
                    if (last - perplexity).abs() < self.config.perp_tol {
                        debug!(iteration = i + 1, "perplexity settled, stopping early");
                        break;
                    }
                }
                last_perplexity = Some(perplexity);
            } else {
                debug!(iteration = i + 1, "lda pass");
            }
        }

        Ok(model)
    }

    // one online M-step: λ <- (1 - ρ) λ + ρ (η + D / |batch| * sstats)
    //
    fn update_batch(&self, model : &mut TopicModel, document_word_matrix : &DocumentTermMatrix, rows : Range<usize>) {
        let batch_len = rows.len() as f64;
        let (_, sstats) = model.e_step(document_word_matrix, rows, true);

        if let Some(sstats) = sstats {
            let rho = (self.config.learning_offset + model.n_batch_iter as f64).powf(-self.config.learning_decay);
            let doc_ratio = document_word_matrix.n_rows() as f64 / batch_len;
            let eta = model.eta;

            Zip::from(&mut model.components).and(&sstats).for_each(|lambda, &s| {
                *lambda = (1.0 - rho) * *lambda + rho * (eta + doc_ratio * s);
            });

            model.refresh_expectation();
            model.n_batch_iter += 1;
        }
    }

} // end LatentDirichletAllocation

// A fitted model: λ (components) plus what the E-step needs to infer new
// documents.
//
#[derive(Debug, Clone)]
pub struct TopicModel {
    components : Array2<f64>,
    exp_dirichlet_component : Array2<f64>,
    alpha : f64,
    eta : f64,
    mean_change_tol : f64,
    max_doc_update_iter : usize,
    n_batch_iter : usize,
    n_iter : usize,
    bound_history : Vec<f64>,
}

impl TopicModel {

    pub fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.components.ncols()
    }

    /// The topic-word matrix (K x V), unnormalized variational weights.
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Topic-word matrix with every row normalized to sum to 1.
    pub fn topic_word_distribution(&self) -> Array2<f64> {
        let mut distribution = self.components.clone();
        for mut row in distribution.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            }
        }
        distribution
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn bound_history(&self) -> &[f64] {
        &self.bound_history
    }

    /// Document-topic matrix (N x K), rows normalized to sum to 1.
    pub fn transform(&self, document_word_matrix : &DocumentTermMatrix) -> Result<Array2<f64>> {
        self.check_columns(document_word_matrix)?;

        let mut gamma = self.infer(document_word_matrix, 0..document_word_matrix.n_rows());
        for mut row in gamma.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            }
        }
        Ok(gamma)
    }

    /// Approximate log-likelihood (variational lower bound) of the matrix.
    /// Higher is better.
    pub fn score(&self, document_word_matrix : &DocumentTermMatrix) -> Result<f64> {
        self.check_columns(document_word_matrix)?;

        let gamma = self.infer(document_word_matrix, 0..document_word_matrix.n_rows());
        Ok(self.approx_bound(document_word_matrix, &gamma))
    }

    pub fn perplexity(&self, document_word_matrix : &DocumentTermMatrix) -> Result<f64> {
        let bound = self.score(document_word_matrix)?;
        Ok(perplexity_from_bound(bound, document_word_matrix.total() as f64))
    }

    fn check_columns(&self, document_word_matrix : &DocumentTermMatrix) -> Result<()> {
        if document_word_matrix.n_cols() != self.n_terms() {
            return Err(PipelineError::config(format!(
                "matrix has {} columns but the model was fitted on {}",
                document_word_matrix.n_cols(),
                self.n_terms()
            )));
        }
        Ok(())
    }

    fn refresh_expectation(&mut self) {
        self.exp_dirichlet_component = dirichlet_expectation_2d(&self.components).mapv(f64::exp);
    }

    fn infer(&self, document_word_matrix : &DocumentTermMatrix, rows : Range<usize>) -> Array2<f64> {
        self.e_step(document_word_matrix, rows, false).0
    }

    // Variational E-step over a block of rows. Documents are independent so
    // they run in parallel; sufficient statistics are summed in row order to
    // keep results independent of the thread count.
    //
    fn e_step(&self, document_word_matrix : &DocumentTermMatrix, rows : Range<usize>, cal_sstats : bool)
        -> (Array2<f64>, Option<Array2<f64>>)
    {
        let t = self.n_topics();
        let start = rows.start;

        let inferred : Vec<DocumentInference> = rows
            .into_par_iter()
            .map(|d| {
                let (ids, cts) = document_word_matrix.row(d);
                infer_document(ids, cts, &self.exp_dirichlet_component, self.alpha, self.mean_change_tol, self.max_doc_update_iter)
            })
            .collect();

        let mut gamma : Array2<f64> = Array2::zeros((inferred.len(), t));
        let mut sstats : Option<Array2<f64>> = if cal_sstats { Some(Array2::zeros(self.components.dim())) } else { None };

        for (i, doc) in inferred.iter().enumerate() {
            gamma.row_mut(i).assign(&doc.gamma);

            if let Some(sstats) = sstats.as_mut() {
                let (ids, _) = document_word_matrix.row(start + i);
                for (j, &w) in ids.iter().enumerate() {
                    let weight = doc.norm_counts[j];
                    for k in 0..t {
                        sstats[[k, w]] += doc.exp_elog_theta[k] * weight;
                    }
                }
            }
        }

        if let Some(sstats) = sstats.as_mut() {
            *sstats *= &self.exp_dirichlet_component;
        }

        (gamma, sstats)
    }

    // E_q[log p(docs | theta, beta)] + E_q[log p(theta | alpha) - log q(theta | gamma)]
    //   + E_q[log p(beta | eta) - log q(beta | lambda)]
    //
    fn approx_bound(&self, document_word_matrix : &DocumentTermMatrix, gamma : &Array2<f64>) -> f64 {
        let t = self.n_topics();
        let w = self.n_terms();
        let elog_theta = dirichlet_expectation_2d(gamma);
        let elog_beta = dirichlet_expectation_2d(&self.components);

        let mut score : f64 = 0.0;

        for d in 0..gamma.nrows() {
            let (ids, cts) = document_word_matrix.row(d);
            for (&wi, &c) in ids.iter().zip(cts.iter()) {
                let terms : Vec<f64> = (0..t).map(|k| elog_theta[[d, k]] + elog_beta[[k, wi]]).collect();
                score += c as f64 * log_sum_exp(&terms);
            }
        }

        score += dirichlet_log_likelihood(self.alpha, gamma, &elog_theta, t);
        score += dirichlet_log_likelihood(self.eta, &self.components, &elog_beta, w);

        score
    }

} // end TopicModel

struct DocumentInference {
    gamma : Array1<f64>,
    exp_elog_theta : Array1<f64>,
    // cts / phinorm, aligned with the document's column ids
    norm_counts : Array1<f64>,
}

fn infer_document(ids : &[usize], cts : &[u64], exp_elog_beta : &Array2<f64>, alpha : f64, tol : f64, max_iters : usize) -> DocumentInference {
    let t = exp_elog_beta.nrows();

    if ids.is_empty() {
        let gamma = Array1::from_elem(t, alpha);
        let exp_elog_theta = dirichlet_expectation(&gamma).mapv(f64::exp);
        return DocumentInference { gamma, exp_elog_theta, norm_counts : Array1::zeros(0) };
    }

    let counts : Array1<f64> = cts.iter().map(|&c| c as f64).collect();
    let beta_d : Array2<f64> = exp_elog_beta.select(Axis(1), ids);

    let mut gamma : Array1<f64> = Array1::ones(t);
    let mut exp_elog_theta = dirichlet_expectation(&gamma).mapv(f64::exp);
    let mut phinorm = exp_elog_theta.dot(&beta_d) + EPS;

    for _ in 0..max_iters {
        let last_gamma = gamma.clone();

        gamma = &exp_elog_theta * &beta_d.dot(&(&counts / &phinorm)) + alpha;
        exp_elog_theta = dirichlet_expectation(&gamma).mapv(f64::exp);
        phinorm = exp_elog_theta.dot(&beta_d) + EPS;

        let mean_change = (&gamma - &last_gamma).mapv(f64::abs).mean().unwrap_or(0.0);
        if mean_change < tol {
            break;
        }
    }

    let norm_counts = &counts / &phinorm;
    DocumentInference { gamma, exp_elog_theta, norm_counts }
}

/// E[log x] for x ~ Dir(alpha).
pub fn dirichlet_expectation(alpha : &Array1<f64>) -> Array1<f64> {
    let total = digamma(alpha.sum());
    alpha.mapv(|a| digamma(a) - total)
}

/// Row-wise [`dirichlet_expectation`].
pub fn dirichlet_expectation_2d(alpha : &Array2<f64>) -> Array2<f64> {
    let mut expectation = alpha.mapv(digamma);
    for (mut row, total) in expectation.axis_iter_mut(Axis(0)).zip(alpha.sum_axis(Axis(1)).iter()) {
        row -= digamma(*total);
    }
    expectation
}

fn dirichlet_log_likelihood(prior : f64, distr : &Array2<f64>, elog : &Array2<f64>, size : usize) -> f64 {
    let mut score : f64 = 0.0;

    Zip::from(distr).and(elog).for_each(|&x, &e| {
        score += (prior - x) * e + ln_gamma(x) - ln_gamma(prior);
    });

    let prior_total = ln_gamma(prior * size as f64);
    for total in distr.sum_axis(Axis(1)).iter() {
        score += prior_total - ln_gamma(*total);
    }

    score
}

fn log_sum_exp(values : &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn perplexity_from_bound(bound : f64, total_words : f64) -> f64 {
    if total_words > 0.0 {
        (-bound / total_words).exp()
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::fit_transform;

    fn separable() -> DocumentTermMatrix {
        let docs : Vec<Vec<&str>> = vec![
            vec!["cat", "dog", "pet", "cat", "dog", "pet"],
            vec!["dog", "pet", "cat", "pet"],
            vec!["pet", "cat", "dog", "dog"],
            vec!["vote", "elect", "law", "vote", "law"],
            vec!["law", "elect", "vote", "elect"],
            vec!["elect", "vote", "law", "law"],
        ];
        fit_transform(&docs).1
    }

    #[test]
    fn dirichlet_expectation_of_uniform() {
        let e = dirichlet_expectation(&Array1::from_elem(3, 1.0));
        // digamma(1) - digamma(3) = -(1 + 1/2)
        for v in e.iter() {
            assert!((v + 1.5).abs() < 1e-9);
        }
    }

    #[test]
    fn log_sum_exp_is_stable() {
        assert!((log_sum_exp(&[1000.0, 1000.0]) - (1000.0 + 2f64.ln())).abs() < 1e-9);
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }

    #[test]
    fn config_validation() {
        assert!(LatentDirichletAllocation::new(LdaConfig::new(0)).is_err());
        assert!(LatentDirichletAllocation::new(LdaConfig::new(2).max_iter(0)).is_err());
        assert!(LatentDirichletAllocation::new(LdaConfig::new(2).doc_topic_prior(-1.0)).is_err());
        assert!(LatentDirichletAllocation::new(LdaConfig::new(2)).is_ok());
    }

    #[test]
    fn too_many_topics() {
        let matrix = separable();
        let lda = LatentDirichletAllocation::new(LdaConfig::new(matrix.n_cols())).unwrap();
        assert!(matches!(lda.fit(&matrix), Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn empty_matrix() {
        let matrix = DocumentTermMatrix::from_rows(vec![], 4);
        let lda = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap();
        assert!(matches!(lda.fit(&matrix), Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn shapes_and_normalization() {
        let matrix = separable();
        let lda = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap();
        let model = lda.fit(&matrix).unwrap();

        assert_eq!(model.components().dim(), (2, 6));
        assert!(model.components().iter().all(|&x| x >= 0.0));
        assert_eq!(model.n_iter(), 30);

        let doc_topic = model.transform(&matrix).unwrap();
        assert_eq!(doc_topic.dim(), (6, 2));
        for row in doc_topic.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }

        for row in model.topic_word_distribution().axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_same_model() {
        let matrix = separable();
        let lda = LatentDirichletAllocation::new(LdaConfig::new(2).random_state(7)).unwrap();
        let a = lda.fit(&matrix).unwrap();
        let b = lda.fit(&matrix).unwrap();
        assert_eq!(a.components(), b.components());
    }

    #[test]
    fn separates_two_clusters() {
        let matrix = separable();
        let lda = LatentDirichletAllocation::new(LdaConfig::new(2).max_iter(100)).unwrap();
        let model = lda.fit(&matrix).unwrap();
        let doc_topic = model.transform(&matrix).unwrap();

        let topic_of = |d : usize| if doc_topic[[d, 0]] >= doc_topic[[d, 1]] { 0 } else { 1 };
        assert_eq!(topic_of(0), topic_of(1));
        assert_eq!(topic_of(1), topic_of(2));
        assert_eq!(topic_of(3), topic_of(4));
        assert_eq!(topic_of(4), topic_of(5));
        assert_ne!(topic_of(0), topic_of(3));

        // columns 0..3 are cat, dog, pet; 3..6 are vote, elect, law
        for (d, cluster) in [(0, 0..3), (3, 3..6)] {
            let row = model.components().row(topic_of(d));
            let mut columns : Vec<usize> = (0..row.len()).collect();
            columns.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap());
            columns.truncate(3);
            assert!(columns.iter().all(|c| cluster.contains(c)), "{:?}", columns);
        }
    }

    #[test]
    fn score_and_perplexity_are_finite() {
        let matrix = separable();
        let model = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap().fit(&matrix).unwrap();

        let score = model.score(&matrix).unwrap();
        let perplexity = model.perplexity(&matrix).unwrap();
        assert!(score.is_finite() && score < 0.0);
        assert!(perplexity.is_finite() && perplexity > 1.0);
    }

    #[test]
    fn evaluation_records_bounds() {
        let matrix = separable();
        let lda = LatentDirichletAllocation::new(LdaConfig::new(2).evaluate_every(5)).unwrap();
        let model = lda.fit(&matrix).unwrap();

        assert!(!model.bound_history().is_empty());
        assert!(model.n_iter() <= 30);
    }

    #[test]
    fn empty_document_is_uniform() {
        let matrix = DocumentTermMatrix::from_rows(vec![vec![(0, 3), (1, 1)], vec![], vec![(2, 2), (3, 2)]], 4);
        let model = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap().fit(&matrix).unwrap();
        let doc_topic = model.transform(&matrix).unwrap();

        assert!((doc_topic[[1, 0]] - 0.5).abs() < 1e-12);
        assert!((doc_topic[[1, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let matrix = separable();
        let model = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap().fit(&matrix).unwrap();
        let narrow = DocumentTermMatrix::from_rows(vec![vec![(0, 1)]], 3);
        assert!(model.transform(&narrow).is_err());
    }
}
