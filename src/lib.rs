//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// Topic discovery over a batch of news articles:
//
//     raw records -> Normalizer -> Vocabulary + DocumentTermMatrix
//         -> online variational LDA (topic count picked by GridSearch)
//         -> top words per topic, dominant topic per article
//
pub mod config;
pub mod document;
pub mod error;
pub mod lda;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod search;
pub mod summary;
pub mod vectorizer;

pub use config::PipelineConfig;
pub use document::Document;
pub use error::{ParseWarning, PipelineError, Result, Stage};
pub use lda::{LatentDirichletAllocation, LdaConfig, TopicModel};
pub use normalizer::{Normalizer, NormalizerBuilder};
pub use pipeline::{clean, fit_topics, AnnotatedDocument, TopicAnalysis};
pub use search::{CandidateScore, GridSearch, SearchResult};
pub use summary::{assign_topics, top_summary, TopicSummary};
pub use vectorizer::{DocumentTermMatrix, Vocabulary};
