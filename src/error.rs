//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::fmt;
use thiserror::Error;

// Pipeline stages, used to say which part of a run failed
//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Vectorize,
    Fit,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Vectorize => "vectorize",
            Stage::Fit => "fit",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A record is missing a required field or is not an object.
    #[error("malformed record {record}: {reason}")]
    Data { record : String, reason : String },

    /// A hyperparameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage : Stage,
        #[source]
        source : Box<PipelineError>,
    },

    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn data(record : impl Into<String>, reason : impl Into<String>) -> Self {
        PipelineError::Data { record : record.into(), reason : reason.into() }
    }

    pub fn config(message : impl Into<String>) -> Self {
        PipelineError::Configuration(message.into())
    }

    // Tags the error with the stage it came from; already-tagged errors keep
    // their innermost stage.
    pub fn in_stage(self, stage : Stage) -> Self {
        match self {
            PipelineError::Stage { .. } => self,
            other => PipelineError::Stage { stage, source : Box::new(other) },
        }
    }

    /// The error underneath any stage tag.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// A field value that could not be normalized and was stored as missing.
//
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseWarning {
    pub document_id : String,
    pub field : &'static str,
    pub value : String,
    pub reason : String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document {}: could not parse {} {:?} ({})", self.document_id, self.field, self.value, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tag_is_applied_once() {
        let err = PipelineError::config("k must be positive").in_stage(Stage::Fit).in_stage(Stage::Summarize);

        assert_eq!(err.stage(), Some(Stage::Fit));
        assert!(matches!(err.root(), PipelineError::Configuration(_)));
        assert_eq!(err.to_string(), "fit stage failed: invalid configuration: k must be positive");
    }

    #[test]
    fn data_error_names_record() {
        let err = PipelineError::data("line 3", "missing field `text`");
        assert_eq!(err.to_string(), "malformed record line 3: missing field `text`");
    }
}
