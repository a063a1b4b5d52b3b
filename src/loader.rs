//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// Reads article dumps: one JSON object per line.
//
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{ParseWarning, PipelineError, Result, Stage};

#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub documents : Vec<Document>,
    pub warnings : Vec<ParseWarning>,
}

impl LoadedCorpus {

    /// Appends another corpus, rejecting identifiers seen before.
    pub fn extend(&mut self, other : LoadedCorpus) -> Result<()> {
        let mut seen : HashSet<String> = self.documents.iter().map(|d| d.id.clone()).collect();
        for document in other.documents.iter() {
            if !seen.insert(document.id.clone()) {
                return Err(PipelineError::data(document.id.clone(), "duplicate document id").in_stage(Stage::Load));
            }
        }

        self.documents.extend(other.documents);
        self.warnings.extend(other.warnings);
        Ok(())
    }

} // end LoadedCorpus

pub fn load_jsonl(path : impl AsRef<Path>) -> Result<LoadedCorpus> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::from(e).in_stage(Stage::Load))?;
    let corpus = read_jsonl(file, &path.display().to_string())?;

    info!(path = %path.display(), documents = corpus.documents.len(), warnings = corpus.warnings.len(), "loaded records");
    Ok(corpus)
}

/// Expands inputs into the record files to read: files are kept as given,
/// directories contribute their `*.jsonl` entries in name order.
pub fn collect_inputs<P : AsRef<Path>>(inputs : &[P]) -> Result<Vec<PathBuf>> {
    let mut files_vector : Vec<PathBuf> = Vec::new();

    for input in inputs {
        let path = input.as_ref();

        if !path.is_dir() {
            files_vector.push(path.to_path_buf());
            continue;
        }

        let mut entries : Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| PipelineError::from(e).in_stage(Stage::Load))? {
            let entry = entry.map_err(|e| PipelineError::from(e).in_stage(Stage::Load))?;
            let candidate = entry.path();
            if candidate.is_file() && candidate.extension().map_or(false, |ext| ext == "jsonl") {
                entries.push(candidate);
            }
        }
        entries.sort();
        files_vector.extend(entries);
    }

    Ok(files_vector)
}

/// Parses JSON lines from any reader. Blank lines are skipped; `source`
/// only labels error messages.
pub fn read_jsonl<R : Read>(reader : R, source : &str) -> Result<LoadedCorpus> {
    let mut corpus = LoadedCorpus::default();
    let mut seen : HashSet<String> = HashSet::new();

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|e| PipelineError::from(e).in_stage(Stage::Load))?;
        if line.trim().is_empty() {
            continue;
        }

        let label = format!("{}:{}", source, i + 1);
        let record : Value = serde_json::from_str(&line)
            .map_err(|e| PipelineError::data(label.clone(), e.to_string()).in_stage(Stage::Load))?;

        let (document, warning) = Document::from_record(&record, &label).map_err(|e| e.in_stage(Stage::Load))?;

        if !seen.insert(document.id.clone()) {
            return Err(PipelineError::data(label, format!("duplicate document id {:?}", document.id)).in_stage(Stage::Load));
        }

        if let Some(warning) = warning {
            warn!(%warning, "date left empty");
            corpus.warnings.push(warning);
        }
        corpus.documents.push(document);
    }

    Ok(corpus)
}
