//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
// Turns raw article text into stemmed word tokens.
//
// lowercase -> strip punctuation, symbols and digits -> UAX #29 words ->
// drop stopwords, short words, links and boilerplate -> fold to ASCII ->
// Snowball (English) stem
//
use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

pub const DEFAULT_MIN_LENGTH : usize = 3;
pub const LINK_PREFIX : &str = "https";

// Export artifacts such as "documenttype" that leak into article bodies.
// The raw form is checked before digits are stripped so "document123" is
// caught as well.
//
pub const BOILERPLATE_PATTERN : &str = "^document[a-z]+";
pub const RAW_BOILERPLATE_PATTERN : &str = "^document[a-z0-9]+";

pub struct Normalizer {
    stop_words : HashSet<String>,
    min_length : usize,
    link_prefix : String,
    artifact_patterns : Vec<Regex>,
    raw_artifact_patterns : Vec<Regex>,
    stemmer : Option<Stemmer>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("stop_words", &self.stop_words.len())
            .field("min_length", &self.min_length)
            .field("link_prefix", &self.link_prefix)
            .field("artifact_patterns", &self.artifact_patterns)
            .field("stemming", &self.stemmer.is_some())
            .finish()
    }
}

impl Normalizer {

    /// English stopwords, Snowball English stemming, and the default link and
    /// boilerplate filters.
    pub fn english() -> Result<Normalizer> {
        NormalizerBuilder::new().build()
    }

    pub fn builder() -> NormalizerBuilder {
        NormalizerBuilder::new()
    }

    pub fn stop_words(&self) -> &HashSet<String> {
        &self.stop_words
    }

    /// Cleans one document's text. Never fails; degenerate input gives an
    /// empty list.
    pub fn normalize(&self, text : &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let unpunctuated : String = lowered.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).collect();

        let mut tokens : Vec<String> = Vec::new();

        // a whitespace token yields at most one word
        for chunk in unpunctuated.split_whitespace() {
            let word : String = chunk.unicode_words().collect();
            if word.is_empty() || self.raw_artifact_patterns.iter().any(|re| re.is_match(&word)) {
                continue;
            }

            let stripped : String = word.chars().filter(|c| !c.is_ascii_digit()).collect();
            if stripped.is_empty() || self.is_discarded(&stripped) {
                continue;
            }

            let folded : String = stripped.chars().filter(|c| c.is_ascii()).collect();
            if folded.is_empty() {
                continue;
            }

            let stemmed = match &self.stemmer {
                Some(stemmer) => stemmer.stem(&folded).into_owned(),
                None => folded,
            };

            // folding and stemming can shorten a word below the length floor
            if !stemmed.is_empty() && !self.is_discarded(&stemmed) {
                tokens.push(stemmed);
            }
        }

        tokens
    }

    /// True when `token` is filtered out: a stopword, too short, a link, or a
    /// boilerplate artifact.
    pub fn is_discarded(&self, token : &str) -> bool {
        self.stop_words.contains(token)
            || token.chars().count() < self.min_length
            || token.starts_with(self.link_prefix.as_str())
            || self.artifact_patterns.iter().any(|re| re.is_match(token))
    }

    pub fn stem(&self, token : &str) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(token).into_owned(),
            None => token.to_string(),
        }
    }

} // end Normalizer

// Explicit configuration for a Normalizer; nothing is read from globals.
//
pub struct NormalizerBuilder {
    stop_words : Option<HashSet<String>>,
    extra_stop_words : Vec<String>,
    min_length : usize,
    link_prefix : String,
    artifact_patterns : Vec<String>,
    raw_artifact_patterns : Vec<String>,
    stemming : Option<Algorithm>,
}

impl Default for NormalizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizerBuilder {

    pub fn new() -> Self {
        NormalizerBuilder {
            stop_words : None,
            extra_stop_words : Vec::new(),
            min_length : DEFAULT_MIN_LENGTH,
            link_prefix : LINK_PREFIX.to_string(),
            artifact_patterns : vec![BOILERPLATE_PATTERN.to_string()],
            raw_artifact_patterns : vec![RAW_BOILERPLATE_PATTERN.to_string()],
            stemming : Some(Algorithm::English),
        }
    }

    /// Replaces the default English list.
    pub fn stop_words<I, S>(mut self, words : I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = Some(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect());
        self
    }

    pub fn add_stop_words<I, S>(mut self, words : I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_stop_words.extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Shortest token kept, in characters.
    pub fn min_length(mut self, len : usize) -> Self {
        self.min_length = len;
        self
    }

    pub fn link_prefix(mut self, prefix : impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    pub fn add_artifact_pattern(mut self, pattern : impl Into<String>) -> Self {
        self.artifact_patterns.push(pattern.into());
        self
    }

    pub fn stemming(mut self, algorithm : Option<Algorithm>) -> Self {
        self.stemming = algorithm;
        self
    }

    pub fn build(self) -> Result<Normalizer> {
        let mut stop_words : HashSet<String> = match self.stop_words {
            Some(words) => words,
            None => get(LANGUAGE::English).into_iter().map(|w| w.to_lowercase()).collect(),
        };
        stop_words.extend(self.extra_stop_words);

        let artifact_patterns = self.artifact_patterns.iter().map(|p| Regex::new(p)).collect::<std::result::Result<Vec<_>, _>>()?;
        let raw_artifact_patterns = self.raw_artifact_patterns.iter().map(|p| Regex::new(p)).collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Normalizer {
            stop_words,
            min_length : self.min_length,
            link_prefix : self.link_prefix,
            artifact_patterns,
            raw_artifact_patterns,
            stemmer : self.stemming.map(Stemmer::create),
        })
    }

} // end NormalizerBuilder
