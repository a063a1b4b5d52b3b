//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use news_lda::config::{topic_counts_from_env, DEFAULT_TOPIC_COUNTS};
use news_lda::loader::{collect_inputs, load_jsonl, LoadedCorpus};
use news_lda::{clean, fit_topics, Normalizer, PipelineConfig};

/// Discover topics in news article dumps.
///
/// Reads JSON-lines records ({"_id": {"$oid": ..}, "text": .., "date": ..}),
/// cleans the text, fits LDA, and prints the top words of every topic.
#[derive(Parser)]
#[command(name = "news-lda", version, about)]
struct Cli {
    /// JSONL files, or directories of them
    #[arg(required = true)]
    inputs : Vec<PathBuf>,

    /// Candidate topic count; repeat to search over several (default: 5)
    #[arg(long = "topics", short = 'k')]
    topics : Vec<usize>,

    /// Words to list per topic
    #[arg(long)]
    top_words : Option<usize>,

    /// Passes over the corpus
    #[arg(long)]
    max_iter : Option<usize>,

    /// Cross-validation folds when several topic counts are given
    #[arg(long)]
    folds : Option<usize>,

    /// Seed for the topic-word initialization
    #[arg(long)]
    seed : Option<u64>,

    /// Extra stopwords on top of the English list
    #[arg(long = "stop-word")]
    stop_words : Vec<String>,

    /// Write one JSON line per article with its topic weights
    #[arg(long, short = 'o')]
    output : Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("news_lda=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env()?;
    if let Some(n) = cli.top_words {
        config.top_words = n;
    }
    if let Some(n) = cli.max_iter {
        config = config.with_max_iter(n);
    }
    if let Some(n) = cli.folds {
        config.folds = n;
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let candidates = if !cli.topics.is_empty() {
        cli.topics.clone()
    } else {
        topic_counts_from_env()?.unwrap_or_else(|| DEFAULT_TOPIC_COUNTS.to_vec())
    };

    let mut corpus = LoadedCorpus::default();
    for path in collect_inputs(&cli.inputs)? {
        let loaded = load_jsonl(&path).with_context(|| format!("reading {}", path.display()))?;
        corpus.extend(loaded)?;
    }
    if !corpus.warnings.is_empty() {
        warn!(count = corpus.warnings.len(), "some dates could not be parsed and were left empty");
    }

    let normalizer = Normalizer::builder().add_stop_words(&cli.stop_words).build()?;
    let documents = clean(corpus.documents, &normalizer);

    info!(candidates = ?candidates, "fitting topics");
    let analysis = fit_topics(documents, &candidates, &config)?;

    for score in analysis.scores.iter() {
        println!("k = {:<3} score = {:.3}", score.n_topics, score.mean_score);
    }
    println!("\nselected {} topics\n", analysis.n_topics);
    for summary in analysis.summaries.iter() {
        println!("{}", summary);
    }

    if let Some(path) = cli.output {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for document in analysis.documents.iter() {
            serde_json::to_writer(&mut writer, document)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        println!("\nwrote {} articles to {}", analysis.documents.len(), path.display());
    }

    Ok(())
}
