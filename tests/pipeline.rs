//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use ndarray::Axis;

use news_lda::loader::read_jsonl;
use news_lda::vectorizer::fit_transform;
use news_lda::{
    assign_topics, clean, fit_topics, top_summary, Document, LatentDirichletAllocation, LdaConfig, Normalizer,
    PipelineConfig, PipelineError, Stage,
};

fn articles() -> Vec<Document> {
    vec![
        Document::new("p1", "Cats and dogs make good pets."),
        Document::new("v1", "People cast votes in the election over new laws."),
        Document::new("p2", "My dog chased the neighbour's cat; both pets are fine."),
        Document::new("v2", "The election decides which laws the votes favour."),
        Document::new("p3", "Pets like cats need care, dogs want walks."),
        Document::new("v3", "Laws passed after the election changed how votes count."),
    ]
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_max_iter(100).with_seed(3)
}

#[test]
fn normalizes_example_sentences() {
    let normalizer = Normalizer::builder().stop_words(["the", "on", "in"]).build().unwrap();

    assert_eq!(normalizer.normalize("the cat sat on https://x the mat document123"), vec!["cat", "sat", "mat"]);
    assert_eq!(normalizer.normalize("Dogs run fast in parks"), vec!["dog", "run", "fast", "park"]);
}

#[test]
fn english_normalizer_drops_links_and_boilerplate() {
    let normalizer = Normalizer::english().unwrap();
    let tokens = normalizer.normalize("https://example.com documentcloud document123 elections");

    assert!(tokens.iter().all(|t| !t.starts_with("https") && !t.starts_with("document")));
    assert!(tokens.contains(&"elect".to_string()));
}

#[test]
fn two_topics_separate_the_corpus() {
    let documents = clean(articles(), &Normalizer::english().unwrap());
    let analysis = fit_topics(documents, &[2], &config()).unwrap();

    assert_eq!(analysis.n_topics, 2);
    assert_eq!(analysis.summaries.len(), 2);

    let pets : Vec<usize> = ["p1", "p2", "p3"].iter().map(|id| analysis.get(id).unwrap().topic).collect();
    let votes : Vec<usize> = ["v1", "v2", "v3"].iter().map(|id| analysis.get(id).unwrap().topic).collect();

    assert!(pets.iter().all(|&t| t == pets[0]));
    assert!(votes.iter().all(|&t| t == votes[0]));
    assert_ne!(pets[0], votes[0]);

    let top_three = |topic : usize| {
        let mut words : Vec<&str> = analysis.summaries[topic].terms().into_iter().take(3).collect();
        words.sort();
        words
    };
    assert_eq!(top_three(pets[0]), vec!["cat", "dog", "pet"]);
    assert_eq!(top_three(votes[0]), vec!["elect", "law", "vote"]);
}

#[test]
fn results_follow_input_order_and_ids() {
    let documents = clean(articles(), &Normalizer::english().unwrap());
    let analysis = fit_topics(documents, &[2], &config()).unwrap();

    let ids : Vec<&str> = analysis.documents.iter().map(|d| d.document.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "v1", "p2", "v2", "p3", "v3"]);

    for annotated in analysis.documents.iter() {
        assert_eq!(annotated.topic_weights.len(), 2);
        assert!((annotated.topic_weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(annotated.topic < 2);
    }
}

#[test]
fn search_picks_one_candidate_and_scores_all() {
    let documents = clean(articles(), &Normalizer::english().unwrap());
    let analysis = fit_topics(documents, &[1, 2, 3], &config()).unwrap();

    assert_eq!(analysis.scores.len(), 3);
    assert!([1, 2, 3].contains(&analysis.n_topics));
    assert!(analysis.scores.iter().all(|s| s.mean_score.is_finite()));
    assert_eq!(analysis.summaries.len(), analysis.n_topics);
}

#[test]
fn summaries_are_sorted_by_weight() {
    let tokens : Vec<Vec<String>> = {
        let normalizer = Normalizer::english().unwrap();
        articles().iter().map(|d| normalizer.normalize(&d.text)).collect()
    };
    let (vocabulary, matrix) = fit_transform(&tokens);
    let model = LatentDirichletAllocation::new(LdaConfig::new(2).max_iter(50)).unwrap().fit(&matrix).unwrap();

    let summaries = top_summary(model.components(), &vocabulary, 4).unwrap();
    for summary in summaries.iter() {
        assert_eq!(summary.words.len(), 4);
        assert!(summary.words.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    assert!(top_summary(model.components(), &vocabulary, vocabulary.len() + 1).is_err());
}

#[test]
fn assignments_cover_every_row() {
    let tokens : Vec<Vec<&str>> = vec![vec!["cat", "dog"], vec!["vote", "law"], vec![]];
    let (_, matrix) = fit_transform(&tokens);
    let model = LatentDirichletAllocation::new(LdaConfig::new(2)).unwrap().fit(&matrix).unwrap();
    let doc_topic = model.transform(&matrix).unwrap();

    let topics = assign_topics(&doc_topic);
    assert_eq!(topics.len(), doc_topic.len_of(Axis(0)));
    assert!(topics.iter().all(|&t| t < 2));
}

#[test]
fn too_many_topics_fails_in_fit_stage() {
    let documents = clean(articles(), &Normalizer::english().unwrap());
    let err = fit_topics(documents, &[500], &config()).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Fit));
    assert!(matches!(err.root(), PipelineError::Configuration(_)));
}

#[test]
fn empty_candidate_list_is_rejected() {
    let documents = clean(articles(), &Normalizer::english().unwrap());
    assert!(fit_topics(documents, &[], &config()).is_err());
}

#[test]
fn loads_and_fits_from_json_lines() {
    let dump = r#"{"_id": {"$oid": "p1"}, "text": "Cats and dogs make good pets.", "date": "Mar 3, 2017, 9:15a"}
{"_id": {"$oid": "v1"}, "text": "Voters cast votes in the election.", "date": "NULL"}
{"_id": {"$oid": "p2"}, "text": "Dogs and cats are pets.", "date": "sometime"}
{"_id": {"$oid": "v2"}, "text": "The election changed the laws.", "date": "2017-03-04T10:00:00Z"}
"#;
    let corpus = read_jsonl(dump.as_bytes(), "dump").unwrap();
    assert_eq!(corpus.documents.len(), 4);
    assert_eq!(corpus.warnings.len(), 1);
    assert_eq!(corpus.warnings[0].document_id, "p2");

    let documents = clean(corpus.documents, &Normalizer::english().unwrap());
    let analysis = fit_topics(documents, &[2], &config()).unwrap();

    let first = analysis.get("p1").unwrap();
    assert!(first.document.published.is_some());
    assert!(analysis.get("v1").unwrap().document.published.is_none());

    let line = serde_json::to_value(first).unwrap();
    assert_eq!(line["id"], "p1");
    assert!(line["topic_weights"].is_array());
}
