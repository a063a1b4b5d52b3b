//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use news_lda::vectorizer::fit_transform;
use news_lda::{assign_topics, top_summary, LatentDirichletAllocation, LdaConfig, Normalizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let articles = [
        "The senate passed the voting law after a long election fight.",
        "Voters head to the polls as the election law changes.",
        "Our new puppy and the cat finally share the couch.",
        "Adopting a rescue dog: what every new pet owner should know.",
        "Lawmakers debate election security ahead of the vote.",
        "Cats, dogs and other pets need regular vet visits.",
    ];

    let normalizer = Normalizer::english()?;
    let tokens : Vec<Vec<String>> = articles.iter().map(|a| normalizer.normalize(a)).collect();

    println!("vectorizing {} articles", tokens.len());
    let (vocabulary, matrix) = fit_transform(&tokens);

    println!("training lda over {} terms", vocabulary.len());
    let lda = LatentDirichletAllocation::new(LdaConfig::new(2).max_iter(100))?;
    let model = lda.fit(&matrix)?;

    println!("topics!");
    for summary in top_summary(model.components(), &vocabulary, 5)? {
        println!("{}", summary);
    }

    let doc_topic = model.transform(&matrix)?;
    for (article, topic) in articles.iter().zip(assign_topics(&doc_topic)) {
        println!("{} <- {}", topic, article);
    }

    Ok(())
}
