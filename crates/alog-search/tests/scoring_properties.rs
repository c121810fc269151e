//! Properties of query parsing and ranking.

use alog_search::scoring::score_document;
use alog_search::{DocKind, SearchDocument, parse_query, search};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z']{1,8}", 1..8).prop_map(|words| words.join(" "))
}

fn arb_documents() -> impl Strategy<Value = Vec<SearchDocument>> {
    prop::collection::vec((arb_text(), prop::option::of(arb_text())), 0..24).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, description))| {
                SearchDocument::new(DocKind::Log, format!("lg-{i:03}"), name.clone())
                    .field("name", name, 3.0)
                    .field_opt("description", description.as_deref(), 1.0)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parsed_terms_are_lowercase_nonempty_and_unique(raw in "[a-zA-Z \"]{0,40}") {
        let terms = parse_query(&raw);
        for (idx, term) in terms.iter().enumerate() {
            prop_assert!(!term.is_empty());
            prop_assert_eq!(term.trim(), term.as_str());
            prop_assert_eq!(term.to_lowercase(), term.clone());
            prop_assert!(!terms[..idx].contains(term));
        }
    }

    #[test]
    fn hits_are_bounded_and_ordered(docs in arb_documents(), query in arb_text(), limit in 0usize..30) {
        let hits = search(&docs, &query, limit);
        prop_assert!(hits.len() <= limit);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if (pair[0].score - pair[1].score).abs() < f64::EPSILON {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn every_hit_scores_positive_and_matches(docs in arb_documents(), query in arb_text()) {
        let terms = parse_query(&query);
        for hit in search(&docs, &query, usize::MAX) {
            prop_assert!(hit.score > 0.0);
            prop_assert!(!hit.matched_fields.is_empty());
            let doc = docs.iter().find(|d| d.id == hit.id);
            prop_assert!(doc.is_some_and(|d| score_document(d, &terms).is_some()));
        }
    }

    #[test]
    fn document_name_always_finds_itself(docs in arb_documents()) {
        for doc in &docs {
            let hits = search(&docs, &doc.title, usize::MAX);
            prop_assert!(hits.iter().any(|hit| hit.id == doc.id));
        }
    }
}

#[test]
fn hits_serialize_with_kind_labels() {
    let docs = vec![SearchDocument::new(DocKind::DungeonMaster, "dm-1", "Morgan").field("name", "Morgan", 3.0)];
    let hits = search(&docs, "morgan", 5);
    let json = serde_json::to_value(&hits).expect("serialize");
    assert_eq!(json[0]["kind"], "dungeon_master");
    assert_eq!(json[0]["matched_fields"][0], "name");
    assert!(json[0].get("subtitle").is_none());
}
