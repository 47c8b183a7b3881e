use std::sync::Arc;

use entity_cache::{
    entity_key, Cache, CacheOptions, CounterMetrics, MetricsSnapshot, Node, NormalizeWarning,
    QueryResult, Value,
};
use serde_json::json;

#[test]
fn empty_list_creates_nothing() {
    let mut cache = Cache::new();
    let report = cache
        .update_cache(&QueryResult::new(
            "listMovies",
            json!({"limit": 0}),
            json!({"movies": []}),
        ))
        .unwrap();

    assert_eq!(report.entities_created, 0);
    assert!(cache.entities().is_empty());
    let tree = cache
        .lookup_result_tree("listMovies", &json!({"limit": 0}))
        .unwrap()
        .unwrap();
    assert_eq!(tree.field("movies"), Some(&Node::List(Vec::new())));
}

#[test]
fn null_list_field_is_stored_verbatim() {
    let mut cache = Cache::new();
    cache
        .update_cache(&QueryResult::new(
            "getMovie",
            json!({"id": "1"}),
            json!({"movie": {"__typename": "Movie", "id": "1", "actors": null}}),
        ))
        .unwrap();

    assert_eq!(cache.entities().len(), 1);
    let rendered = cache
        .render_result_tree("getMovie", &json!({"id": "1"}))
        .unwrap()
        .unwrap();
    assert_eq!(rendered["movie"]["actors"], serde_json::Value::Null);
    assert!(rendered["movie"].as_object().unwrap().contains_key("actors"));
}

#[test]
fn null_top_level_field_is_kept() {
    let mut cache = Cache::new();
    cache
        .update_cache(&QueryResult::new("getMovie", json!({"id": "9"}), json!({"movie": null})))
        .unwrap();
    let tree = cache
        .lookup_result_tree("getMovie", &json!({"id": "9"}))
        .unwrap()
        .unwrap();
    assert_eq!(tree.field("movie"), Some(&Node::Scalar(Value::Null)));
    assert!(cache.entities().is_empty());
}

#[test]
fn non_normalizable_nested_object_is_inline() {
    let mut cache = Cache::new();
    let report = cache
        .update_cache(&QueryResult::new(
            "getMovie",
            json!({"id": "1"}),
            json!({
                "movie": {
                    "__typename": "Movie",
                    "id": "1",
                    "metadata": {"runtime": 117, "rated": "R"}
                }
            }),
        ))
        .unwrap();

    assert_eq!(report.entities_created, 1);
    assert!(report.warnings.is_empty());
    assert_eq!(cache.entities().len(), 1);

    let rendered = cache
        .render_result_tree("getMovie", &json!({"id": "1"}))
        .unwrap()
        .unwrap();
    assert_eq!(rendered["movie"]["metadata"], json!({"runtime": 117, "rated": "R"}));
}

#[test]
fn inline_objects_are_not_refreshed() {
    let mut cache = Cache::new();
    cache
        .update_cache(&QueryResult::new(
            "stats",
            json!({}),
            json!({"summary": {"total": 1}}),
        ))
        .unwrap();
    cache
        .update_cache(&QueryResult::new(
            "stats",
            json!({"fresh": true}),
            json!({"summary": {"total": 2}}),
        ))
        .unwrap();

    let old = cache.render_result_tree("stats", &json!({})).unwrap().unwrap();
    assert_eq!(old["summary"]["total"], 1);
}

#[test]
fn list_of_scalars_passes_through() {
    let mut cache = Cache::new();
    cache
        .update_cache(&QueryResult::new(
            "getMovie",
            json!({"id": "1"}),
            json!({"movie": {"__typename": "Movie", "id": "1", "tags": ["space", "horror"]}}),
        ))
        .unwrap();
    let record = cache
        .entity(&entity_key("Movie", &Value::from("1")).unwrap())
        .unwrap();
    assert_eq!(
        record.field("tags"),
        Some(&Value::from(json!(["space", "horror"])))
    );
}

#[test]
fn mixed_list_degrades_without_failing() {
    let metrics = Arc::new(CounterMetrics::default());
    let mut cache = Cache::with_options(CacheOptions::new().metrics(metrics.clone()));
    let report = cache
        .update_cache(&QueryResult::new(
            "search",
            json!({"q": "alien"}),
            json!({
                "hits": ["alien", {"__typename": "Movie", "id": "1"}],
                "top": {"__typename": "Movie", "id": "2", "title": "Aliens"}
            }),
        ))
        .unwrap();

    assert_eq!(
        report.warnings,
        vec![NormalizeWarning::MixedList { path: "hits".into() }]
    );
    assert_eq!(cache.entities().len(), 1);
    let rendered = cache
        .render_result_tree("search", &json!({"q": "alien"}))
        .unwrap()
        .unwrap();
    assert_eq!(
        rendered["hits"],
        json!(["alien", {"__typename": "Movie", "id": "1"}])
    );
    assert_eq!(metrics.snapshot().mixed_lists, 1);
}

#[test]
fn nullable_entity_list_is_not_mixed() {
    let mut cache = Cache::new();
    let report = cache
        .update_cache(&QueryResult::new(
            "listMovies",
            json!({}),
            json!({"movies": [{"__typename": "Movie", "id": "1"}, null]}),
        ))
        .unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(report.entities_created, 1);

    let mut strict = Cache::with_options(CacheOptions::new().allow_null_list_items(false));
    let report = strict
        .update_cache(&QueryResult::new(
            "listMovies",
            json!({}),
            json!({"movies": [{"__typename": "Movie", "id": "1"}, null]}),
        ))
        .unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(strict.entities().is_empty());
}

#[test]
fn missing_identifier_is_inline_data() {
    let mut cache = Cache::new();
    let report = cache
        .update_cache(&QueryResult::new(
            "getMovie",
            json!({}),
            json!({"movie": {"__typename": "Movie", "id": null, "title": "Alien"}}),
        ))
        .unwrap();
    assert!(cache.entities().is_empty());
    assert_eq!(
        report.warnings,
        vec![NormalizeWarning::MissingIdentifier {
            path: "movie".into(),
            typename: "Movie".into()
        }]
    );
    let rendered = cache.render_result_tree("getMovie", &json!({})).unwrap().unwrap();
    assert_eq!(rendered["movie"]["title"], "Alien");
}

#[test]
fn composite_identifiers_collide_across_field_order() {
    let mut cache = Cache::new();
    cache
        .update_cache(&QueryResult::new(
            "a",
            json!({}),
            json!({"seat": {"__typename": "Seat", "id": {"row": 4, "col": 2}, "taken": false}}),
        ))
        .unwrap();
    cache
        .update_cache(&QueryResult::new(
            "b",
            json!({}),
            json!({"seat": {"__typename": "Seat", "id": {"col": 2, "row": 4}, "taken": true}}),
        ))
        .unwrap();

    assert_eq!(cache.entities().len(), 1);
    let first = cache.render_result_tree("a", &json!({})).unwrap().unwrap();
    assert_eq!(first["seat"]["taken"], true);
}

#[test]
fn custom_identity_fields() {
    let mut cache = Cache::with_options(CacheOptions::new().typename_field("kind").id_field("_id"));
    cache
        .update_cache(&QueryResult::new(
            "q",
            json!({}),
            json!({
                "movie": {"kind": "Movie", "_id": 1, "title": "Alien"},
                "legacy": {"__typename": "Movie", "id": 1}
            }),
        ))
        .unwrap();
    assert_eq!(cache.entities().len(), 1);
    assert!(cache
        .entity(&entity_key("Movie", &Value::Int(1)).unwrap())
        .is_some());
}

#[test]
fn metrics_track_creates_merges_and_writes() {
    let metrics = Arc::new(CounterMetrics::default());
    let mut cache = Cache::with_options(CacheOptions::new().metrics(metrics.clone()));
    let movie = |title: &str| {
        QueryResult::new(
            "getMovie",
            json!({"id": "1"}),
            json!({"movie": {"__typename": "Movie", "id": "1", "title": title}}),
        )
    };
    cache.update_cache(&movie("Alien")).unwrap();
    cache.update_cache(&movie("Aliens")).unwrap();

    assert_eq!(
        metrics.snapshot(),
        MetricsSnapshot {
            entities_created: 1,
            entities_merged: 1,
            views_created: 2,
            view_field_writes: 3,
            mixed_lists: 0,
        }
    );
}

#[test]
fn variable_order_does_not_split_trees() {
    let mut cache = Cache::new();
    let vars: serde_json::Value =
        serde_json::from_str(r#"{"limit": 10, "genre": "horror"}"#).unwrap();
    cache
        .update_cache(&QueryResult::new("listMovies", vars, json!({"movies": []})))
        .unwrap();

    let reordered: serde_json::Value =
        serde_json::from_str(r#"{"genre": "horror", "limit": 10}"#).unwrap();
    assert!(cache
        .lookup_result_tree("listMovies", &reordered)
        .unwrap()
        .is_some());
    assert!(cache
        .lookup_result_tree("listMovies", &json!({"limit": 20, "genre": "horror"}))
        .unwrap()
        .is_none());
}

#[test]
fn unsigned_ids_beyond_i64_stay_separate_records() {
    let mut cache = Cache::new();
    let order = |query: &str, id: u64, total: i64| {
        QueryResult::new(
            query,
            json!({"id": id}),
            json!({"order": {"__typename": "Order", "id": id, "total": total}}),
        )
    };
    cache.update_cache(&order("a", u64::MAX, 1)).unwrap();
    cache.update_cache(&order("b", u64::MAX - 1, 2)).unwrap();

    assert_eq!(cache.entities().len(), 2);
    let first = cache.render_result_tree("a", &json!({"id": u64::MAX})).unwrap().unwrap();
    assert_eq!(first["order"]["total"], json!(1));
    assert_eq!(first["order"]["id"], json!(u64::MAX));
}

#[test]
fn non_finite_variables_fail_without_storing() {
    #[derive(serde::Serialize)]
    struct Page {
        limit: f64,
    }
    let mut cache = Cache::new();
    let data = Value::from(json!({"count": 1}));
    let err = cache
        .normalize_result("listMovies", &Page { limit: f64::NAN }, &data)
        .unwrap_err();
    assert_eq!(err.code(), "Unserializable");
    assert!(cache.result_trees().is_empty());
    assert!(cache.lookup_result_tree("listMovies", &json!({"limit": null})).unwrap().is_none());
}
