use std::thread;

use entity_cache::{CacheOptions, QueryResult, SharedCache};
use serde_json::json;

#[test]
fn concurrent_writers_converge_on_one_record() {
    let shared = SharedCache::new(CacheOptions::default());
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                for page in 0..25 {
                    let title = format!("w{worker}");
                    shared
                        .update_cache(&QueryResult::new(
                            "feed",
                            json!({"worker": worker, "page": page}),
                            json!({
                                "items": [
                                    {"__typename": "Movie", "id": "1", "title": title},
                                    {"__typename": "Movie", "id": format!("{worker}-{page}")}
                                ]
                            }),
                        ))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = shared.stats();
    assert_eq!(stats.result_trees, 100);
    assert_eq!(stats.entities, 101);
    assert_eq!(stats.views, 200);

    // Every tree that selected Movie 1's title shows the last write.
    let guard = shared.read();
    let key = entity_cache::entity_key("Movie", &"1".into()).unwrap();
    let last = guard.entity(&key).unwrap().field("title").cloned().unwrap();
    drop(guard);
    let rendered = shared
        .render_result_tree("feed", &json!({"worker": 0, "page": 0}))
        .unwrap()
        .unwrap();
    assert_eq!(rendered["items"][0]["title"], last.to_json());
}
