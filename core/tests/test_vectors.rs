//! Verify the filter and query-string builders against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Criteria vectors go through `SearchCriteria::from_json`, the same path a
//! caller holding loosely-typed criteria would take. Query-string vectors
//! compare exact output, so they also pin parameter order.

use logo_objects_core::query::encode_pairs;
use logo_objects_core::{build_query_string, build_search_query, parse_query_string, QueryOptions, SearchCriteria};

// ---------------------------------------------------------------------------
// Filter expressions
// ---------------------------------------------------------------------------

#[test]
fn search_query_test_vectors() {
    let raw = include_str!("../../test-vectors/search_query.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let criteria = SearchCriteria::from_json(case["criteria"].as_object().unwrap());
        let expected = case["expected"].as_str();

        assert_eq!(build_search_query(&criteria).as_deref(), expected, "{name}");
    }
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

#[test]
fn query_string_test_vectors() {
    let raw = include_str!("../../test-vectors/query_string.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let options: QueryOptions = serde_json::from_value(case["options"].clone()).unwrap();
        let expected = case["expected"].as_str().unwrap();

        let encoded = build_query_string(&options);
        assert_eq!(encoded, expected, "{name}");

        let reencoded = encode_pairs(parse_query_string(&encoded));
        assert_eq!(reencoded, encoded, "{name}: decode/encode fixed point");
    }
}
