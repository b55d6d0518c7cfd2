//! Query string serializer for list, read and action requests.
//!
//! # Design
//! `QueryOptions` is a closed struct of the options every endpoint knows
//! about plus an `extra` map for vendor flags. Serialization walks the
//! fields in declaration order, skips anything absent or empty, and
//! form-urlencodes the values, so output is stable and decodes back to the
//! exact same pairs.
//!
//! Sort direction follows the vendor convention: ascending fields are sent
//! as-is, descending fields carry a trailing `-`.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

const DESC_SUFFIX: char = '-';

/// Parameters owned by `QueryOptions` fields; `extra` may not repeat them.
const RESERVED: [&str; 7] = ["limit", "offset", "fields", "sort", "q", "count", "expandLevel"];

/// Direction applied to every field of a `Sort`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One or more sort fields sharing a direction.
///
/// Deserializes from the tuple shapes `["F"]`, `["F", "desc"]`,
/// `[["F", "G"]]` and `[["F", "G"], "desc"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "SortSpec")]
pub struct Sort {
    pub fields: Vec<String>,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl AsRef<str>) -> Self {
        Self::by([field], SortDirection::Asc)
    }

    pub fn desc(field: impl AsRef<str>) -> Self {
        Self::by([field], SortDirection::Desc)
    }

    pub fn by<I, S>(fields: I, direction: SortDirection) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fields: fields.into_iter().map(|f| f.as_ref().to_string()).collect(),
            direction,
        }
    }

    fn render(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|f| match self.direction {
                SortDirection::Asc => f.clone(),
                SortDirection::Desc => format!("{f}{DESC_SUFFIX}"),
            })
            .collect();
        Some(rendered.join(","))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortFields {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortSpec {
    Directed(SortFields, SortDirection),
    Plain((SortFields,)),
}

impl From<SortSpec> for Sort {
    fn from(spec: SortSpec) -> Self {
        let (fields, direction) = match spec {
            SortSpec::Directed(fields, direction) => (fields, direction),
            SortSpec::Plain((fields,)) => (fields, SortDirection::Asc),
        };
        match fields {
            SortFields::One(field) => Sort::by([field], direction),
            SortFields::Many(fields) => Sort::by(fields, direction),
        }
    }
}

/// Request shaping options shared by every endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub fields: Vec<String>,
    pub sort: Option<Sort>,
    /// Pre-built filter expression, sent verbatim.
    pub q: Option<String>,
    pub count: Option<bool>,
    pub expand_level: Option<String>,
    /// Vendor flags passed through as `key=value`. Keys naming one of the
    /// fields above are ignored.
    pub extra: BTreeMap<String, String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn page(self, limit: u64, offset: u64) -> Self {
        self.limit(limit).offset(offset)
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn q(mut self, filter: impl Into<String>) -> Self {
        self.q = Some(filter.into());
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    pub fn expand_level(mut self, level: impl Into<String>) -> Self {
        self.expand_level = Some(level.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Serializes options into a query string without the leading `?`.
///
/// Returns an empty string when nothing is set.
pub fn build_query_string(options: &QueryOptions) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if let Some(limit) = options.limit {
        serializer.append_pair("limit", &limit.to_string());
    }
    if let Some(offset) = options.offset {
        serializer.append_pair("offset", &offset.to_string());
    }
    if !options.fields.is_empty() {
        serializer.append_pair("fields", &options.fields.join(","));
    }
    if let Some(sort) = options.sort.as_ref().and_then(Sort::render) {
        serializer.append_pair("sort", &sort);
    }
    if let Some(q) = options.q.as_deref().filter(|q| !q.is_empty()) {
        serializer.append_pair("q", q);
    }
    if options.count == Some(true) {
        serializer.append_pair("count", "true");
    }
    if let Some(level) = options.expand_level.as_deref().filter(|l| !l.is_empty()) {
        serializer.append_pair("expandLevel", level);
    }
    for (key, value) in options.extra.iter().filter(|(_, v)| !v.is_empty()) {
        if RESERVED.contains(&key.as_str()) {
            debug!(%key, "ignoring extra flag that shadows a query option");
            continue;
        }
        serializer.append_pair(key, value);
    }

    serializer.finish()
}

/// Decodes a query string (with or without a leading `?`) into pairs.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Re-encodes decoded pairs in the given order.
pub fn encode_pairs<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k.as_ref(), v.as_ref());
    }
    serializer.finish()
}

/// Appends `?qs` to `path` when the query string is non-empty.
pub fn with_query(path: String, options: &QueryOptions) -> String {
    let qs = build_query_string(options);
    if qs.is_empty() {
        path
    } else {
        format!("{path}?{qs}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(options: &QueryOptions) -> Vec<(String, String)> {
        parse_query_string(&build_query_string(options))
    }

    fn has(pairs: &[(String, String)], key: &str, value: &str) -> bool {
        pairs.iter().any(|(k, v)| k == key && v == value)
    }

    #[test]
    fn empty_options_yield_empty_string() {
        assert_eq!(build_query_string(&QueryOptions::default()), "");
    }

    #[test]
    fn pagination_and_default_sort() {
        let options = QueryOptions::new().page(10, 0).sort(Sort::asc("TRCODE"));
        assert_eq!(build_query_string(&options), "limit=10&offset=0&sort=TRCODE");
    }

    #[test]
    fn descending_sort_marks_every_field() {
        let options = QueryOptions::new().sort(Sort::by(["DATE_", "FICHENO"], SortDirection::Desc));
        let p = pairs(&options);
        assert!(has(&p, "sort", "DATE_-,FICHENO-"));
    }

    #[test]
    fn ascending_group_sort_is_comma_joined() {
        let options = QueryOptions::new().sort(Sort::by(["DATE_", "FICHENO"], SortDirection::Asc));
        assert!(has(&pairs(&options), "sort", "DATE_,FICHENO"));
    }

    #[test]
    fn empty_sort_and_fields_are_omitted() {
        let options = QueryOptions {
            fields: Vec::new(),
            sort: Some(Sort::by(Vec::<String>::new(), SortDirection::Desc)),
            q: Some(String::new()),
            ..QueryOptions::default()
        };
        assert_eq!(build_query_string(&options), "");
    }

    #[test]
    fn fields_are_comma_joined() {
        let options = QueryOptions::new().fields(["FICHENO", "DATE_", "AUXIL_CODE"]);
        assert!(has(&pairs(&options), "fields", "FICHENO,DATE_,AUXIL_CODE"));
    }

    #[test]
    fn filter_survives_encoding() {
        let q = "CODE eq 'A&B' and NAME like 'x=y*'";
        let options = QueryOptions::new().q(q);
        let encoded = build_query_string(&options);
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('\''));
        assert_eq!(parse_query_string(&encoded), vec![("q".to_string(), q.to_string())]);
    }

    #[test]
    fn count_only_when_true() {
        assert_eq!(build_query_string(&QueryOptions::new().count(true)), "count=true");
        assert_eq!(build_query_string(&QueryOptions::new().count(false)), "");
    }

    #[test]
    fn declared_order_then_extra_flags() {
        let options = QueryOptions::new()
            .extra("withCount", "1")
            .extra("dateFormat", "iso")
            .expand_level("full")
            .count(true)
            .q("STATUS eq 1")
            .limit(5);
        let keys: Vec<String> = pairs(&options).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["limit", "q", "count", "expandLevel", "dateFormat", "withCount"]);
    }

    #[test]
    fn extra_flags_cannot_shadow_options() {
        let options = QueryOptions::new()
            .limit(10)
            .q("A eq 1")
            .extra("limit", "99")
            .extra("q", "B eq 2")
            .extra("expandLevel", "none")
            .extra("withCount", "1");
        assert_eq!(build_query_string(&options), "limit=10&q=A+eq+1&withCount=1");

        let only_reserved = QueryOptions::new().extra("sort", "X").extra("count", "true");
        assert_eq!(build_query_string(&only_reserved), "");
    }

    #[test]
    fn leading_question_mark_is_ignored_when_parsing() {
        assert_eq!(
            parse_query_string("?limit=1"),
            vec![("limit".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn with_query_omits_separator_when_empty() {
        assert_eq!(with_query("/shifts".into(), &QueryOptions::default()), "/shifts");
        assert_eq!(with_query("/shifts".into(), &QueryOptions::new().limit(1)), "/shifts?limit=1");
    }

    #[test]
    fn sort_deserializes_from_tuple_shapes() {
        let parse = |s: &str| serde_json::from_str::<Sort>(s).unwrap();
        assert_eq!(parse(r#"["TRCODE"]"#), Sort::asc("TRCODE"));
        assert_eq!(parse(r#"["TRCODE","desc"]"#), Sort::desc("TRCODE"));
        assert_eq!(
            parse(r#"[["DATE_","FICHENO"]]"#),
            Sort::by(["DATE_", "FICHENO"], SortDirection::Asc)
        );
        assert_eq!(
            parse(r#"[["DATE_","FICHENO"],"desc"]"#),
            Sort::by(["DATE_", "FICHENO"], SortDirection::Desc)
        );
        assert!(serde_json::from_str::<Sort>(r#"["TRCODE","sideways"]"#).is_err());
    }

    #[test]
    fn options_deserialize_with_camel_case_keys() {
        let options: QueryOptions = serde_json::from_str(
            r#"{"limit":10,"offset":0,"sort":["TRCODE"],"expandLevel":"full","extra":{"dateFormat":"iso"}}"#,
        )
        .unwrap();
        assert_eq!(
            build_query_string(&options),
            "limit=10&offset=0&sort=TRCODE&expandLevel=full&dateFormat=iso"
        );
    }

    fn arb_options() -> impl Strategy<Value = QueryOptions> {
        (
            proptest::option::of(any::<u64>()),
            proptest::option::of(any::<u64>()),
            proptest::collection::vec("[A-Z_]{1,12}", 0..4),
            proptest::option::of((proptest::collection::vec("[A-Z_]{1,8}", 0..3), any::<bool>())),
            proptest::option::of(".{0,40}"),
            proptest::option::of(any::<bool>()),
            proptest::option::of("[a-zA-Z0-9 ,]{0,12}"),
            proptest::collection::btree_map("[a-zA-Z]{1,10}", ".{0,12}", 0..3),
        )
            .prop_map(|(limit, offset, fields, sort, q, count, expand_level, extra)| QueryOptions {
                limit,
                offset,
                fields,
                sort: sort.map(|(fields, desc)| {
                    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                    Sort::by(fields, direction)
                }),
                q,
                count,
                expand_level,
                extra,
            })
    }

    proptest! {
        #[test]
        fn serializer_output_is_a_fixed_point(options in arb_options()) {
            let encoded = build_query_string(&options);
            let reencoded = encode_pairs(parse_query_string(&encoded));
            prop_assert_eq!(encoded, reencoded);
        }

        #[test]
        fn filter_round_trips(q in ".{1,60}") {
            let encoded = build_query_string(&QueryOptions::new().q(q.clone()));
            prop_assert_eq!(parse_query_string(&encoded), vec![("q".to_string(), q)]);
        }
    }
}
