use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::error::Result;

/// Parse `raw` and overlay `params` onto its query string.
///
/// A parameter replaces every existing value of the same key; keys that are
/// not overridden keep all their values. The query is re-serialized with keys
/// in lexicographic order. An empty `params` map leaves the query untouched.
pub fn resolve_url(raw: &str, params: &HashMap<String, String>) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if params.is_empty() {
        return Ok(url);
    }

    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for (key, value) in params {
        query.insert(key.clone(), vec![value.clone()]);
    }

    let encoded = encode_sorted(&query);
    url.set_query(Some(&encoded));
    Ok(url)
}

/// Encode single-valued pairs as `application/x-www-form-urlencoded`,
/// sorted by key.
pub fn encode_pairs(pairs: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}

fn encode_sorted(query: &BTreeMap<String, Vec<String>>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in query {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}
