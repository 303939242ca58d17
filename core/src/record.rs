use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArrayCodecError {
    #[error("failed to encode string list: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored value is not a JSON array of strings: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Ordered list of strings kept in a single column as JSON array text.
///
/// Order and duplicates survive the round-trip. An absent list is modelled as
/// `Option<StringList>` on [`Record`], so `None` and an empty list stay apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StringList(items.into_iter().map(Into::into).collect())
    }

    /// Stored form: `["1.2.3.4","5.6.7.8"]`.
    pub fn encode(&self) -> Result<String, ArrayCodecError> {
        serde_json::to_string(&self.0).map_err(ArrayCodecError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ArrayCodecError> {
        serde_json::from_str::<Vec<String>>(text)
            .map(StringList)
            .map_err(ArrayCodecError::Decode)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self {
        StringList(v)
    }
}

/// One httpx observation as read from a JSON line and as stored in `httpx_data`.
///
/// Scalars that are missing or `null` in the input take their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub port: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub input: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub scheme: String,
    #[serde(deserialize_with = "null_as_default")]
    pub webserver: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    pub a: Option<StringList>,
    pub tech: Option<StringList>,
    #[serde(deserialize_with = "null_as_default")]
    pub words: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub lines: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status_code: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub content_length: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub program: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

impl Record {
    /// Parses one ingestion line; surrounding whitespace is tolerated.
    pub fn from_json(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }

    /// Comma-joined `tech`, empty when the list is absent.
    pub fn tech_joined(&self) -> String {
        self.tech.as_ref().map(|t| t.join(",")).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_encodes_in_order_with_duplicates() {
        let l = StringList::new(["nginx", "php", "nginx"]);
        let s = l.encode().unwrap();
        assert_eq!(s, r#"["nginx","php","nginx"]"#);
        assert_eq!(StringList::decode(&s).unwrap(), l);
    }

    #[test]
    fn empty_list_is_not_null() {
        let s = StringList::default().encode().unwrap();
        assert_eq!(s, "[]");
        assert!(StringList::decode(&s).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_non_arrays() {
        assert!(matches!(StringList::decode("{\"x\":1}"), Err(ArrayCodecError::Decode(_))));
        assert!(matches!(StringList::decode("[1,2]"), Err(ArrayCodecError::Decode(_))));
        assert!(StringList::decode("not json").is_err());
    }

    #[test]
    fn missing_fields_default_and_unknown_are_ignored() {
        let r = Record::from_json(
            br#"{"url":"https://example.com","status_code":200,"tech":["nginx"],"hash":{"body_md5":"x"},"chain_status_codes":[301,200]}"#,
        )
        .unwrap();
        assert_eq!(r.url, "https://example.com");
        assert_eq!(r.status_code, 200);
        assert_eq!(r.title, "");
        assert_eq!(r.words, 0);
        assert_eq!(r.a, None);
        assert_eq!(r.tech, Some(StringList::new(["nginx"])));
    }

    #[test]
    fn null_scalars_take_zero_values() {
        let r = Record::from_json(
            br#"{"url":"https://example.com","title":null,"words":null,"status_code":null,"program":null}"#,
        )
        .unwrap();
        assert_eq!(r.url, "https://example.com");
        assert_eq!(r.title, "");
        assert_eq!(r.words, 0);
        assert_eq!(r.status_code, 0);
        assert_eq!(r.program, "");
    }

    #[test]
    fn null_and_empty_arrays_stay_distinct() {
        let r = Record::from_json(br#"{"a":null,"tech":[]}"#).unwrap();
        assert_eq!(r.a, None);
        assert_eq!(r.tech, Some(StringList::default()));
    }

    #[test]
    fn json_output_omits_unassigned_identity() {
        let r = Record { url: "http://x".into(), ..Default::default() };
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert!(v.get("id").is_none());
        assert!(v.get("created_at").is_none());
        assert!(v["a"].is_null());
    }

    #[test]
    fn tech_joined_handles_absent_list() {
        let mut r = Record::default();
        assert_eq!(r.tech_joined(), "");
        r.tech = Some(StringList::new(["nginx", "php"]));
        assert_eq!(r.tech_joined(), "nginx,php");
    }
}
