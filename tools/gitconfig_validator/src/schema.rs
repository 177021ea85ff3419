use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::Serialize;

use crate::validation::validate;

/// Conventional name of the file holding repository connections.
pub const GIT_CONFIG_FILE_NAME: &str = ".gitconfig.yml";

pub const NAME: &str = "name";
pub const OWNER: &str = "owner";
pub const REPO: &str = "repo";
pub const ACCESS_TOKEN: &str = "access-token";
pub const BRANCH: &str = "branch";
pub const BASE_URL: &str = "base-url";
pub const REVISION: &str = "revision";
pub const SCRIPT_ROOT: &str = "script-root";

/// Every key a repository document may contain.
pub const SUPPORTED_FIELDS: [&str; 8] = [
    NAME,
    OWNER,
    REPO,
    ACCESS_TOKEN,
    BRANCH,
    BASE_URL,
    REVISION,
    SCRIPT_ROOT,
];

pub const REQUIRED_FIELDS: [&str; 4] = [NAME, OWNER, REPO, ACCESS_TOKEN];

/// Revision used when a document does not pin one.
pub const DEFAULT_REVISION: &str = "-1";

pub fn is_supported_field(key: &str) -> bool {
    SUPPORTED_FIELDS.contains(&key)
}

/// Flat key/value view of one configuration document.
///
/// Keys keep the order they were inserted in, so the first offending key of a
/// document is also the first one reported. Scalar values of any type are kept
/// as their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    entries: Vec<(String, String)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing (in place) and returning any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Document
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut document = Document::new();
        for (key, value) in iter {
            document.insert(key, value);
        }
        document
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping of repository configuration fields")
    }

    // An empty YAML document arrives as null.
    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::new())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Document, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut document = Document::new();
        while let Some(ScalarText(key)) = map.next_key()? {
            let ScalarText(value) = map.next_value()?;
            document.insert(key, value);
        }
        Ok(document)
    }
}

/// Textual form of a scalar node. Null becomes the empty string.
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor).map(ScalarText)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
        Ok(format!("{value:?}"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_owned())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
        Ok(value)
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}

/// A validated connection to a remote script repository.
///
/// Only [`validate`] builds one, so every field is always populated: optional
/// keys missing from the source document carry their documented defaults.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    pub(crate) name: String,
    pub(crate) owner: String,
    pub(crate) repo: String,
    pub(crate) access_token: String,
    pub(crate) branch: String,
    pub(crate) base_url: String,
    pub(crate) revision: String,
    pub(crate) script_root: String,
}

impl RepositoryConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Empty when the host's default branch should be used.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Empty when the public host is used.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn script_root(&self) -> &str {
        &self.script_root
    }

    pub fn has_base_url(&self) -> bool {
        !self.base_url.is_empty()
    }

    pub fn has_pinned_revision(&self) -> bool {
        self.revision != DEFAULT_REVISION
    }
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("access_token", &"****")
            .field("branch", &self.branch)
            .field("base_url", &self.base_url)
            .field("revision", &self.revision)
            .field("script_root", &self.script_root)
            .finish()
    }
}

impl<'de> Deserialize<'de> for RepositoryConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Document::deserialize(deserializer)?;
        validate(&document).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut document = Document::new();
        document.insert("owner", "acme");
        document.insert("repo", "app");
        assert_eq!(document.insert("owner", "other"), Some("acme".to_string()));
        let keys: Vec<_> = document.keys().collect();
        assert_eq!(keys, vec!["owner", "repo"]);
        assert_eq!(document.get("owner"), Some("other"));
    }

    #[test]
    fn scalars_are_kept_as_text() {
        let yaml = r#"name: 42
owner: true
repo: 1.5
access-token: ~
branch: "main"
"#;
        let document: Document = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(document.get("name"), Some("42"));
        assert_eq!(document.get("owner"), Some("true"));
        assert_eq!(document.get("repo"), Some("1.5"));
        assert_eq!(document.get("access-token"), Some(""));
        assert_eq!(document.get("branch"), Some("main"));
    }

    #[test]
    fn wide_integers_keep_every_digit() {
        let yaml = "access-token: 123456789012345678901234\nrevision: -98765432109876543210\n";
        let document: Document = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(document.get("access-token"), Some("123456789012345678901234"));
        assert_eq!(document.get("revision"), Some("-98765432109876543210"));
    }

    #[test]
    fn nested_values_are_rejected() {
        let yaml = r#"name: p
owner:
  - a
  - b
"#;
        let err = serde_yaml::from_str::<Document>(yaml).unwrap_err();
        assert!(err.to_string().contains("expected a scalar value"));
    }

    #[test]
    fn top_level_sequence_is_rejected() {
        let err = serde_yaml::from_str::<Document>("- name\n- owner\n").unwrap_err();
        assert!(err.to_string().contains("mapping of repository configuration fields"));
    }

    #[test]
    fn debug_masks_access_token() {
        let config = RepositoryConfig {
            name: "proj".into(),
            owner: "acme".into(),
            repo: "app".into(),
            access_token: "tok123".into(),
            branch: String::new(),
            base_url: String::new(),
            revision: DEFAULT_REVISION.into(),
            script_root: String::new(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("tok123"));
        assert!(rendered.contains("****"));
        assert!(!config.has_pinned_revision());
    }

    #[test]
    fn allow_list_is_case_sensitive() {
        assert!(is_supported_field("access-token"));
        assert!(!is_supported_field("Access-Token"));
        assert!(!is_supported_field("access_token"));
        assert!(!is_supported_field("access"));
    }
}
