//! Dot-delimited paths into nested configuration values.
//!
//! A [`ConfigPath`] is parsed once and stored in canonical form: the legacy
//! `design` root is rewritten to `tokens`, so `design.color.primary` and
//! `tokens.color.primary` address the same leaf for every operation.
//!
//! The free functions operate on any `serde_json::Value` tree:
//!
//! - [`get`] never fails; a missing segment or a scalar met mid-path is absent.
//! - [`set`] creates intermediate objects and overwrites whatever sits at the
//!   final segment. A scalar met where an object is needed is replaced.
//! - [`merge`] behaves like [`set`] except that an object written onto an
//!   existing object is merged key by key.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::InvalidPathError;

/// Historical name of the branding root.
pub const LEGACY_ROOT: &str = "design";
/// Current name of the branding root.
pub const TOKENS_ROOT: &str = "tokens";

const SEPARATOR: char = '.';

/// A validated, canonical configuration path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// Parses a dot-delimited path, applying the legacy root rewrite.
    pub fn parse(raw: &str) -> Result<Self, InvalidPathError> {
        if raw.trim().is_empty() {
            return Err(InvalidPathError::Empty);
        }
        let mut segments = Vec::new();
        for segment in raw.split(SEPARATOR) {
            if segment.trim().is_empty() {
                return Err(InvalidPathError::EmptySegment {
                    path: raw.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self::canonical(segments))
    }

    /// Builds a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, InvalidPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for segment in segments {
            out.push(validate_segment(segment.into())?);
        }
        if out.is_empty() {
            return Err(InvalidPathError::Empty);
        }
        Ok(Self::canonical(out))
    }

    /// Returns a new path with `segment` appended.
    ///
    /// The segment is taken literally; it may not be blank or contain a dot.
    pub fn child(&self, segment: &str) -> Result<Self, InvalidPathError> {
        let segment = validate_segment(segment.to_string())?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment; selects the top-level section of a configuration tree.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Segments after the root.
    pub fn rest(&self) -> &[String] {
        &self.segments[1..]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &ConfigPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    fn canonical(mut segments: Vec<String>) -> Self {
        if segments[0] == LEGACY_ROOT {
            segments[0] = TOKENS_ROOT.to_string();
        }
        Self { segments }
    }
}

fn validate_segment(segment: String) -> Result<String, InvalidPathError> {
    if segment.trim().is_empty() || segment.contains(SEPARATOR) {
        return Err(InvalidPathError::InvalidSegment { segment });
    }
    Ok(segment)
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ConfigPath {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ConfigPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ConfigPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Reads the value at `path`, or `None` when any segment is missing.
pub fn get<'a>(tree: &'a Value, path: &ConfigPath) -> Option<&'a Value> {
    get_segments(tree, path.segments())
}

/// Writes `value` at `path`, replacing whatever was there.
pub fn set(tree: &mut Value, path: &ConfigPath, value: Value) {
    *slot(tree, path.segments()) = value;
}

/// Writes `value` at `path`, merging objects key by key.
pub fn merge(tree: &mut Value, path: &ConfigPath, value: Value) {
    deep_merge(slot(tree, path.segments()), value);
}

/// Merges `source` into `target`.
///
/// Two objects merge recursively; in every other combination `source`
/// replaces `target` outright.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (target, source) => *target = source,
    }
}

pub(crate) fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

pub(crate) fn get_segments<'a>(tree: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = tree;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns the slot addressed by `segments`, creating objects along the way.
///
/// A slot that does not exist yet is created as `null`.
pub(crate) fn slot<'a>(tree: &'a mut Value, segments: &[String]) -> &'a mut Value {
    let mut current = tree;
    for segment in segments {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            unreachable!("non-object slots are replaced above");
        };
        current = map.entry(segment.clone()).or_insert(Value::Null);
    }
    current
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> ConfigPath {
        ConfigPath::parse(raw).unwrap()
    }

    #[test]
    fn rejects_empty_paths_and_segments() {
        assert_eq!(ConfigPath::parse(""), Err(InvalidPathError::Empty));
        assert_eq!(ConfigPath::parse("   "), Err(InvalidPathError::Empty));
        for raw in ["a..b", ".a", "a.", "a. .b"] {
            assert!(
                matches!(
                    ConfigPath::parse(raw),
                    Err(InvalidPathError::EmptySegment { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn legacy_root_is_rewritten() {
        assert_eq!(path("design.color.primary").to_string(), "tokens.color.primary");
        assert_eq!(path("design").to_string(), "tokens");
        assert_eq!(path("designer.x").to_string(), "designer.x");
        assert_eq!(path("tenant.design").to_string(), "tenant.design");
    }

    #[test]
    fn get_reports_absent_instead_of_failing() {
        let tree = json!({"tenant": {"name": "Alpha", "limits": 5}});
        assert_eq!(get(&tree, &path("tenant.name")), Some(&json!("Alpha")));
        assert_eq!(get(&tree, &path("tenant.missing")), None);
        assert_eq!(get(&tree, &path("tenant.limits.daily")), None);
        assert_eq!(get(&tree, &path("other.name")), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut tree = json!({});
        set(&mut tree, &path("compliance.fdx.enabled"), json!(true));
        assert_eq!(tree, json!({"compliance": {"fdx": {"enabled": true}}}));
    }

    #[test]
    fn set_replaces_scalar_met_mid_path() {
        let mut tree = json!({"rules": {"transfer": 10}});
        set(&mut tree, &path("rules.transfer.daily_limit"), json!(500));
        assert_eq!(tree, json!({"rules": {"transfer": {"daily_limit": 500}}}));
    }

    #[test]
    fn set_overwrites_objects_without_merging() {
        let mut tree = json!({"tokens": {"color": {"primary": "#000", "accent": "#fff"}}});
        set(&mut tree, &path("design.color"), json!({"primary": "#111"}));
        assert_eq!(tree, json!({"tokens": {"color": {"primary": "#111"}}}));
    }

    #[test]
    fn merge_keeps_sibling_leaves() {
        let mut tree = json!({"tokens": {"color": {"primary": "#000", "accent": "#fff"}}});
        merge(&mut tree, &path("tokens.color"), json!({"primary": "#111"}));
        assert_eq!(
            tree,
            json!({"tokens": {"color": {"primary": "#111", "accent": "#fff"}}})
        );
    }

    #[test]
    fn merge_overwrites_scalars_and_arrays() {
        let mut tree = json!({"products": {"accounts": [1, 2, 3], "count": 3}});
        merge(&mut tree, &path("products.accounts"), json!([4]));
        merge(&mut tree, &path("products.count"), json!(1));
        assert_eq!(tree, json!({"products": {"accounts": [4], "count": 1}}));
    }

    #[test]
    fn child_rejects_dotted_segments() {
        let features = path("features");
        assert_eq!(features.child("bill_pay").unwrap().to_string(), "features.bill_pay");
        assert!(features.child("a.b").is_err());
        assert!(features.child("").is_err());
    }

    #[test]
    fn path_serializes_as_canonical_string() {
        let json = serde_json::to_string(&path("design.logo.primary")).unwrap();
        assert_eq!(json, "\"tokens.logo.primary\"");
        let back: ConfigPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path("tokens.logo.primary"));
        assert!(serde_json::from_str::<ConfigPath>("\"a..b\"").is_err());
    }
}
