//! Profile keys and document paths
//!
//! Two path shapes describe the same location:
//!
//! - A [`ProfileKey`] names a profile by its chain of child-map keys,
//!   written dotted: `parent.child`.
//! - A [`ConfigPath`] names any location inside a layer document, with the
//!   `profiles` structure marker between nesting levels:
//!   `profiles.parent.profiles.child.properties.host`.
//!
//! [`ConfigPath::for_profile`] and [`ConfigPath::split_profile`] are the only
//! conversions between the two; nothing else in the workspace splits or joins
//! dotted strings to discover profile boundaries.
//!
//! # Examples
//!
//! ```
//! use teamcfg_model::path::{ConfigPath, ProfileKey};
//!
//! let key = ProfileKey::parse("lpar1.zosmf").unwrap();
//! let path = ConfigPath::for_property(&key, "host");
//! assert_eq!(path.to_string(), "profiles.lpar1.profiles.zosmf.properties.host");
//!
//! let (owner, rest) = path.split_profile().unwrap();
//! assert_eq!(owner, key);
//! assert_eq!(rest, vec!["properties".to_string(), "host".to_string()]);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Marker separating nesting levels in a document path
pub const PROFILES_SEGMENT: &str = "profiles";
/// Segment holding a profile's property map
pub const PROPERTIES_SEGMENT: &str = "properties";
/// Segment holding a profile's type
pub const TYPE_SEGMENT: &str = "type";
/// Segment holding a profile's secure property list
pub const SECURE_SEGMENT: &str = "secure";

/// Qualified name of a profile inside one layer (`parent.child`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileKey {
    segments: Vec<String>,
}

fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("key segments cannot be empty");
    }
    if segment == PROFILES_SEGMENT {
        return Err("'profiles' is reserved as the nesting marker");
    }
    if segment.chars().any(char::is_whitespace) {
        return Err("key segments cannot contain whitespace");
    }
    if segment.contains('.') {
        return Err("key segments cannot contain '.'");
    }
    Ok(())
}

impl ProfileKey {
    /// Parse a dotted profile key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfileKey`] for an empty key, an empty
    /// segment (`a..b`), whitespace, or a segment equal to `profiles`.
    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::invalid_key(key, "key is empty"));
        }
        Self::from_segments(key.split('.'))
    }

    /// Build a key from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let joined = segments.join(".");
        if segments.is_empty() {
            return Err(Error::invalid_key(joined, "key is empty"));
        }
        for segment in &segments {
            validate_segment(segment).map_err(|reason| Error::invalid_key(&joined, reason))?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of nesting levels (`a` is 1, `a.b` is 2)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment, i.e. the profile's own name
    pub fn leaf(&self) -> &str {
        // segments is never empty by construction
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<ProfileKey> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Key of a direct child profile.
    pub fn child(&self, name: &str) -> Result<ProfileKey> {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self::from_segments(segments)
    }

    /// Proper ancestors, outermost first (`a`, `a.b` for `a.b.c`).
    pub fn ancestors(&self) -> Vec<ProfileKey> {
        (1..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// True when `other` is nested somewhere below `self`.
    pub fn is_ancestor_of(&self, other: &ProfileKey) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// True when `self` equals `prefix` or is nested below it.
    pub fn starts_with(&self, prefix: &ProfileKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Segments remaining after `prefix`, if `self` starts with it.
    pub fn strip_prefix(&self, prefix: &ProfileKey) -> Option<&[String]> {
        self.segments.strip_prefix(prefix.segments.as_slice())
    }

    /// Replace the leading `old` segments with `new`.
    ///
    /// Returns `None` when `self` does not start with `old`.
    ///
    /// ```
    /// use teamcfg_model::ProfileKey;
    ///
    /// let key = ProfileKey::parse("tso.zosmf").unwrap();
    /// let old = ProfileKey::parse("tso").unwrap();
    /// let new = ProfileKey::parse("lpar.tso1").unwrap();
    /// assert_eq!(key.rebase(&old, &new).unwrap().to_string(), "lpar.tso1.zosmf");
    /// ```
    pub fn rebase(&self, old: &ProfileKey, new: &ProfileKey) -> Option<ProfileKey> {
        let rest = self.strip_prefix(old)?;
        let mut segments = new.segments.clone();
        segments.extend(rest.iter().cloned());
        Some(Self { segments })
    }

    /// Document path of this profile (`profiles.a.profiles.b`).
    pub fn config_path(&self) -> ConfigPath {
        ConfigPath::for_profile(self)
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for ProfileKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProfileKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProfileKey> for String {
    fn from(key: ProfileKey) -> Self {
        key.to_string()
    }
}

/// A location inside a layer document
///
/// Unlike [`ProfileKey`], a `ConfigPath` is never rejected at parse time:
/// it may point at a profile, one of its fields, or somewhere unrelated
/// to profiles altogether (`defaults.zosmf`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// Parse a dotted document path, ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `profiles.a.profiles.b` for key `a.b`
    pub fn for_profile(key: &ProfileKey) -> Self {
        let mut segments = Vec::with_capacity(key.depth() * 2);
        for segment in key.segments() {
            segments.push(PROFILES_SEGMENT.to_string());
            segments.push(segment.clone());
        }
        Self { segments }
    }

    /// `profiles.a.properties.<name>`
    pub fn for_property(key: &ProfileKey, name: &str) -> Self {
        Self::for_profile(key).join([PROPERTIES_SEGMENT, name])
    }

    /// `profiles.a.type`
    pub fn for_type(key: &ProfileKey) -> Self {
        Self::for_profile(key).join([TYPE_SEGMENT])
    }

    /// A new path with `tail` appended.
    pub fn join<I, S>(&self, tail: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = self.segments.clone();
        segments.extend(tail.into_iter().map(Into::into));
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn starts_with(&self, prefix: &ConfigPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Segments after `prefix`, if `self` starts with it.
    pub fn relative_to(&self, prefix: &ConfigPath) -> Option<&[String]> {
        self.segments.strip_prefix(prefix.segments.as_slice())
    }

    /// Split into the innermost owning profile and the remainder relative to it.
    ///
    /// `profiles.a.profiles.b.properties.host` becomes (`a.b`, `[properties, host]`).
    /// Returns `None` when the path does not start inside a profile or a
    /// profile segment is not a valid key segment.
    pub fn split_profile(&self) -> Option<(ProfileKey, Vec<String>)> {
        let mut names = Vec::new();
        let mut index = 0;
        while index + 1 < self.segments.len() && self.segments[index] == PROFILES_SEGMENT {
            names.push(self.segments[index + 1].clone());
            index += 2;
        }
        if names.is_empty() {
            return None;
        }
        let key = ProfileKey::from_segments(names).ok()?;
        Some((key, self.segments[index..].to_vec()))
    }

    /// The owning profile, see [`ConfigPath::split_profile`].
    pub fn profile_key(&self) -> Option<ProfileKey> {
        self.split_profile().map(|(key, _)| key)
    }

    /// Property name when the path is exactly `...properties.<name>`.
    pub fn property_name(&self) -> Option<String> {
        let (_, rest) = self.split_profile()?;
        match rest.as_slice() {
            [section, name] if section == PROPERTIES_SEGMENT => Some(name.clone()),
            _ => None,
        }
    }

    /// Move a path owned by profile `old` (or one of its descendants) under `new`.
    pub fn rebase_profile(&self, old: &ProfileKey, new: &ProfileKey) -> Option<ConfigPath> {
        let rest = self.relative_to(&Self::for_profile(old))?;
        Some(Self::for_profile(new).join(rest.iter().cloned()))
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<String> for ConfigPath {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ConfigPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ConfigPath> for String {
    fn from(path: ConfigPath) -> Self {
        path.to_string()
    }
}

/// Insert `value` into `target` at a nested key path, creating intermediate
/// objects as needed. A non-object value in the way is replaced.
///
/// ```
/// use serde_json::{json, Map};
/// use teamcfg_model::path::insert_nested;
///
/// let mut props = Map::new();
/// insert_nested(&mut props, &["tls".to_string(), "verify".to_string()], json!(true));
/// assert_eq!(serde_json::Value::Object(props), json!({"tls": {"verify": true}}));
/// ```
pub fn insert_nested(target: &mut Map<String, Value>, keys: &[String], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = target;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

/// Remove the value at a nested key path. Returns the removed value, or
/// `None` when some key along the path is missing or not an object.
///
/// ```
/// use serde_json::{json, Map};
/// use teamcfg_model::path::remove_nested;
///
/// let mut props = Map::new();
/// props.insert("tls".to_string(), json!({"ca": "x", "verify": true}));
/// assert_eq!(remove_nested(&mut props, &["tls".to_string(), "verify".to_string()]), Some(json!(true)));
/// assert_eq!(serde_json::Value::Object(props), json!({"tls": {"ca": "x"}}));
/// ```
pub fn remove_nested(target: &mut Map<String, Value>, keys: &[String]) -> Option<Value> {
    let (last, parents) = keys.split_last()?;

    let mut current = target;
    for key in parents {
        current = current.get_mut(key)?.as_object_mut()?;
    }
    current.remove(last)
}
