use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};
use crate::toc::ResourceId;

/// Resolves a record identifier to its declared type name.
///
/// Returns `None` when the id is not declared at all. A declared name that
/// no codec understands is reported by the parser as an unknown type.
pub trait TypeRegistry {
    fn type_of(&self, id: &ResourceId) -> Option<&str>;
}

/// Id → type-name map, stored as JSON:
///
/// ```json
/// { "types": { "nams": "text", "icon": "bitmap" } }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    #[serde(default)]
    pub types: BTreeMap<ResourceId, String>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ResourceId>, type_name: impl Into<String>) {
        self.types.insert(id.into(), type_name.into());
    }

    /// Later entries win.
    pub fn extend(&mut self, other: TypeMap) {
        self.types.extend(other.types);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| ResourceError::Registry(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes)
            .map_err(|e| ResourceError::Registry(format!("{}: {e}", path.display())))
    }

    /// Parse a single `ID=type` assignment.
    pub fn parse_assignment(s: &str) -> std::result::Result<(ResourceId, String), String> {
        let (id, tag) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=TYPE, got \"{s}\""))?;
        if id.is_empty() || tag.is_empty() {
            return Err(format!("expected ID=TYPE, got \"{s}\""));
        }
        Ok((ResourceId::parse_escaped(id)?, tag.to_owned()))
    }
}

impl TypeRegistry for TypeMap {
    fn type_of(&self, id: &ResourceId) -> Option<&str> {
        self.types.get(id).map(String::as_str)
    }
}

impl FromIterator<(ResourceId, String)> for TypeMap {
    fn from_iter<I: IntoIterator<Item = (ResourceId, String)>>(iter: I) -> Self {
        Self { types: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_string_ids() {
        let map = TypeMap::from_bytes(br#"{"types": {"nam": "text", "icon": "bitmap"}}"#).unwrap();
        assert_eq!(map.type_of(&ResourceId::new("nam")), Some("text"));
        assert_eq!(map.type_of(&ResourceId::from_bytes(*b"icon")), Some("bitmap"));
        assert_eq!(map.type_of(&ResourceId::new("xxxx")), None);

        let back = TypeMap::from_bytes(&map.to_bytes().unwrap()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn assignment_parsing() {
        let (id, tag) = TypeMap::parse_assignment("abcd=bitmap").unwrap();
        assert_eq!(id, ResourceId::new("abcd"));
        assert_eq!(tag, "bitmap");
        assert!(TypeMap::parse_assignment("abcd").is_err());
        assert!(TypeMap::parse_assignment("=text").is_err());

        let (id, _) = TypeMap::parse_assignment(r"\x01ab=text").unwrap();
        assert_eq!(id, ResourceId::from_bytes([0x01, b'a', b'b', 0]));
    }

    #[test]
    fn unprintable_ids_survive_json() {
        let mut map = TypeMap::new();
        map.insert(ResourceId::from_bytes([0x01, b'a', b'b', b'c']), "text");
        map.insert(ResourceId::from_bytes([b'p', 0xE9, b'\\', b'x']), "bitmap");
        map.insert("icon", "bitmap");

        let json = map.to_bytes().unwrap();
        let back = TypeMap::from_bytes(&json).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.type_of(&ResourceId::from_bytes([0x01, b'a', b'b', b'c'])), Some("text"));
    }

    #[test]
    fn malformed_id_keys_are_rejected() {
        assert!(TypeMap::from_bytes(br#"{"types": {"": "text"}}"#).is_err());
        assert!(TypeMap::from_bytes(br#"{"types": {"a\\zb": "text"}}"#).is_err());
    }
}
