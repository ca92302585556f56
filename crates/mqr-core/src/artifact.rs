//! Render artifacts (widgets) attached to results.
//!
//! An artifact's identity derives from the fingerprint that produced it, never
//! from its content, so two logically distinct widgets that happen to look the
//! same are never merged, and one widget shared by several results is emitted once.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::{derive, Hash256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(pub Hash256);

impl ArtifactId {
    /// Identity of the `label`-th artifact owned by the computation with `digest`.
    pub fn derive(digest: &Hash256, label: &str) -> Self {
        ArtifactId(derive(digest, label))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.short())
    }
}

impl Serialize for ArtifactId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(d)?;
        parse_hex(&hex)
            .map(|bytes| ArtifactId(Hash256(bytes)))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid artifact id '{hex}'")))
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 32]> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Counter,
    Table,
    Histogram,
    Scatter,
}

/// Artifact content before it is bound to an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDraft {
    pub title: String,
    pub kind: ArtifactKind,
    pub payload: serde_json::Value,
}

impl ArtifactDraft {
    pub fn new(title: impl Into<String>, kind: ArtifactKind, payload: serde_json::Value) -> Self {
        Self {
            title: title.into(),
            kind,
            payload,
        }
    }

    pub fn seal(self, id: ArtifactId) -> RenderArtifact {
        RenderArtifact {
            id,
            title: self.title,
            kind: self.kind,
            payload: self.payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderArtifact {
    pub id: ArtifactId,
    pub title: String,
    pub kind: ArtifactKind,
    pub payload: serde_json::Value,
}
