//! Canonical identity of a computation request.
//!
//! A `Fingerprint` is (unit kind, canonical parameters, task name). Two
//! requests with equal fingerprints ask for the identical computation, so the
//! execution cache may hand both the same result.
//!
//! Canonicalization rules:
//! - parameters are keyed by name in sorted order, insertion order is irrelevant;
//! - absent parameters are dropped, so "missing" and "explicitly `None`" coincide;
//! - floats compare by IEEE-754 bit pattern with no tolerance (`0.0 != -0.0`),
//!   and every NaN collapses to a single canonical pattern;
//! - `ParamValue::Set` is sorted and de-duplicated, `ParamValue::List` keeps order;
//! - a missing or blank task name becomes [`DEFAULT_TASK`].

use std::collections::BTreeMap;
use std::fmt;

use crate::hash::{hash_bytes, Hash256};

/// Task name used when a request does not target a specific task.
pub const DEFAULT_TASK: &str = "default";

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    /// IEEE-754 bit pattern.
    Float(u64),
    Str(String),
    /// Order-significant sequence.
    List(Vec<ParamValue>),
    /// Unordered collection, kept sorted and de-duplicated.
    Set(Vec<ParamValue>),
}

impl ParamValue {
    pub fn float(v: f64) -> Self {
        if v.is_nan() {
            ParamValue::Float(CANONICAL_NAN)
        } else {
            ParamValue::Float(v.to_bits())
        }
    }

    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        let mut values: Vec<ParamValue> = items.into_iter().map(Into::into).collect();
        values.sort();
        values.dedup();
        ParamValue::Set(values)
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            ParamValue::Bool(b) => {
                out.push(b'b');
                out.push(u8::from(*b));
            }
            ParamValue::Int(i) => {
                out.push(b'i');
                out.extend_from_slice(&i.to_le_bytes());
            }
            ParamValue::Float(bits) => {
                out.push(b'f');
                out.extend_from_slice(&bits.to_le_bytes());
            }
            ParamValue::Str(s) => {
                out.push(b's');
                encode_str(s, out);
            }
            ParamValue::List(items) | ParamValue::Set(items) => {
                out.push(if matches!(self, ParamValue::List(_)) { b'l' } else { b'S' });
                out.extend_from_slice(&(items.len() as u64).to_le_bytes());
                for item in items {
                    item.encode(out);
                }
            }
        }
    }
}

fn encode_str(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue::Str(v.clone())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            ParamValue::Str(s) => write!(f, "{s:?}"),
            ParamValue::List(items) | ParamValue::Set(items) => {
                let (open, close) = match self {
                    ParamValue::List(_) => ('[', ']'),
                    _ => ('{', '}'),
                };
                write!(f, "{open}")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

/// Canonical parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::insert`].
    pub fn with(mut self, name: &str, value: impl Into<Option<ParamValue>>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`; `None` removes it, so absence has a single representation.
    pub fn insert(&mut self, name: &str, value: impl Into<Option<ParamValue>>) {
        match value.into() {
            Some(v) => {
                self.0.insert(name.to_string(), v);
            }
            None => {
                self.0.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: String,
    params: Params,
    task: String,
    digest: Hash256,
}

/// Build the canonical fingerprint for a request. Total and deterministic.
pub fn fingerprint(kind: &str, params: Params, task: Option<&str>) -> Fingerprint {
    let task = match task.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_TASK.to_string(),
    };

    let mut buf = Vec::with_capacity(64);
    encode_str(kind, &mut buf);
    encode_str(&task, &mut buf);
    buf.extend_from_slice(&(params.len() as u64).to_le_bytes());
    for (name, value) in params.iter() {
        encode_str(name, &mut buf);
        value.encode(&mut buf);
    }

    Fingerprint {
        kind: kind.to_string(),
        params,
        task,
        digest: hash_bytes(&buf),
    }
}

impl Fingerprint {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// Content digest of the canonical encoding; root of artifact identities.
    pub fn digest(&self) -> &Hash256 {
        &self.digest
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}{}", self.kind, self.task, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_does_not_matter() {
        let a = Params::new()
            .with("top_error", ParamValue::float(0.05))
            .with("columns", ParamValue::set(["age", "income"]));
        let b = Params::new()
            .with("columns", ParamValue::set(["income", "age", "age"]))
            .with("top_error", ParamValue::float(0.05));

        let fa = fingerprint("error_bias", a, None);
        let fb = fingerprint("error_bias", b, Some("default"));
        assert_eq!(fa, fb);
        assert_eq!(fa.digest(), fb.digest());
    }

    #[test]
    fn float_noise_changes_identity() {
        let x = 0.1_f64;
        let next = f64::from_bits(x.to_bits() + 1);
        let a = fingerprint("u", Params::new().with("q", ParamValue::float(x)), None);
        let b = fingerprint("u", Params::new().with("q", ParamValue::float(next)), None);
        assert_ne!(a, b);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn signed_zero_is_distinct_but_nan_is_canonical() {
        let pos = fingerprint("u", Params::new().with("q", ParamValue::float(0.0)), None);
        let neg = fingerprint("u", Params::new().with("q", ParamValue::float(-0.0)), None);
        assert_ne!(pos, neg);

        let nan_a = ParamValue::float(f64::NAN);
        let nan_b = ParamValue::float(f64::from_bits(0x7ff8_0000_0000_0001));
        assert_eq!(nan_a, nan_b);
    }

    #[test]
    fn absent_parameter_equals_missing_parameter() {
        let explicit = Params::new()
            .with("bins", ParamValue::from(10usize))
            .with("columns", None::<ParamValue>);
        let missing = Params::new().with("bins", ParamValue::from(10usize));
        assert_eq!(
            fingerprint("u", explicit, None),
            fingerprint("u", missing, None)
        );
    }

    #[test]
    fn list_order_is_significant() {
        let a = fingerprint("u", Params::new().with("c", ParamValue::list(["a", "b"])), None);
        let b = fingerprint("u", Params::new().with("c", ParamValue::list(["b", "a"])), None);
        assert_ne!(a, b);
    }

    #[test]
    fn kind_and_task_participate() {
        let p = Params::new().with("bins", ParamValue::from(5usize));
        let base = fingerprint("hist", p.clone(), Some("price"));
        assert_ne!(base, fingerprint("other", p.clone(), Some("price")));
        assert_ne!(base, fingerprint("hist", p.clone(), Some("volume")));
        assert_eq!(fingerprint("hist", p.clone(), Some("  ")).task(), DEFAULT_TASK);
    }

    #[test]
    fn display_names_kind_task_and_params() {
        let fp = fingerprint(
            "error_bias",
            Params::new()
                .with("columns", ParamValue::set(["age"]))
                .with("top_error", ParamValue::float(0.05)),
            None,
        );
        assert_eq!(
            fp.to_string(),
            r#"error_bias@default{columns={"age"}, top_error=0.05}"#
        );
    }
}
