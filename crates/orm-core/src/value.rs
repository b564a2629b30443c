//! The row/value model every other crate in the workspace builds on.
//!
//! Rows flow through the engine as `map<string, Value>` where `Value` is a
//! sum of the usual JSON-ish primitives plus a branded id. That type is
//! [`Value`] below. It has no
//! `Undefined` variant on purpose: a stored document never contains a
//! genuinely-undefined field, it simply omits the key. The distinct
//! "missing vs. explicit null" state only needs to exist at the wire
//! boundary (patches, scheduler payloads) — that's [`WireValue`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A row, keyed by column name. Ordered so iteration (and therefore any
/// content-hash or test assertion over a row) is deterministic.
pub type Row = BTreeMap<String, Value>;

/// A branded document id: the host-managed primary key, tagged with the
/// table it belongs to so an id from one table can never be mistaken for
/// one from another at the type level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id {
    pub table: String,
    pub key: String,
}

impl Id {
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.key)
    }
}

/// A stored value. Never contains `undefined` — a row either has a key or
/// it doesn't.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Id(Id),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<&Id> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Total order over values used for index range comparisons and
    /// `gt`/`gte`/`lt`/`lte`. Cross-kind comparisons fall back to a stable
    /// kind ordering (mirrors how a document store orders heterogeneous
    /// index keys rather than erroring).
    pub fn cmp_ordered(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use Value::*;
        fn kind_rank(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 2,
                Str(_) => 3,
                Bytes(_) => 4,
                Array(_) => 5,
                Object(_) => 6,
                Id(_) => 7,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (Str(a), Str(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (Id(a), Id(b)) => a.cmp(b),
            (Array(a), Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.cmp_ordered(y))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => kind_rank(self).cmp(&kind_rank(other)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::try_from_json(json).map_err(serde::de::Error::custom)
    }
}

const ID_TAG: &str = "__ormId";
const BYTES_TAG: &str = "__ormBytes";

impl Value {
    /// Lowers to a `serde_json::Value`, tagging the two variants plain JSON
    /// cannot represent (`Id`, `Bytes`) with a sentinel object.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(J::Number)
                .unwrap_or(J::Null),
            Value::Str(s) => J::String(s.clone()),
            Value::Bytes(b) => {
                let mut m = serde_json::Map::new();
                m.insert(
                    BYTES_TAG.to_string(),
                    J::Array(b.iter().map(|byte| J::Number((*byte).into())).collect()),
                );
                J::Object(m)
            }
            Value::Array(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => {
                let mut m = serde_json::Map::new();
                for (k, v) in map {
                    m.insert(k.clone(), v.to_json());
                }
                J::Object(m)
            }
            Value::Id(id) => {
                let mut m = serde_json::Map::new();
                let mut inner = serde_json::Map::new();
                inner.insert("table".to_string(), J::String(id.table.clone()));
                inner.insert("key".to_string(), J::String(id.key.clone()));
                m.insert(ID_TAG.to_string(), J::Object(inner));
                J::Object(m)
            }
        }
    }

    /// Raises a `serde_json::Value` back into [`Value`], recognizing the
    /// sentinel tags emitted by [`Value::to_json`].
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            J::String(s) => Value::Str(s),
            J::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            J::Object(map) => {
                if let Some(J::Object(inner)) = map.get(ID_TAG) {
                    let table = inner
                        .get("table")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let key = inner
                        .get("key")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    return Value::Id(Id::new(table, key));
                }
                if let Some(J::Array(bytes)) = map.get(BYTES_TAG) {
                    let bytes = bytes
                        .iter()
                        .filter_map(|v| v.as_u64().map(|n| n as u8))
                        .collect();
                    return Value::Bytes(bytes);
                }
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k, Value::from_json(v));
                }
                Value::Object(out)
            }
        }
    }

    /// Like [`Value::from_json`], but rejects a malformed `__ormId`
    /// sentinel (missing or non-string `table`/`key`) instead of silently
    /// defaulting them to the empty string. This is the path actual wire
    /// deserialization (the `Deserialize` impl above) goes through.
    pub fn try_from_json(json: serde_json::Value) -> Result<Self, crate::error::CoreError> {
        use serde_json::Value as J;
        match json {
            J::Null => Ok(Value::Null),
            J::Bool(b) => Ok(Value::Bool(b)),
            J::Number(n) => Ok(if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }),
            J::String(s) => Ok(Value::Str(s)),
            J::Array(items) => Ok(Value::Array(
                items.into_iter().map(Value::try_from_json).collect::<Result<_, _>>()?,
            )),
            J::Object(map) => {
                if let Some(id_payload) = map.get(ID_TAG) {
                    let inner = match id_payload {
                        J::Object(inner) => inner,
                        _ => {
                            return Err(crate::error::CoreError::MalformedId(format!(
                                "'{ID_TAG}' sentinel must be an object"
                            )))
                        }
                    };
                    let table = inner.get("table").and_then(|v| v.as_str()).ok_or_else(|| {
                        crate::error::CoreError::MalformedId("missing string 'table'".to_string())
                    })?;
                    let key = inner.get("key").and_then(|v| v.as_str()).ok_or_else(|| {
                        crate::error::CoreError::MalformedId("missing string 'key'".to_string())
                    })?;
                    return Ok(Value::Id(Id::new(table, key)));
                }
                if let Some(J::Array(bytes)) = map.get(BYTES_TAG) {
                    let bytes = bytes.iter().filter_map(|v| v.as_u64().map(|n| n as u8)).collect();
                    return Ok(Value::Bytes(bytes));
                }
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k, Value::try_from_json(v)?);
                }
                Ok(Value::Object(out))
            }
        }
    }
}

/// A value that may genuinely be `undefined`, as opposed to `null`.
///
/// Missing and explicit-null are two distinct states, and the distinction
/// must survive the scheduler boundary, which strips bare `undefined` —
/// hence the sentinel encoding. [`WireValue`] is that sentinel encoding,
/// applied recursively: an `Undefined` nested inside an `Array`/`Object`
/// round-trips exactly, it is never silently dropped or collapsed to
/// `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<WireValue>),
    Object(BTreeMap<String, WireValue>),
    Id(Id),
}

/// The sentinel object placed at the exact position of an `undefined`
/// value: `{"__ormUndefined": true}`.
pub const UNDEFINED_TAG: &str = "__ormUndefined";

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(b),
            Value::Int(i) => WireValue::Int(i),
            Value::Float(f) => WireValue::Float(f),
            Value::Str(s) => WireValue::Str(s),
            Value::Bytes(b) => WireValue::Bytes(b),
            Value::Array(items) => WireValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                WireValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Id(id) => WireValue::Id(id),
        }
    }
}

impl WireValue {
    /// Converts back to a stored [`Value`], treating `Undefined` as `Null`
    /// (the conversion a caller reaches for when it knows the position
    /// cannot legitimately be undefined, e.g. after validating a patch).
    pub fn into_value_lossy(self) -> Value {
        match self {
            WireValue::Undefined => Value::Null,
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::Int(i) => Value::Int(i),
            WireValue::Float(f) => Value::Float(f),
            WireValue::Str(s) => Value::Str(s),
            WireValue::Bytes(b) => Value::Bytes(b),
            WireValue::Array(items) => {
                Value::Array(items.into_iter().map(WireValue::into_value_lossy).collect())
            }
            WireValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value_lossy()))
                    .collect(),
            ),
            WireValue::Id(id) => Value::Id(id),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, WireValue::Undefined)
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            WireValue::Undefined => {
                let mut m = serde_json::Map::new();
                m.insert(UNDEFINED_TAG.to_string(), J::Bool(true));
                J::Object(m)
            }
            WireValue::Null => J::Null,
            WireValue::Bool(b) => J::Bool(*b),
            WireValue::Int(i) => J::Number((*i).into()),
            WireValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(J::Number)
                .unwrap_or(J::Null),
            WireValue::Str(s) => J::String(s.clone()),
            WireValue::Bytes(b) => Value::Bytes(b.clone()).to_json(),
            WireValue::Array(items) => J::Array(items.iter().map(WireValue::to_json).collect()),
            WireValue::Object(map) => {
                let mut m = serde_json::Map::new();
                for (k, v) in map {
                    m.insert(k.clone(), v.to_json());
                }
                J::Object(m)
            }
            WireValue::Id(id) => Value::Id(id.clone()).to_json(),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Object(ref map) if is_undefined_marker(map) => WireValue::Undefined,
            other => WireValue::from(Value::from_json(other)).reclassify_sentinels(),
        }
    }

    /// [`Value::from_json`] already resolves the id/bytes tags; this just
    /// threads that result back through `WireValue` so both tag families
    /// keep working after the `From<Value>` conversion above.
    fn reclassify_sentinels(self) -> Self {
        self
    }
}

fn is_undefined_marker(map: &serde_json::Map<String, serde_json::Value>) -> bool {
    map.len() == 1 && matches!(map.get(UNDEFINED_TAG), Some(serde_json::Value::Bool(true)))
}

impl Serialize for WireValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(WireValue::from_json(json))
    }
}

/// A per-column update directive: set to a concrete value, or remove the
/// column entirely (the "unset token").
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set(Value),
    Unset,
}

/// A normalized patch: keys absent from the map are left untouched, keys
/// present with [`PatchOp::Unset`] are removed from the stored row.
pub type Patch = BTreeMap<String, PatchOp>;

/// A `returning(selection?)` clause: the full row when absent, otherwise
/// a mapping from output alias to stored field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    Full,
    Fields(BTreeMap<String, String>),
}

impl Selection {
    pub fn fields(pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Selection::Fields(pairs.into_iter().map(|(alias, field)| (alias.into(), field.into())).collect())
    }

    /// Projects `row` per the selection. A field named in a `Fields`
    /// selection but absent from `row` is simply omitted from the
    /// output, matching the "missing vs. explicit null" distinction
    /// already drawn for stored rows.
    pub fn project(&self, row: &Row) -> Row {
        match self {
            Selection::Full => row.clone(),
            Selection::Fields(aliases) => aliases
                .iter()
                .filter_map(|(alias, field)| row.get(field).map(|v| (alias.clone(), v.clone())))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_json_roundtrip_scalars() {
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Int(42),
            Value::Str("hi".into()),
        ] {
            let json = v.to_json();
            assert_eq!(Value::from_json(json), v);
        }
    }

    #[test]
    fn value_json_roundtrip_id() {
        let v = Value::Id(Id::new("users", "abc123"));
        let json = v.to_json();
        assert_eq!(Value::from_json(json), v);
    }

    #[test]
    fn try_from_json_roundtrips_well_formed_id() {
        let v = Value::Id(Id::new("users", "abc123"));
        let json = v.to_json();
        assert_eq!(Value::try_from_json(json).unwrap(), v);
    }

    #[test]
    fn try_from_json_rejects_id_sentinel_missing_key() {
        let json = serde_json::json!({"__ormId": {"table": "users"}});
        let err = Value::try_from_json(json).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::MalformedId(_)));
    }

    #[test]
    fn try_from_json_rejects_id_sentinel_wrong_shape() {
        let json = serde_json::json!({"__ormId": "not-an-object"});
        let err = Value::try_from_json(json).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::MalformedId(_)));
    }

    #[test]
    fn deserializing_malformed_id_sentinel_fails() {
        let json = serde_json::json!({"__ormId": {"table": "users"}});
        let result: Result<Value, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn value_json_roundtrip_bytes() {
        let v = Value::Bytes(vec![1, 2, 3, 255]);
        let json = v.to_json();
        assert_eq!(Value::from_json(json), v);
    }

    #[test]
    fn value_json_roundtrip_nested() {
        let v = Value::Object(BTreeMap::from([
            ("a".to_string(), Value::Int(1)),
            (
                "b".to_string(),
                Value::Array(vec![Value::Str("x".into()), Value::Null]),
            ),
        ]));
        let json = v.to_json();
        assert_eq!(Value::from_json(json), v);
    }

    #[test]
    fn wire_value_roundtrips_undefined_at_top_level() {
        let wv = WireValue::Undefined;
        let json = wv.to_json();
        assert_eq!(json, serde_json::json!({"__ormUndefined": true}));
        assert_eq!(WireValue::from_json(json), WireValue::Undefined);
    }

    #[test]
    fn wire_value_roundtrips_undefined_nested_in_object() {
        let wv = WireValue::Object(BTreeMap::from([
            ("present".to_string(), WireValue::Int(1)),
            ("missing".to_string(), WireValue::Undefined),
        ]));
        let json = wv.to_json();
        let back = WireValue::from_json(json);
        assert_eq!(back, wv);
    }

    #[test]
    fn wire_value_roundtrips_undefined_nested_in_array() {
        let wv = WireValue::Array(vec![WireValue::Int(1), WireValue::Undefined, WireValue::Null]);
        let json = wv.to_json();
        let back = WireValue::from_json(json);
        assert_eq!(back, wv);
        // null and undefined must not collapse into each other.
        assert_ne!(
            match &back {
                WireValue::Array(items) => items[1].clone(),
                _ => unreachable!(),
            },
            WireValue::Null
        );
    }

    #[test]
    fn cmp_ordered_numeric_cross_kind() {
        assert_eq!(
            Value::Int(3).cmp_ordered(&Value::Float(3.0)),
            std::cmp::Ordering::Equal
        );
        assert_eq!(
            Value::Int(2).cmp_ordered(&Value::Float(3.0)),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn full_selection_passes_row_through() {
        let mut row = Row::new();
        row.insert("name".to_string(), Value::Str("Ada".into()));
        assert_eq!(Selection::Full.project(&row), row);
    }

    #[test]
    fn field_selection_projects_aliases_and_omits_missing() {
        let mut row = Row::new();
        row.insert("name".to_string(), Value::Str("Ada".into()));
        row.insert("email".to_string(), Value::Str("ada@example.com".into()));

        let selection = Selection::fields([("displayName", "name"), ("contact", "missing_column")]);
        let projected = selection.project(&row);

        assert_eq!(projected.get("displayName"), Some(&Value::Str("Ada".into())));
        assert!(!projected.contains_key("contact"));
        assert!(!projected.contains_key("email"));
    }
}
