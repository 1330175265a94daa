//! # Meta predicate trees
//!
//! Query producers express filters in the key/value idiom: a [`MetaQuery`] is
//! a boolean composition of [`MetaClause`] leaves, each comparing the value
//! stored under one meta key. The upstream builder has already compiled the
//! tree into WHERE text by the time the rewriters run; the tree is only used
//! to decide which of those fragments can be pointed at order table columns.
//!
//! A leaf may also carry one of the composite customer aliases
//! (`customer_emails`, `customer_ids`), which always target a fixed column.

pub mod normalizer;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use normalizer::MetaPredicateNormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relation {
    #[default]
    And,
    Or,
}

/// Comparison operator of a meta clause.
///
/// Deserialized through [`FromStr`], so `like` and `<>` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CompareOp {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "NOT BETWEEN")]
    NotBetween,
    #[serde(rename = "EXISTS")]
    Exists,
    #[serde(rename = "NOT EXISTS")]
    NotExists,
    #[serde(rename = "REGEXP")]
    Regexp,
    #[serde(rename = "NOT REGEXP")]
    NotRegexp,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
            CompareOp::Between => "BETWEEN",
            CompareOp::NotBetween => "NOT BETWEEN",
            CompareOp::Exists => "EXISTS",
            CompareOp::NotExists => "NOT EXISTS",
            CompareOp::Regexp => "REGEXP",
            CompareOp::NotRegexp => "NOT REGEXP",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown meta comparison operator `{0}`")]
pub struct UnknownCompareOp(pub String);

impl FromStr for CompareOp {
    type Err = UnknownCompareOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Collapse runs of whitespace so "NOT   LIKE" parses
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let op = match normalized.as_str() {
            "=" => CompareOp::Eq,
            "!=" | "<>" => CompareOp::NotEq,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::GtEq,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::LtEq,
            "LIKE" => CompareOp::Like,
            "NOT LIKE" => CompareOp::NotLike,
            "IN" => CompareOp::In,
            "NOT IN" => CompareOp::NotIn,
            "BETWEEN" => CompareOp::Between,
            "NOT BETWEEN" => CompareOp::NotBetween,
            "EXISTS" => CompareOp::Exists,
            "NOT EXISTS" => CompareOp::NotExists,
            "REGEXP" | "RLIKE" => CompareOp::Regexp,
            "NOT REGEXP" | "NOT RLIKE" => CompareOp::NotRegexp,
            _ => return Err(UnknownCompareOp(s.to_string())),
        };
        Ok(op)
    }
}

impl TryFrom<String> for CompareOp {
    type Error = UnknownCompareOp;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Cast applied to `meta_value` before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    #[default]
    Char,
    Numeric,
    Binary,
    Date,
    Datetime,
    Decimal,
    Signed,
    Unsigned,
    Time,
}

/// Comparison value of a clause. Scalars of any kind are kept as their text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    #[default]
    None,
    Single(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MetaValueVisitor)
    }
}

struct MetaValueVisitor;

impl<'de> Visitor<'de> for MetaValueVisitor {
    type Value = MetaValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, a list of scalars or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MetaValue::None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MetaValue::None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MetaValue::Single(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(ScalarText(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(MetaValue::List(items))
    }
}

/// One list element of a [`MetaValue`], as text.
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_any(MetaValueVisitor)? {
            MetaValue::Single(text) => Ok(ScalarText(text)),
            MetaValue::None => Err(de::Error::custom("null is not allowed inside a value list")),
            MetaValue::List(_) => Err(de::Error::custom("nested value lists are not allowed")),
        }
    }
}

/// One leaf of a meta query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaClause {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub compare: CompareOp,
    #[serde(default)]
    pub value: MetaValue,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    /// "Any of the customer's emails" alias; targets `billing_email`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_emails: Option<Box<MetaClause>>,
    /// "Any of the customer's ids" alias; targets `customer_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<Box<MetaClause>>,
}

impl MetaClause {
    pub fn new(key: impl Into<String>, compare: CompareOp, value: MetaValue) -> Self {
        Self {
            key: Some(key.into()),
            compare,
            value,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn customer_emails(alias: MetaClause) -> Self {
        Self {
            customer_emails: Some(Box::new(alias)),
            ..Default::default()
        }
    }

    pub fn customer_ids(alias: MetaClause) -> Self {
        Self {
            customer_ids: Some(Box::new(alias)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaQueryNode {
    Group(MetaQuery),
    Clause(MetaClause),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaQuery {
    #[serde(default)]
    pub relation: Relation,
    /// Required when deserializing; its presence is what tells a group from a clause
    pub clauses: Vec<MetaQueryNode>,
}

impl MetaQuery {
    pub fn new(relation: Relation, clauses: Vec<MetaQueryNode>) -> Self {
        Self { relation, clauses }
    }

    pub fn and(clauses: Vec<MetaQueryNode>) -> Self {
        Self::new(Relation::And, clauses)
    }

    pub fn or(clauses: Vec<MetaQueryNode>) -> Self {
        Self::new(Relation::Or, clauses)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Unwrap one level of needless grouping at the root.
    ///
    /// `{AND: [{AND: [A, B]}]}` becomes `{AND: [A, B]}`. Any other shape,
    /// including a query with two or more top-level entries, is returned as is.
    /// Groups below the root are left alone; the normalizer walks them.
    pub fn flattened(&self) -> MetaQuery {
        match self.clauses.as_slice() {
            [MetaQueryNode::Group(inner)] => inner.clone(),
            _ => self.clone(),
        }
    }
}

impl From<MetaClause> for MetaQueryNode {
    fn from(clause: MetaClause) -> Self {
        MetaQueryNode::Clause(clause)
    }
}

impl From<MetaQuery> for MetaQueryNode {
    fn from(query: MetaQuery) -> Self {
        MetaQueryNode::Group(query)
    }
}

/// A clause that has been pointed at an order table column.
///
/// `original_key` keeps the meta key the upstream builder compiled into the
/// WHERE text; the rewriter searches for that literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaPredicate {
    /// Column on the order table
    pub key: String,
    pub original_key: String,
    pub compare: CompareOp,
    pub value: MetaValue,
    pub value_type: ValueType,
}
