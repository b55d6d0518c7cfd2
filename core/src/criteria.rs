//! Filter expression builder for the vendor's OData-like `q` parameter.
//!
//! # Design
//! A `SearchCriteria` is an ordered list of `(camelCaseKey, FieldValue)`
//! pairs. Translation maps every key to its UPPER_SNAKE_CASE column, turns
//! each value into one clause group and joins the groups with ` and `.
//! Insertion order is kept so the generated expression reads in the order
//! the caller wrote it.
//!
//! The default builders are permissive: empty lists, non-finite numbers and
//! other unusable inputs drop their clause (logged at `debug`) instead of
//! failing. The `try_*` variants run the same translation in strict mode and
//! report the first such input as a `QueryError`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::QueryError;

/// A single comparable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Text of the value without quoting. `None` for NaN and infinities.
    fn text(&self) -> Option<String> {
        match self {
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Int(n) => Some(n.to_string()),
            Scalar::UInt(n) => Some(n.to_string()),
            Scalar::Float(f) if f.is_finite() => Some(f.to_string()),
            Scalar::Float(_) => None,
            Scalar::Bool(b) => Some(b.to_string()),
        }
    }

    /// Filter literal: strings are single-quoted, everything else is bare.
    /// Embedded quotes are not escaped.
    fn literal(&self) -> Option<String> {
        match self {
            Scalar::Str(s) => Some(format!("'{s}'")),
            other => other.text(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(n) => Scalar::Int(n),
            Err(_) => Scalar::UInt(value),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Comparison operators accepted inside an operator object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    NotIn,
}

impl Operator {
    /// Key used for this operator in loosely-typed JSON criteria.
    pub fn key(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::In => "in",
            Operator::NotIn => "notIn",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let op = match key {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "like" => Operator::Like,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

/// Right-hand side of an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl Operand {
    fn items(&self) -> &[Scalar] {
        match self {
            Operand::One(s) => std::slice::from_ref(s),
            Operand::Many(items) => items,
        }
    }
}

/// Ordered operator object, e.g. `{ gte: 100, lte: 500 }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operators(Vec<(Operator, Operand)>);

impl Operators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: Operator, operand: Operand) -> Self {
        self.0.push((op, operand));
        self
    }

    pub fn eq(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Eq, Operand::One(value.into()))
    }

    pub fn ne(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Ne, Operand::One(value.into()))
    }

    pub fn gt(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Gt, Operand::One(value.into()))
    }

    pub fn gte(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Gte, Operand::One(value.into()))
    }

    pub fn lt(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Lt, Operand::One(value.into()))
    }

    pub fn lte(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Lte, Operand::One(value.into()))
    }

    /// `value` should already carry any `*` wildcard.
    pub fn like(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Like, Operand::One(value.into()))
    }

    pub fn in_list<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.with(Operator::In, Operand::Many(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.with(Operator::NotIn, Operand::Many(values.into_iter().map(Into::into).collect()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Operator, Operand)> {
        self.0.iter()
    }
}

/// A criterion value: a scalar, an implicit-OR list, or an operator object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Ops(Operators),
}

impl FieldValue {
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! scalar_field_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_field_value!(Scalar, &str, String, i64, i32, u32, u64, f64, bool);

impl From<Operators> for FieldValue {
    fn from(ops: Operators) -> Self {
        FieldValue::Ops(ops)
    }
}

/// Ordered mapping from camelCase field key to the wanted match condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    entries: Vec<(String, FieldValue)>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SearchCriteria::insert`].
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Re-inserting a key replaces its value but keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts a loosely-typed JSON object, e.g.
    /// `{"code": "ABC", "price": {"gte": 100}}`. Unknown operator keys,
    /// `null`s and nested objects are dropped.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        convert_json(object, Mode::Permissive).unwrap_or_default()
    }

    /// Strict form of [`SearchCriteria::from_json`].
    pub fn try_from_json(object: &Map<String, Value>) -> Result<Self, QueryError> {
        convert_json(object, Mode::Strict)
    }
}

impl<K, V> FromIterator<(K, V)> for SearchCriteria
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = SearchCriteria::new();
        for (k, v) in iter {
            criteria.insert(k, v);
        }
        criteria
    }
}

/// Maps a camelCase criteria key to the vendor's UPPER_SNAKE_CASE column.
///
/// `auxilCode` becomes `AUXIL_CODE`, `userID` becomes `USER_ID`, and keys
/// that are already column names come back unchanged.
pub fn column_name(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Translates criteria into a full filter expression.
///
/// Returns `None` when no clause survives, so callers send no `q` at all.
pub fn build_search_query(criteria: &SearchCriteria) -> Option<String> {
    translate(criteria, Mode::Permissive).ok().flatten()
}

/// Strict form of [`build_search_query`].
pub fn try_build_search_query(criteria: &SearchCriteria) -> Result<Option<String>, QueryError> {
    translate(criteria, Mode::Strict)
}

/// Normalizes one value against an already-mapped column name.
pub fn field_clause(column: &str, value: &FieldValue) -> Option<String> {
    normalize(column, value, Mode::Permissive).ok().flatten()
}

/// Joins pre-built clauses with ` and `, skipping blank ones.
pub fn and_all<I, S>(clauses: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = clauses
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

/// `COLUMN like 'prefix*'`.
pub fn like_prefix(column: &str, prefix: &str) -> String {
    format!("{column} like '{prefix}*'")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Permissive,
    Strict,
}

impl Mode {
    /// Strict mode surfaces the problem; permissive mode logs it and moves on.
    fn reject<T>(self, err: QueryError) -> Result<Option<T>, QueryError> {
        match self {
            Mode::Strict => Err(err),
            Mode::Permissive => {
                debug!(error = %err, "dropping filter clause");
                Ok(None)
            }
        }
    }
}

fn translate(criteria: &SearchCriteria, mode: Mode) -> Result<Option<String>, QueryError> {
    let mut clauses = Vec::with_capacity(criteria.len());
    for (key, value) in criteria.iter() {
        if let Some(clause) = normalize(&column_name(key), value, mode)? {
            clauses.push(clause);
        }
    }
    Ok(and_all(clauses))
}

fn normalize(column: &str, value: &FieldValue, mode: Mode) -> Result<Option<String>, QueryError> {
    match value {
        FieldValue::Scalar(s) => comparison(column, "eq", s, mode),
        FieldValue::List(items) => group(column, "eq", " or ", items, mode),
        FieldValue::Ops(ops) if ops.is_empty() => mode.reject(empty_operators(column)),
        FieldValue::Ops(ops) => {
            let mut parts = Vec::new();
            for (op, operand) in ops.iter() {
                if let Some(part) = operator_clause(column, *op, operand, mode)? {
                    parts.push(part);
                }
            }
            Ok(and_all(parts))
        }
    }
}

fn operator_clause(
    column: &str,
    op: Operator,
    operand: &Operand,
    mode: Mode,
) -> Result<Option<String>, QueryError> {
    match (op, operand) {
        (Operator::In, _) => group(column, "eq", " or ", operand.items(), mode),
        (Operator::NotIn, _) => group(column, "ne", " and ", operand.items(), mode),
        (_, Operand::Many(_)) => mode.reject(QueryError::ListOperand {
            field: column.to_string(),
            operator: op.key().to_string(),
        }),
        (Operator::Like, Operand::One(s)) => match s.text() {
            Some(text) => Ok(Some(format!("{column} like '{text}'"))),
            None => mode.reject(non_finite(column)),
        },
        (_, Operand::One(s)) => comparison(column, op.key(), s, mode),
    }
}

fn comparison(column: &str, op: &str, value: &Scalar, mode: Mode) -> Result<Option<String>, QueryError> {
    match value.literal() {
        Some(literal) => Ok(Some(format!("{column} {op} {literal}"))),
        None => mode.reject(non_finite(column)),
    }
}

/// `(COL op v1 <joiner> COL op v2 ...)`, always parenthesized.
fn group(
    column: &str,
    op: &str,
    joiner: &str,
    items: &[Scalar],
    mode: Mode,
) -> Result<Option<String>, QueryError> {
    if items.is_empty() {
        return mode.reject(QueryError::EmptyList {
            field: column.to_string(),
        });
    }
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        if let Some(part) = comparison(column, op, item, mode)? {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("({})", parts.join(joiner))))
}

fn non_finite(column: &str) -> QueryError {
    QueryError::NonFiniteNumber {
        field: column.to_string(),
    }
}

fn empty_operators(field: &str) -> QueryError {
    QueryError::EmptyOperators {
        field: field.to_string(),
    }
}

fn unsupported(field: &str) -> QueryError {
    QueryError::UnsupportedValue {
        field: field.to_string(),
    }
}

fn convert_json(object: &Map<String, Value>, mode: Mode) -> Result<SearchCriteria, QueryError> {
    let mut criteria = SearchCriteria::new();
    for (key, value) in object {
        if let Some(field_value) = field_value_from_json(key, value, mode)? {
            criteria.insert(key.as_str(), field_value);
        }
    }
    Ok(criteria)
}

fn field_value_from_json(key: &str, value: &Value, mode: Mode) -> Result<Option<FieldValue>, QueryError> {
    match value {
        Value::Array(items) => Ok(Some(FieldValue::List(scalars_from_json(key, items, mode)?))),
        Value::Object(ops) if ops.is_empty() => mode.reject(empty_operators(key)),
        Value::Object(ops) => {
            let mut operators = Operators::new();
            for (op_key, operand) in ops {
                let Some(op) = Operator::from_key(op_key) else {
                    mode.reject::<()>(QueryError::UnknownOperator {
                        field: key.to_string(),
                        operator: op_key.clone(),
                    })?;
                    continue;
                };
                let operand = match operand {
                    Value::Array(items) => Some(Operand::Many(scalars_from_json(key, items, mode)?)),
                    other => scalar_from_json(key, other, mode)?.map(Operand::One),
                };
                if let Some(operand) = operand {
                    operators = operators.with(op, operand);
                }
            }
            if operators.is_empty() {
                return Ok(None);
            }
            Ok(Some(FieldValue::Ops(operators)))
        }
        other => Ok(scalar_from_json(key, other, mode)?.map(FieldValue::Scalar)),
    }
}

fn scalars_from_json(key: &str, items: &[Value], mode: Mode) -> Result<Vec<Scalar>, QueryError> {
    let mut scalars = Vec::with_capacity(items.len());
    for item in items {
        if let Some(s) = scalar_from_json(key, item, mode)? {
            scalars.push(s);
        }
    }
    Ok(scalars)
}

fn scalar_from_json(key: &str, value: &Value, mode: Mode) -> Result<Option<Scalar>, QueryError> {
    let scalar = match value {
        Value::String(s) => Scalar::Str(s.clone()),
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Scalar::Int(i),
            (None, Some(u), _) => Scalar::UInt(u),
            (None, None, Some(f)) => Scalar::Float(f),
            (None, None, None) => return mode.reject(unsupported(key)),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => return mode.reject(unsupported(key)),
    };
    Ok(Some(scalar))
}
