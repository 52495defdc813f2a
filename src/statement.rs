use crate::Value;

/// Ordered positional parameters mapped to `?` placeholders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(pub Vec<Value>);

impl Params {
    pub fn positional(values: impl Into<Vec<Value>>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[Value; N]> for Params {
    fn from(values: [Value; N]) -> Self {
        Self(values.into())
    }
}

/// Root node kind of a compiled statement, as reported by the query builder.
///
/// `Raw` means the statement was written as SQL text and its kind has to be
/// inferred lexically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    /// A standalone `explain` statement. An explain modifier on a mutation
    /// keeps the mutation's kind.
    Explain,
    Ddl,
    Raw,
}

/// SQL text, parameters and root node kind produced by the query compiler.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStatement {
    pub kind: QueryKind,
    pub sql: String,
    pub params: Params,
}

impl CompiledStatement {
    pub fn new<P: Into<Params>>(kind: QueryKind, sql: impl Into<String>, params: P) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: params.into(),
        }
    }

    /// Creates a statement from hand-written SQL.
    pub fn raw<P: Into<Params>>(sql: impl Into<String>, params: P) -> Self {
        Self::new(QueryKind::Raw, sql, params)
    }

    pub fn select<P: Into<Params>>(sql: impl Into<String>, params: P) -> Self {
        Self::new(QueryKind::Select, sql, params)
    }
}
