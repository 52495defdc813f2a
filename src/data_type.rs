use std::fmt;

/// Column data types reported by the Data API in `columns[].dataType`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Boolean,
    Bit,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    Integer,
    BigInt,
    Float,
    Double,
    Real,
    Decimal,
    Dec,
    Fixed,
    Numeric,
    Date,
    Time,
    DateTime,
    Timestamp,
    Year,
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Json,
    Geography,
    GeographyPoint,
    Enum,
    Set,
    Vector,
    Bson,
    /// Any type name not listed above, lowercased.
    Other(String),
}

const NAMES: &[(&str, DataType)] = &[
    ("bool", DataType::Bool),
    ("boolean", DataType::Boolean),
    ("bit", DataType::Bit),
    ("tinyint", DataType::TinyInt),
    ("smallint", DataType::SmallInt),
    ("mediumint", DataType::MediumInt),
    ("int", DataType::Int),
    ("integer", DataType::Integer),
    ("bigint", DataType::BigInt),
    ("float", DataType::Float),
    ("double", DataType::Double),
    ("real", DataType::Real),
    ("decimal", DataType::Decimal),
    ("dec", DataType::Dec),
    ("fixed", DataType::Fixed),
    ("numeric", DataType::Numeric),
    ("date", DataType::Date),
    ("time", DataType::Time),
    ("datetime", DataType::DateTime),
    ("timestamp", DataType::Timestamp),
    ("year", DataType::Year),
    ("char", DataType::Char),
    ("varchar", DataType::VarChar),
    ("tinytext", DataType::TinyText),
    ("text", DataType::Text),
    ("mediumtext", DataType::MediumText),
    ("longtext", DataType::LongText),
    ("binary", DataType::Binary),
    ("varbinary", DataType::VarBinary),
    ("tinyblob", DataType::TinyBlob),
    ("blob", DataType::Blob),
    ("mediumblob", DataType::MediumBlob),
    ("longblob", DataType::LongBlob),
    ("json", DataType::Json),
    ("geography", DataType::Geography),
    ("geographypoint", DataType::GeographyPoint),
    ("enum", DataType::Enum),
    ("set", DataType::Set),
    ("vector", DataType::Vector),
    ("bson", DataType::Bson),
];

impl DataType {
    /// Resolves a bare (imprecise) type name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, data_type)| data_type.clone())
            .unwrap_or_else(|| Self::Other(name.to_ascii_lowercase()))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Other(name) => name,
            known => NAMES
                .iter()
                .find(|(_, data_type)| data_type == known)
                .map_or("", |(name, _)| name),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared column type split into its imprecise name and optional
/// precision/scale suffix, e.g. `decimal(10,2)` → `decimal`, `Some(10)`, `Some(2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredType {
    pub data_type: DataType,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl DeclaredType {
    pub fn parse(declared: &str) -> Self {
        let declared = declared.trim();
        let (name, suffix) = match declared.split_once('(') {
            Some((name, rest)) => (name.trim(), rest.split_once(')').map(|(args, _)| args)),
            None => (
                declared.split_whitespace().next().unwrap_or(declared),
                None,
            ),
        };

        let mut args = suffix
            .into_iter()
            .flat_map(|args| args.split(','))
            .map(|arg| arg.trim().parse::<u32>().ok());

        Self {
            data_type: DataType::from_name(name),
            precision: args.next().flatten(),
            scale: args.next().flatten(),
        }
    }
}
