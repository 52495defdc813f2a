//! `singlestore-data-api` runs compiled SQL against the SingleStore Data API,
//! the stateless HTTP endpoint SingleStore exposes instead of its wire protocol.
//!
//! The crate plugs into a query builder through the [`Dialect`], [`Driver`],
//! [`DatabaseConnection`] and [`DialectAdapter`] traits:
//! - result-set statements go to `/api/v2/query/tuples`, mutations to
//!   `/api/v2/exec` (see [`classify`])
//! - rows are coerced per column type by [`ResultDeserializer`], either inline
//!   or later through [`DeserializerPlugin`]
//! - transactions, streaming, migration locks and multi-statement SQL are
//!   rejected with typed errors

mod adapter;
pub mod classify;
mod codec;
mod config;
mod connection;
pub mod data_type;
mod deserialize;
mod dialect;
mod driver;
mod error;
mod metadata_store;
mod options;
mod plugin;
mod statement;
mod transport;
mod types;
mod value;
mod wire;

pub use adapter::{DataApiAdapter, DialectAdapter};
pub use classify::Route;
pub use codec::{basic_authorization, DataApiCodec};
pub use config::{ConnectionSettings, DataApiConfig, Scheme};
pub use connection::{DataApiConnection, DatabaseConnection};
pub use data_type::{DataType, DeclaredType};
pub use deserialize::{CustomDeserializer, DeserializationConfig, ResultDeserializer};
pub use dialect::{DataApiDialect, Dialect, SqlSyntax};
pub use driver::{DataApiDriver, Driver};
pub use error::{DataApiError, TransportError};
pub use metadata_store::ColumnMetadataStore;
pub use options::ClientOptions;
pub use plugin::{DeserializerPlugin, ResultPlugin};
pub use statement::{CompiledStatement, Params, QueryKind};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{ColumnMetadata, QueryResult, Row};
pub use value::Value;

pub type Result<T> = std::result::Result<T, DataApiError>;
