use crate::{
    ColumnMetadataStore, DataApiAdapter, DataApiConfig, DataApiDriver, DeserializationConfig,
    DeserializerPlugin, DialectAdapter, Driver,
};

/// SQL surface a dialect speaks. The host query builder pairs it with the
/// matching query compiler and schema introspector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlSyntax {
    Mysql,
}

/// Entry point a query builder uses to obtain the pieces of a dialect.
pub trait Dialect: Send + Sync {
    fn create_adapter(&self) -> Box<dyn DialectAdapter>;

    fn create_driver(&self) -> Box<dyn Driver>;

    fn syntax(&self) -> SqlSyntax;
}

/// Dialect for the SingleStore Data API.
///
/// SingleStore speaks the MySQL SQL surface, so compilation and schema
/// introspection are delegated to the MySQL implementations.
///
/// # Example
///
/// ```no_run
/// use singlestore_data_api::{
///     CompiledStatement, DataApiConfig, DataApiDialect, DatabaseConnection, Driver,
/// };
///
/// # async fn run() -> singlestore_data_api::Result<()> {
/// let dialect = DataApiDialect::new(DataApiConfig::from_env()?);
/// let driver = dialect.driver();
/// let connection = driver.acquire_connection().await?;
/// let result = connection
///     .execute_query(&CompiledStatement::raw("select 1 as `one`", ()))
///     .await?;
/// println!("{:?}", result.rows());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DataApiDialect {
    config: DataApiConfig,
    metadata: ColumnMetadataStore,
}

impl DataApiDialect {
    pub fn new(config: DataApiConfig) -> Self {
        Self {
            config,
            metadata: ColumnMetadataStore::new(),
        }
    }

    pub fn config(&self) -> &DataApiConfig {
        &self.config
    }

    /// Store shared by every driver this dialect creates.
    pub fn metadata_store(&self) -> &ColumnMetadataStore {
        &self.metadata
    }

    /// Typed variant of [`Dialect::create_driver`].
    pub fn driver(&self) -> DataApiDriver {
        DataApiDriver::new(&self.config, self.metadata.clone())
    }

    /// Creates a [`DeserializerPlugin`] fed by this dialect's drivers.
    pub fn deserializer_plugin(&self, config: DeserializationConfig) -> DeserializerPlugin {
        DeserializerPlugin::attach(&self.metadata, config)
    }
}

impl Dialect for DataApiDialect {
    fn create_adapter(&self) -> Box<dyn DialectAdapter> {
        Box::new(DataApiAdapter)
    }

    fn create_driver(&self) -> Box<dyn Driver> {
        Box::new(self.driver())
    }

    fn syntax(&self) -> SqlSyntax {
        SqlSyntax::Mysql
    }
}
