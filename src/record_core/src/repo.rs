use std::fmt;
use std::marker::PhantomData;

use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use crate::annotation::ParseProps;
use crate::condition::WriteColumns;
use crate::config::RepoConfig;
use crate::error::{Error, Result};
use crate::marshal::{self, Item};
use crate::record::Record;
use crate::schema::TableSchema;

/// Typed access to one table holding records of type `T`.
///
/// The table schema is derived from `T` when the repository is built and never
/// changes afterwards.
pub struct Repository<T> {
    pub(crate) client: Option<Client>,
    pub(crate) table_name: String,
    pub(crate) config: RepoConfig,
    pub(crate) schema: TableSchema,
    _record: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table_name", &self.table_name)
            .field("connected", &self.client.is_some())
            .field("config", &self.config)
            .field("schema", &self.schema)
            .finish()
    }
}

impl<T: Record> Repository<T> {
    pub fn new() -> Result<Self> {
        Self::with_config(RepoConfig::default())
    }

    pub fn with_config(config: RepoConfig) -> Result<Self> {
        let schema = TableSchema::for_record::<T, _>(&config)?;
        debug!(record = std::any::type_name::<T>(), "repository created");
        Ok(Self {
            client: None,
            table_name: String::new(),
            config,
            schema,
            _record: PhantomData,
        })
    }

    pub fn marshal(&self, record: &T) -> Result<Item> {
        marshal::marshal(self, record)
    }

    pub fn unmarshal(&self, target: &mut T, item: &Item) -> Result<()> {
        marshal::unmarshal(self, target, item)
    }
}

impl<T> Repository<T> {
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_sdk_config(self, sdk_config: &SdkConfig) -> Self {
        self.with_client(Client::new(sdk_config))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Checks that the repository can talk to a table and hands out the client.
    pub fn validate_config(&self) -> Result<&Client> {
        if self.table_name.is_empty() {
            return Err(Error::MissingTableName);
        }
        self.client.as_ref().ok_or(Error::MissingClient)
    }
}

impl<T> ParseProps for Repository<T> {
    fn allow_untagged_fields(&self) -> bool {
        self.config.allow_untagged_fields
    }

    fn lowercase_untagged_fields(&self) -> bool {
        self.config.lowercase_untagged_fields
    }
}

impl<T> WriteColumns for Repository<T> {
    fn hash_key_name(&self) -> Result<&str> {
        self.schema.hash_key_name()
    }

    fn version_column_name(&self) -> Result<&str> {
        self.schema.version_column_name()
    }

    fn expiry_column_name(&self) -> Option<&str> {
        self.schema.expiry_column_name()
    }
}
