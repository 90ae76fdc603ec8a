//! Item-level store operations.

use aws_sdk_dynamodb::operation::query::builders::QueryFluentBuilder;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use tracing::{debug, trace};

use crate::condition::{self, Condition, WriteColumns, WriteStrategy};
use crate::error::{Error, Result};
use crate::marshal::{Filter, Item, marshal_filtered, marshal_key};
use crate::record::Record;
use crate::repo::Repository;

#[derive(Debug, Clone)]
pub enum QueryOption {
    Index(String),
    /// Return items in descending range-key order.
    ScanBackward,
    /// Page size.
    Limit(i32),
}

impl QueryOption {
    fn apply(&self, query: QueryFluentBuilder) -> QueryFluentBuilder {
        match self {
            QueryOption::Index(index) => query.index_name(index),
            QueryOption::ScanBackward => query.scan_index_forward(false),
            QueryOption::Limit(limit) => query.limit(*limit),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScanOption {
    Index(String),
    Filter { expression: String, values: Item },
}

impl ScanOption {
    pub fn filter(expression: impl Into<String>, values: Item) -> Self {
        ScanOption::Filter {
            expression: expression.into(),
            values,
        }
    }

    fn apply(&self, scan: ScanFluentBuilder) -> ScanFluentBuilder {
        match self {
            ScanOption::Index(index) => scan.index_name(index),
            ScanOption::Filter { expression, values } => scan
                .filter_expression(expression)
                .set_expression_attribute_values(Some(values.clone()).filter(|v| !v.is_empty())),
        }
    }
}

impl<T: Record> Repository<T> {
    /// Unconditional put.
    pub async fn put_item(&self, record: &T) -> Result<()> {
        self.put_item_with(record, condition::replace).await
    }

    pub async fn put_item_with(&self, record: &T, strategy: WriteStrategy) -> Result<()> {
        let item = self.marshal(record)?;
        let condition = strategy(self, &item)?;
        self.send_put(item, condition).await
    }

    pub async fn put_conditional(
        &self,
        record: &T,
        expression: impl Into<String>,
        values: Item,
    ) -> Result<()> {
        let item = self.marshal(record)?;
        let condition = Condition {
            expression: Some(expression.into()),
            values,
        };
        self.send_put(item, condition).await
    }

    async fn send_put(&self, item: Item, condition: Condition) -> Result<()> {
        let client = self.validate_config()?;
        let (expression, values) = condition.into_parts();
        debug!(table = %self.table_name, condition = ?expression, "put item");
        client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(expression)
            .set_expression_attribute_values(values)
            .send()
            .await?;
        Ok(())
    }

    /// Loads the stored item with the same key as `record` into `record`.
    pub async fn get_item(&self, record: &mut T) -> Result<()> {
        let client = self.validate_config()?;
        let key = marshal_key(self, record, "")?;
        let output = client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await?;
        match output.item() {
            Some(item) => self.unmarshal(record, item),
            None => Err(Error::NotFound {
                table: self.table_name.clone(),
            }),
        }
    }

    pub async fn delete_item(&self, record: &T) -> Result<()> {
        let client = self.validate_config()?;
        let key = marshal_key(self, record, "")?;
        debug!(table = %self.table_name, "delete item");
        client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await?;
        Ok(())
    }

    /// Feeds every item sharing `source`'s hash key to `callback`, page by page.
    pub async fn query_by_hash_key<F, E>(
        &self,
        source: &T,
        options: &[QueryOption],
        mut callback: F,
    ) -> std::result::Result<(), E>
    where
        T: Default,
        F: FnMut(T) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let client = self.validate_config()?;
        let hash_key = self.hash_key_name()?;
        let values = marshal_filtered(self, source, &Filter::HashKey, ":")?;
        let mut start_key: Option<Item> = None;
        let mut page = 0usize;
        loop {
            let mut query = client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(format!("{hash_key} = :{hash_key}"))
                .set_expression_attribute_values(Some(values.clone()))
                .set_exclusive_start_key(start_key.take());
            for option in options {
                query = option.apply(query);
            }
            let output = query.send().await.map_err(Error::from)?;
            page += 1;
            trace!(table = %self.table_name, page, items = output.items().len(), "query page");
            for item in output.items() {
                let mut record = T::default();
                self.unmarshal(&mut record, item)?;
                callback(record)?;
            }
            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => return Ok(()),
            }
        }
    }

    /// Feeds every item of the table (or index) to `callback`, page by page.
    pub async fn scan<F, E>(&self, options: &[ScanOption], mut callback: F) -> std::result::Result<(), E>
    where
        T: Default,
        F: FnMut(T) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let client = self.validate_config()?;
        let mut start_key: Option<Item> = None;
        let mut page = 0usize;
        loop {
            let mut scan = client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take());
            for option in options {
                scan = option.apply(scan);
            }
            let output = scan.send().await.map_err(Error::from)?;
            page += 1;
            trace!(table = %self.table_name, page, items = output.items().len(), "scan page");
            for item in output.items() {
                let mut record = T::default();
                self.unmarshal(&mut record, item)?;
                callback(record)?;
            }
            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => return Ok(()),
            }
        }
    }
}
