//! Table lifecycle: create, wait, TTL, delete, describe.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, Projection,
    ProvisionedThroughput, TableDescription, TableStatus, TimeToLiveDescription,
    TimeToLiveSpecification,
};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::BillingMode;
use crate::error::{Error, Result};
use crate::repo::Repository;
use crate::schema::{AttributeDef, IndexDef, KeyElement};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: Option<TableDescription>,
    pub ttl: Option<TimeToLiveDescription>,
}

impl KeyElement {
    pub fn to_sdk(&self) -> Result<KeySchemaElement> {
        Ok(KeySchemaElement::builder()
            .attribute_name(&self.attribute_name)
            .key_type(self.key_type.clone())
            .build()?)
    }
}

impl AttributeDef {
    pub fn to_sdk(&self) -> Result<AttributeDefinition> {
        Ok(AttributeDefinition::builder()
            .attribute_name(&self.attribute_name)
            .attribute_type(self.attribute_type.clone())
            .build()?)
    }
}

impl IndexDef {
    pub fn to_sdk(&self, throughput: Option<ProvisionedThroughput>) -> Result<GlobalSecondaryIndex> {
        let key_schema = self
            .key_schema
            .iter()
            .map(KeyElement::to_sdk)
            .collect::<Result<Vec<_>>>()?;
        Ok(GlobalSecondaryIndex::builder()
            .index_name(&self.index_name)
            .set_key_schema(Some(key_schema))
            .projection(
                Projection::builder()
                    .projection_type(self.projection.clone())
                    .build(),
            )
            .set_provisioned_throughput(throughput)
            .build()?)
    }
}

impl<T> Repository<T> {
    pub fn key_schema_elements(&self) -> Result<Vec<KeySchemaElement>> {
        self.schema.key_schema().iter().map(KeyElement::to_sdk).collect()
    }

    pub fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.schema
            .attribute_definitions()
            .iter()
            .map(AttributeDef::to_sdk)
            .collect()
    }

    /// `None` under on-demand billing.
    pub fn provisioned_throughput(&self) -> Result<Option<ProvisionedThroughput>> {
        if self.config.billing_mode == BillingMode::PayPerRequest {
            return Ok(None);
        }
        Ok(Some(
            ProvisionedThroughput::builder()
                .read_capacity_units(self.config.read_capacity_units)
                .write_capacity_units(self.config.write_capacity_units)
                .build()?,
        ))
    }

    /// `None` when the record declares no secondary index.
    pub fn global_secondary_indexes(&self) -> Result<Option<Vec<GlobalSecondaryIndex>>> {
        if self.schema.indexes().is_empty() {
            return Ok(None);
        }
        let throughput = self.provisioned_throughput()?;
        self.schema
            .indexes()
            .values()
            .map(|index| index.to_sdk(throughput.clone()))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Creates the table, waits for it, then enables TTL when the record has
    /// an expiry column.
    pub async fn create_table(&self) -> Result<()> {
        let client = self.validate_config()?;
        info!(table = %self.table_name, "creating table");
        client
            .create_table()
            .table_name(&self.table_name)
            .set_attribute_definitions(Some(self.attribute_definitions()?))
            .set_key_schema(Some(self.key_schema_elements()?))
            .set_global_secondary_indexes(self.global_secondary_indexes()?)
            .billing_mode(self.config.billing_mode.into())
            .set_provisioned_throughput(self.provisioned_throughput()?)
            .send()
            .await?;
        self.wait_till_ready().await?;
        if !self.schema.ttl_column().is_empty() {
            self.update_ttl().await?;
        }
        Ok(())
    }

    pub async fn wait_till_ready(&self) -> Result<()> {
        let client = self.validate_config()?;
        let waited = self.config.wait_duration();
        let deadline = Instant::now() + waited;
        loop {
            let output = client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await?;
            let status = output.table().and_then(|table| table.table_status());
            debug!(table = %self.table_name, ?status, "waiting for table");
            if status == Some(&TableStatus::Active) {
                info!(table = %self.table_name, "table active");
                return Ok(());
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(Error::WaitTimeout {
                    table: self.table_name.clone(),
                    waited_secs: waited.as_secs(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Enables TTL on the expiry column. Records without one leave the table
    /// untouched.
    pub async fn update_ttl(&self) -> Result<()> {
        let client = self.validate_config()?;
        let ttl_column = self.schema.ttl_column();
        if ttl_column.is_empty() {
            debug!(table = %self.table_name, "no expiry column, ttl unchanged");
            return Ok(());
        }
        let specification = TimeToLiveSpecification::builder()
            .attribute_name(ttl_column)
            .enabled(true)
            .build()?;
        client
            .update_time_to_live()
            .table_name(&self.table_name)
            .time_to_live_specification(specification)
            .send()
            .await?;
        info!(table = %self.table_name, column = ttl_column, "ttl enabled");
        Ok(())
    }

    pub async fn delete_table(&self) -> Result<()> {
        let client = self.validate_config()?;
        client
            .delete_table()
            .table_name(&self.table_name)
            .send()
            .await?;
        info!(table = %self.table_name, "table deleted");
        Ok(())
    }

    pub async fn report(&self) -> Result<TableReport> {
        let client = self.validate_config()?;
        let table = client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await?;
        let ttl = client
            .describe_time_to_live()
            .table_name(&self.table_name)
            .send()
            .await?;
        Ok(TableReport {
            table: table.table().cloned(),
            ttl: ttl.time_to_live_description().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::Client;
    use aws_sdk_dynamodb::operation::create_table::CreateTableOutput;
    use aws_sdk_dynamodb::operation::delete_table::DeleteTableOutput;
    use aws_sdk_dynamodb::operation::describe_table::DescribeTableOutput;
    use aws_sdk_dynamodb::operation::describe_time_to_live::DescribeTimeToLiveOutput;
    use aws_sdk_dynamodb::operation::update_time_to_live::UpdateTimeToLiveOutput;
    use aws_sdk_dynamodb::types::{
        BillingMode as SdkBillingMode, KeyType, ProjectionType, ScalarAttributeType,
        TimeToLiveStatus,
    };
    use aws_smithy_mocks::{RuleMode, mock, mock_client};

    use super::*;
    use crate::config::RepoConfig;

    #[allow(dead_code)]
    #[derive(crate::Record, Default)]
    pub struct Event {
        #[ddb("id,hash-key")]
        pub id: String,
        #[ddb("at,range-key")]
        pub at: u64,
        #[ddb_gsi("byKind hash-key")]
        pub kind: String,
        #[ddb_gsi("byKind range-key")]
        pub priority: i32,
        #[ddb("expireOn,expire")]
        pub expire_on: i64,
    }

    #[test]
    fn key_schema_and_definitions_convert() {
        let repo = Repository::<Event>::new().unwrap();
        let keys = repo.key_schema_elements().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].attribute_name(), "id");
        assert_eq!(keys[0].key_type(), &KeyType::Hash);
        assert_eq!(keys[1].key_type(), &KeyType::Range);

        let defs = repo.attribute_definitions().unwrap();
        let pairs: Vec<(&str, &ScalarAttributeType)> = defs
            .iter()
            .map(|def| (def.attribute_name(), def.attribute_type()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("id", &ScalarAttributeType::S),
                ("at", &ScalarAttributeType::N),
                ("kind", &ScalarAttributeType::S),
                ("priority", &ScalarAttributeType::N),
            ]
        );
    }

    #[test]
    fn indexes_carry_projection_and_throughput() {
        let repo = Repository::<Event>::new().unwrap();
        let indexes = repo.global_secondary_indexes().unwrap().unwrap();
        assert_eq!(indexes.len(), 1);
        let index = &indexes[0];
        assert_eq!(index.index_name(), "byKind");
        assert_eq!(
            index.projection().and_then(|p| p.projection_type()),
            Some(&ProjectionType::All)
        );
        let names: Vec<&str> = index.key_schema().iter().map(|k| k.attribute_name()).collect();
        assert_eq!(names, vec!["kind", "priority"]);
        let throughput = index.provisioned_throughput().unwrap();
        assert_eq!(throughput.read_capacity_units(), 1);
    }

    #[test]
    fn on_demand_billing_has_no_throughput() {
        let config = RepoConfig::default().with_billing_mode(BillingMode::PayPerRequest);
        let repo = Repository::<Event>::with_config(config).unwrap();
        assert!(repo.provisioned_throughput().unwrap().is_none());
        let indexes = repo.global_secondary_indexes().unwrap().unwrap();
        assert!(indexes[0].provisioned_throughput().is_none());
    }

    #[tokio::test]
    async fn lifecycle_requires_configuration() {
        let repo = Repository::<Event>::new().unwrap();
        assert!(matches!(repo.create_table().await, Err(Error::MissingTableName)));
        let repo = repo.with_table_name("events");
        assert!(matches!(repo.delete_table().await, Err(Error::MissingClient)));
        assert!(matches!(repo.report().await, Err(Error::MissingClient)));
    }

    fn described(status: TableStatus) -> DescribeTableOutput {
        DescribeTableOutput::builder()
            .table(
                TableDescription::builder()
                    .table_name("events")
                    .table_status(status)
                    .build(),
            )
            .build()
    }

    #[allow(dead_code)]
    #[derive(crate::Record, Default)]
    pub struct Note {
        #[ddb("id,hash-key")]
        pub id: String,
    }

    #[tokio::test]
    async fn create_waits_then_enables_ttl() {
        let create = mock!(Client::create_table)
            .match_requests(|req| {
                req.table_name() == Some("events")
                    && req.key_schema().len() == 2
                    && req.global_secondary_indexes().len() == 1
                    && req.billing_mode() == Some(&SdkBillingMode::Provisioned)
            })
            .then_output(|| CreateTableOutput::builder().build());
        let describe = mock!(Client::describe_table)
            .then_output(|| described(TableStatus::Active));
        let ttl = mock!(Client::update_time_to_live)
            .match_requests(|req| {
                req.time_to_live_specification().map(|spec| (spec.attribute_name(), spec.enabled()))
                    == Some(("expireOn", true))
            })
            .then_output(|| UpdateTimeToLiveOutput::builder().build());
        let client = mock_client!(
            aws_sdk_dynamodb,
            RuleMode::Sequential,
            &[&create, &describe, &ttl]
        );

        let repo = Repository::<Event>::new()
            .unwrap()
            .with_table_name("events")
            .with_client(client);
        repo.create_table().await.unwrap();
        assert_eq!(create.num_calls(), 1);
        assert_eq!(describe.num_calls(), 1);
        assert_eq!(ttl.num_calls(), 1);
    }

    #[tokio::test]
    async fn create_without_expiry_column_skips_ttl() {
        let create = mock!(Client::create_table)
            .match_requests(|req| {
                req.billing_mode() == Some(&SdkBillingMode::PayPerRequest)
                    && req.provisioned_throughput().is_none()
                    && req.global_secondary_indexes().is_empty()
            })
            .then_output(|| CreateTableOutput::builder().build());
        let describe = mock!(Client::describe_table)
            .then_output(|| described(TableStatus::Active));
        let client = mock_client!(aws_sdk_dynamodb, RuleMode::Sequential, &[&create, &describe]);

        let config = RepoConfig::default().with_billing_mode(BillingMode::PayPerRequest);
        let repo = Repository::<Note>::with_config(config)
            .unwrap()
            .with_table_name("notes")
            .with_client(client);
        repo.create_table().await.unwrap();
        repo.update_ttl().await.unwrap();
        assert_eq!(describe.num_calls(), 1);
    }

    #[tokio::test]
    async fn wait_gives_up_after_deadline() {
        let describe = mock!(Client::describe_table)
            .then_output(|| described(TableStatus::Creating));
        let client = mock_client!(aws_sdk_dynamodb, RuleMode::Sequential, &[&describe]);

        let config = RepoConfig {
            wait_seconds: 0,
            ..RepoConfig::default()
        };
        let repo = Repository::<Event>::with_config(config)
            .unwrap()
            .with_table_name("events")
            .with_client(client);
        let err = repo.wait_till_ready().await.unwrap_err();
        assert!(matches!(
            err,
            Error::WaitTimeout { ref table, waited_secs: 0 } if table == "events"
        ));
        assert_eq!(describe.num_calls(), 1);
    }

    #[tokio::test]
    async fn report_and_delete() {
        let describe = mock!(Client::describe_table)
            .then_output(|| described(TableStatus::Active));
        let describe_ttl = mock!(Client::describe_time_to_live).then_output(|| {
            DescribeTimeToLiveOutput::builder()
                .time_to_live_description(
                    TimeToLiveDescription::builder()
                        .attribute_name("expireOn")
                        .time_to_live_status(TimeToLiveStatus::Enabled)
                        .build(),
                )
                .build()
        });
        let delete = mock!(Client::delete_table)
            .match_requests(|req| req.table_name() == Some("events"))
            .then_output(|| DeleteTableOutput::builder().build());
        let client = mock_client!(
            aws_sdk_dynamodb,
            RuleMode::Sequential,
            &[&describe, &describe_ttl, &delete]
        );

        let repo = Repository::<Event>::new()
            .unwrap()
            .with_table_name("events")
            .with_client(client);
        let report = repo.report().await.unwrap();
        assert_eq!(
            report.table.and_then(|t| t.table_status),
            Some(TableStatus::Active)
        );
        assert_eq!(
            report.ttl.and_then(|t| t.attribute_name),
            Some("expireOn".to_owned())
        );
        repo.delete_table().await.unwrap();
        assert_eq!(delete.num_calls(), 1);
    }
}
