use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::mutation::insert_or_update;
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::SpannerConfig;
use crate::models::Record;
use crate::store::KvStore;

/// Table holding every record; not configurable per request
pub const TABLE_NAME: &str = "KeyValueTable";

/// Shareable Spanner-backed store for use across async handlers
#[derive(Clone)]
pub struct SpannerStore {
    inner: Arc<Client>,
}

impl SpannerStore {
    /// Create a new Spanner-backed store from configuration
    ///
    /// The gcloud-spanner library automatically detects the
    /// SPANNER_EMULATOR_HOST environment variable and connects to
    /// the emulator when set, or production Spanner otherwise.
    ///
    /// Against the emulator, the instance, database and `KeyValueTable` are
    /// created first if they don't exist. Production resources must already
    /// exist.
    pub async fn from_config(config: &SpannerConfig) -> Result<Self> {
        if needs_bootstrap(config) {
            bootstrap_emulator(config).await?;
        }

        let database_path = format!(
            "projects/{}/instances/{}/databases/{}",
            config.project, config.instance, config.database
        );

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        // ClientConfig::default() automatically uses SPANNER_EMULATOR_HOST if set
        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
        })
    }
}

#[async_trait]
impl KvStore for SpannerStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let mut statement = Statement::new(format!(
            "SELECT `value` FROM {} WHERE `key` = @lookup_key",
            TABLE_NAME
        ));
        statement.add_param("lookup_key", &key.to_string());

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query value from Spanner")?;

        if let Some(row) = result_set.next().await? {
            let value_str: String = row.column_by_name("value")?;
            let value: JsonValue = serde_json::from_str(&value_str)
                .context("Failed to deserialize stored JSON value")?;

            tracing::debug!("Read value for key: {}", key);
            Ok(Some(value))
        } else {
            tracing::debug!("No row for key: {}", key);
            Ok(None)
        }
    }

    /// Single `insert_or_update` mutation, so a failed call writes nothing
    async fn put(&self, record: Record) -> Result<()> {
        let value_str = serde_json::to_string(&record.value)
            .context("Failed to serialize JSON value")?;

        let mutation = insert_or_update(
            TABLE_NAME,
            &["key", "value", "updated_at"],
            &[&record.key, &value_str, &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to write record to Spanner")?;

        tracing::debug!("Wrote value for key: {}", record.key);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

/// Whether startup should create the emulator's instance, database and table
///
/// Production resources are managed outside this service and only checked
/// by the first query.
fn needs_bootstrap(config: &SpannerConfig) -> bool {
    config.emulator_host.is_some()
}

/// Map an admin lookup to `true` if the resource exists, `false` on NotFound
fn resource_exists<T>(lookup: std::result::Result<T, Status>, what: &str) -> Result<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(status) if status.code() == Code::NotFound => Ok(false),
        Err(status) => Err(anyhow::anyhow!(
            "Failed to look up {}: {}",
            what,
            status.message()
        )),
    }
}

/// Create the emulator instance and database holding `KeyValueTable`
///
/// A new database is created with the table in one DDL batch. An existing
/// database only gets the table added when its DDL lacks it.
async fn bootstrap_emulator(config: &SpannerConfig) -> Result<()> {
    let admin = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project = format!("projects/{}", config.project);
    let instance = format!("{}/instances/{}", project, config.instance);
    let database = format!("{}/databases/{}", instance, config.database);

    let lookup = admin
        .instance()
        .get_instance(GetInstanceRequest { name: instance.clone(), field_mask: None }, None)
        .await;
    if !resource_exists(lookup, "emulator instance")? {
        let request = CreateInstanceRequest {
            parent: project.clone(),
            instance_id: config.instance.clone(),
            instance: Some(Instance {
                name: instance.clone(),
                config: format!("{}/instanceConfigs/emulator-config", project),
                display_name: config.instance.clone(),
                node_count: 1,
                ..Default::default()
            }),
        };
        admin
            .instance()
            .create_instance(request, None)
            .await
            .context("Failed to start emulator instance creation")?
            .wait(None)
            .await
            .context("Failed to create emulator instance")?;
        tracing::info!("Created emulator instance {}", instance);
    }

    let lookup = admin
        .database()
        .get_database(GetDatabaseRequest { name: database.clone() }, None)
        .await;
    if !resource_exists(lookup, "emulator database")? {
        let request = CreateDatabaseRequest {
            parent: instance.clone(),
            create_statement: format!("CREATE DATABASE `{}`", config.database),
            extra_statements: vec![create_table_ddl()],
            encryption_config: None,
            database_dialect: 1, // Google Standard SQL
            proto_descriptors: vec![],
        };
        admin
            .database()
            .create_database(request, None)
            .await
            .context("Failed to start emulator database creation")?
            .wait(None)
            .await
            .context("Failed to create emulator database")?;
        tracing::info!("Created emulator database {} with table {}", database, TABLE_NAME);
        return Ok(());
    }

    let ddl = admin
        .database()
        .get_database_ddl(GetDatabaseDdlRequest { database: database.clone() }, None)
        .await
        .context("Failed to read emulator database DDL")?
        .into_inner()
        .statements;
    if ddl_defines_table(&ddl) {
        tracing::debug!("Table {} already present in {}", TABLE_NAME, database);
        return Ok(());
    }

    let request = UpdateDatabaseDdlRequest {
        database: database.clone(),
        statements: vec![create_table_ddl()],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };
    admin
        .database()
        .update_database_ddl(request, None)
        .await
        .context("Failed to start table creation")?
        .wait(None)
        .await
        .context("Failed to create table")?;
    tracing::info!("Created table {} in {}", TABLE_NAME, database);
    Ok(())
}

/// DDL for the record table
fn create_table_ddl() -> String {
    format!(
        r#"
CREATE TABLE {} (
    `key` STRING(MAX) NOT NULL,
    `value` JSON NOT NULL,
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (`key`)
"#,
        TABLE_NAME
    )
    .trim()
    .to_string()
}

fn ddl_defines_table(statements: &[String]) -> bool {
    let plain = format!("CREATE TABLE {}", TABLE_NAME);
    let quoted = format!("CREATE TABLE `{}`", TABLE_NAME);
    statements
        .iter()
        .any(|stmt| stmt.contains(&plain) || stmt.contains(&quoted))
}
