// SPDX-License-Identifier: Apache-2.0

//! Fan-out against real PostgreSQL and MySQL servers.
//!
//! Each test is skipped unless its `AGGREGATEHUB_TEST_*_HOST` variable is set.

use aggregatehub_lib::config::{HubConfig, MappingSpec, TargetConfig};
use aggregatehub_lib::engine::{merge, LogicalField, LogicalFilter, LogicalRecord};
use aggregatehub_lib::observability::Sensitive;
use aggregatehub_lib::AggregateHub;
use uuid::Uuid;

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16_or_default(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn unique_table(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

fn live_target(prefix: &str, driver: &str, default_port: u16, table: &str) -> Option<TargetConfig> {
    let host = std::env::var(format!("AGGREGATEHUB_TEST_{}_HOST", prefix)).ok()?;

    let mut config = TargetConfig::new(format!("{}-live", driver), driver).with_table(table);
    config.host = Some(host);
    config.port = Some(env_u16_or_default(
        &format!("AGGREGATEHUB_TEST_{}_PORT", prefix),
        default_port,
    ));
    config.username = Some(env_or_default(&format!("AGGREGATEHUB_TEST_{}_USER", prefix), "hub"));
    config.password = Some(Sensitive::new(env_or_default(
        &format!("AGGREGATEHUB_TEST_{}_PASSWORD", prefix),
        "hub_test",
    )));
    config.database = Some(env_or_default(&format!("AGGREGATEHUB_TEST_{}_DB", prefix), "testdb"));
    config.mapping = Some(MappingSpec::Inline("{id=user_id, surname=family_name}".to_string()));
    Some(config)
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (user_id VARCHAR(50) PRIMARY KEY, username VARCHAR(50) NOT NULL, name VARCHAR(50) NOT NULL, family_name VARCHAR(50) NOT NULL)"
    )
}

async fn replicate_and_query(config: TargetConfig) {
    let hub = AggregateHub::from_config(&HubConfig::new(vec![config])).unwrap();
    let jane = LogicalRecord::new(Uuid::new_v4().simple().to_string(), "jane", "Jane", "Roe");

    let outcomes = hub.replicate(&jane).await.unwrap();
    assert!(merge::all_succeeded(&outcomes), "{outcomes:?}");

    let result = hub
        .query(&LogicalFilter::new().with(LogicalField::Surname, "Roe"))
        .await;
    assert!(result.failed_targets().is_empty(), "{:?}", result.outcomes);
    assert_eq!(result.records, vec![jane]);

    hub.close().await;
}

#[tokio::test]
async fn test_postgres_target() {
    let table = unique_table("hub_pg");
    let Some(config) = live_target("PG", "postgres", 5432, &table) else {
        eprintln!("AGGREGATEHUB_TEST_PG_HOST not set; skipping");
        return;
    };

    let url = format!(
        "postgres://{}:{}@{}:{}/{}",
        config.username.as_deref().unwrap_or_default(),
        config.password.as_ref().map(|p| p.expose().as_str()).unwrap_or_default(),
        config.host.as_deref().unwrap_or_default(),
        config.port.unwrap_or(5432),
        config.database.as_deref().unwrap_or_default()
    );
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    sqlx::query(&create_table_sql(&table)).execute(&pool).await.unwrap();

    replicate_and_query(config).await;

    sqlx::query(&format!("DROP TABLE {table}")).execute(&pool).await.unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_postgres_mixed_case_mapping_reaches_unquoted_table() {
    let suffix = Uuid::new_v4().simple().to_string();
    let table = format!("Postgres2User_{}", suffix);
    let Some(mut config) = live_target("PG", "postgres", 5432, &table) else {
        eprintln!("AGGREGATEHUB_TEST_PG_HOST not set; skipping");
        return;
    };
    config.mapping = Some(MappingSpec::Inline(
        "{id=Postgres2id, username=Postgres2Username, name=Postgres2Name, surname=Postgres2Surname}"
            .to_string(),
    ));

    let url = format!(
        "postgres://{}:{}@{}:{}/{}",
        config.username.as_deref().unwrap_or_default(),
        config.password.as_ref().map(|p| p.expose().as_str()).unwrap_or_default(),
        config.host.as_deref().unwrap_or_default(),
        config.port.unwrap_or(5432),
        config.database.as_deref().unwrap_or_default()
    );
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    // Unquoted DDL: the server stores every name folded to lower case.
    sqlx::query(&format!(
        "CREATE TABLE {table} (Postgres2id VARCHAR(50) PRIMARY KEY, Postgres2Username VARCHAR(50) NOT NULL, Postgres2Name VARCHAR(50) NOT NULL, Postgres2Surname VARCHAR(50) NOT NULL)"
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "INSERT INTO {table} (Postgres2id, Postgres2Username, Postgres2Name, Postgres2Surname) VALUES ('1', 'jdoe', 'John', 'Doe')"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let hub = AggregateHub::from_config(&HubConfig::new(vec![config])).unwrap();
    let result = hub
        .query(&LogicalFilter::new().with(LogicalField::Name, "John"))
        .await;
    assert!(result.failed_targets().is_empty(), "{:?}", result.outcomes);
    assert_eq!(result.records, vec![LogicalRecord::new("1", "jdoe", "John", "Doe")]);

    let jane = LogicalRecord::new("2", "jane", "Jane", "Roe");
    let outcomes = hub.replicate(&jane).await.unwrap();
    assert!(merge::all_succeeded(&outcomes), "{outcomes:?}");
    hub.close().await;

    let stored: (String,) = sqlx::query_as(&format!("SELECT postgres2username FROM {table} WHERE postgres2id = '2'"))
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored.0, "jane");

    sqlx::query(&format!("DROP TABLE {table}")).execute(&pool).await.unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_mysql_target() {
    let table = unique_table("hub_my");
    let Some(config) = live_target("MYSQL", "mysql", 3306, &table) else {
        eprintln!("AGGREGATEHUB_TEST_MYSQL_HOST not set; skipping");
        return;
    };

    let url = format!(
        "mysql://{}:{}@{}:{}/{}",
        config.username.as_deref().unwrap_or_default(),
        config.password.as_ref().map(|p| p.expose().as_str()).unwrap_or_default(),
        config.host.as_deref().unwrap_or_default(),
        config.port.unwrap_or(3306),
        config.database.as_deref().unwrap_or_default()
    );
    let pool = sqlx::MySqlPool::connect(&url).await.unwrap();
    sqlx::query(&create_table_sql(&table)).execute(&pool).await.unwrap();

    replicate_and_query(config).await;

    sqlx::query(&format!("DROP TABLE {table}")).execute(&pool).await.unwrap();
    pool.close().await;
}
