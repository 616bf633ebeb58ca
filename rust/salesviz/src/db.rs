//! PostgreSQL-backed [`SalesStore`].
//!
//! Every call opens its own connection and drops it before returning; there is
//! no pool and no state shared between requests.

use crate::{
    config::DbConfig,
    models::{DateTotal, QueryHistoryEntry, RegionTotal, SalesRecord, SalesSample},
    store::{SalesStore, StoreError, StoreResult},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::deserialize::QueryableByName;
use diesel::sql_query;
use diesel::sql_types::{Bool, Int8, Jsonb, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl, SimpleAsyncConnection};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use rustls_pemfile::certs;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use tokio_postgres::{Config as PgConfig, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{error, info};

const SALES_TABLE: &str = "sales_data";

const TABLE_EXISTS_SQL: &str = "SELECT EXISTS (\
     SELECT FROM information_schema.tables WHERE table_name = $1\
 ) AS present";

const RECENT_SALES_SQL: &str = "SELECT to_jsonb(s) AS row \
     FROM (SELECT * FROM sales_data ORDER BY date DESC LIMIT $1) AS s \
     ORDER BY s.date DESC";

const TOTALS_BY_REGION_SQL: &str = "SELECT region, SUM(sales_amount)::float8 AS total_sales \
     FROM sales_data \
     GROUP BY region \
     ORDER BY total_sales DESC";

const TOTALS_BY_DATE_SQL: &str = "SELECT date, SUM(sales_amount)::float8 AS total_sales \
     FROM sales_data \
     GROUP BY date \
     ORDER BY date";

const SAMPLE_SQL: &str = "SELECT region, product, sales_amount::float8 AS sales_amount \
     FROM sales_data \
     LIMIT $1";

const RECORD_QUERY_SQL: &str = "INSERT INTO user_queries (query_text, chart_config) VALUES ($1, $2)";

#[derive(Clone)]
pub struct PgStore {
    config: PgConfig,
    tls: PgTls,
    host: String,
    port: String,
}

#[derive(Clone)]
enum PgTls {
    None,
    Rustls(MakeRustlsConnect),
}

impl PgStore {
    pub fn new(db: &DbConfig) -> Result<Self> {
        let mut config = PgConfig::new();
        if let Some(host) = &db.host {
            config.host(host);
        }
        if let Some(port) = db.port {
            config.port(port);
        }
        if let Some(name) = &db.name {
            config.dbname(name);
        }
        if let Some(user) = &db.user {
            config.user(user);
        }
        if let Some(password) = &db.password {
            config.password(password.expose());
        }

        let tls = match db.ssl_root_cert.as_deref() {
            Some(path) => PgTls::Rustls(tls_connector(path, db)?),
            None => PgTls::None,
        };

        Ok(Self {
            config,
            tls,
            host: db.host.clone().unwrap_or_default(),
            port: db.port.map(|p| p.to_string()).unwrap_or_default(),
        })
    }

    async fn connect(&self) -> StoreResult<AsyncPgConnection> {
        info!(host = %self.host, port = %self.port, "attempting database connection");
        let config = self.config.clone();
        let result = match &self.tls {
            PgTls::None => {
                let (client, connection) = config.connect(NoTls).await.map_err(connection_err)?;
                AsyncPgConnection::try_from_client_and_connection(client, connection).await
            }
            PgTls::Rustls(connector) => {
                let (client, connection) = config
                    .connect(connector.clone())
                    .await
                    .map_err(connection_err)?;
                AsyncPgConnection::try_from_client_and_connection(client, connection).await
            }
        };

        result.map_err(|err| {
            error!(error = %err, "database connection failed");
            StoreError::Connection(err.to_string())
        })
    }
}

fn connection_err(err: tokio_postgres::Error) -> StoreError {
    error!(error = %err, "database connection failed");
    StoreError::Connection(err.to_string())
}

fn query_err(err: diesel::result::Error) -> StoreError {
    error!(error = %err, "database query failed");
    StoreError::Query(err.to_string())
}

#[derive(Debug, QueryableByName)]
struct TableExists {
    #[diesel(sql_type = Bool)]
    present: bool,
}

#[derive(Debug, QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Jsonb)]
    row: Value,
}

#[async_trait]
impl SalesStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connect().await?;
        conn.batch_execute("SELECT 1").await.map_err(query_err)
    }

    async fn recent_sales(&self, limit: i64) -> StoreResult<Vec<SalesRecord>> {
        let mut conn = self.connect().await?;

        let exists: TableExists = sql_query(TABLE_EXISTS_SQL)
            .bind::<Text, _>(SALES_TABLE.to_string())
            .get_result(&mut conn)
            .await
            .map_err(query_err)?;
        if !exists.present {
            return Err(StoreError::TableMissing(SALES_TABLE.to_string()));
        }

        let rows: Vec<JsonRow> = sql_query(RECENT_SALES_SQL)
            .bind::<Int8, _>(limit)
            .load(&mut conn)
            .await
            .map_err(query_err)?;

        rows.into_iter()
            .map(|row| {
                SalesRecord::from_json(row.row)
                    .map_err(|err| StoreError::Query(format!("unexpected {SALES_TABLE} row: {err}")))
            })
            .collect()
    }

    async fn totals_by_region(&self) -> StoreResult<Vec<RegionTotal>> {
        let mut conn = self.connect().await?;
        sql_query(TOTALS_BY_REGION_SQL)
            .load(&mut conn)
            .await
            .map_err(query_err)
    }

    async fn totals_by_date(&self) -> StoreResult<Vec<DateTotal>> {
        let mut conn = self.connect().await?;
        sql_query(TOTALS_BY_DATE_SQL)
            .load(&mut conn)
            .await
            .map_err(query_err)
    }

    async fn sample_sales(&self, limit: i64) -> StoreResult<Vec<SalesSample>> {
        let mut conn = self.connect().await?;
        sql_query(SAMPLE_SQL)
            .bind::<Int8, _>(limit)
            .load(&mut conn)
            .await
            .map_err(query_err)
    }

    async fn record_query(&self, entry: &QueryHistoryEntry) -> StoreResult<()> {
        let mut conn = self.connect().await?;
        sql_query(RECORD_QUERY_SQL)
            .bind::<Text, _>(entry.query_text.clone())
            .bind::<Jsonb, _>(entry.chart_config.clone())
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(query_err)
    }
}

/// rustls connector for `DB_SSL_ROOT_CERT`, with client auth when
/// `DB_SSL_CERT`/`DB_SSL_KEY` are both set.
fn tls_connector(root_cert: &str, db: &DbConfig) -> Result<MakeRustlsConnect> {
    let mut root_store = RootCertStore::empty();
    for cert in read_pem(root_cert, "DB_SSL_ROOT_CERT", |reader| {
        certs(reader).collect::<std::io::Result<Vec<_>>>()
    })? {
        root_store
            .add(cert)
            .map_err(|err| anyhow::anyhow!("invalid certificate in DB_SSL_ROOT_CERT: {err}"))?;
    }

    let builder = ClientConfig::builder().with_root_certificates(root_store);
    let client_config = match (db.ssl_cert.as_deref(), db.ssl_key.as_deref()) {
        (None, None) => builder.with_no_client_auth(),
        (Some(cert), Some(key)) => {
            let chain: Vec<CertificateDer<'static>> = read_pem(cert, "DB_SSL_CERT", |reader| {
                certs(reader).collect::<std::io::Result<Vec<_>>>()
            })?;
            if chain.is_empty() {
                anyhow::bail!("DB_SSL_CERT contained no certificates");
            }
            let key: PrivateKeyDer<'static> =
                read_pem(key, "DB_SSL_KEY", |reader| rustls_pemfile::private_key(reader))?
                    .context("DB_SSL_KEY contained no private keys")?;
            builder
                .with_client_auth_cert(chain, key)
                .context("DB_SSL_CERT and DB_SSL_KEY do not form a usable client identity")?
        }
        _ => anyhow::bail!("DB_SSL_CERT and DB_SSL_KEY must both be set (or neither)"),
    };

    Ok(MakeRustlsConnect::new(client_config))
}

fn read_pem<T>(
    path: &str,
    var: &str,
    parse: impl FnOnce(&mut BufReader<File>) -> std::io::Result<T>,
) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {var} '{path}'"))?;
    parse(&mut BufReader::new(file)).with_context(|| format!("failed to parse {var} '{path}'"))
}
