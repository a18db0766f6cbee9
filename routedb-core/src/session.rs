//! Session management and timeout-bounded CRUD operations.
//!
//! A [`Session`] owns one driver client. It is created once by
//! [`Session::connect`], which fails unless the cluster answers a ping within
//! the connect timeout. Every operation afterwards runs under the query
//! timeout and surfaces the first failure without retrying.
//!
//! # Security Features
//! - The connection URI is only ever logged in redacted form
//! - TLS material is validated before the client is created
//! - Deadlines bound every network wait

use crate::config::SessionConfig;
use crate::error::{RouteDbError, redact_database_url};
use crate::{Result, tls};
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Connected session against a MongoDB-compatible cluster.
///
/// Cloning is cheap and shares the underlying connection pool, so one
/// session can serve many concurrent tasks.
///
/// # Example
/// ```rust,no_run
/// use routedb_core::bson::{Document, doc};
/// use routedb_core::{Credentials, Session, SessionConfig};
///
/// # async fn run() -> routedb_core::Result<()> {
/// let config = SessionConfig::new("127.0.0.1:27017", Credentials::new("docdb", "secret"))
///     .with_ca_file("rds-combined-ca-bundle.pem");
/// let session = Session::connect(config).await?;
///
/// let routes = session.collection::<Document>("sample-database", "collection");
/// session.insert_one(&routes, &doc! { "gateway": "0.0.0.0" }).await?;
/// let found = session.find_many(&routes, doc! { "gateway": "0.0.0.0" }, None).await?;
/// assert!(!found.is_empty());
///
/// session.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    client: Client,
    config: SessionConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config.to_string())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Establishes a verified session.
    ///
    /// # Errors
    /// - Configuration error if the configuration, CA bundle or URI is invalid
    /// - Connection error if the client cannot be created, or the cluster does
    ///   not answer a ping within the connect timeout
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let uri = config.connection_uri();
        let target = redact_database_url(&uri);
        tracing::info!("Connecting to {}", target);

        let tls = tls::client_tls(&config)?;

        let mut options = ClientOptions::parse(uri.as_str()).await.map_err(|e| {
            RouteDbError::configuration(format!(
                "Failed to parse connection options for {}: {}",
                target, e
            ))
        })?;

        options.tls = Some(tls);
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);
        options.app_name = Some(format!("routedb-{}", env!("CARGO_PKG_VERSION")));

        let client = Client::with_options(options).map_err(|e| {
            RouteDbError::connection_failed(format!("Failed to create client for {}", target), e)
        })?;

        let session = Self { client, config };
        session.ping().await?;

        tracing::info!("Connected to {}", session.config);
        Ok(session)
    }

    /// Verifies the cluster is reachable and the credentials are accepted.
    ///
    /// # Errors
    /// Connection error on failure or when the connect timeout expires
    pub async fn ping(&self) -> Result<()> {
        let limit = self.config.connect_timeout;
        let started = Instant::now();

        timeout(limit, async {
            self.client
                .database("admin")
                .run_command(doc! { "ping": 1 })
                .await
        })
        .await
        .map_err(|e| {
            RouteDbError::connection_failed(
                format!("Ping to {} timed out after {:?}", self.config.endpoint, limit),
                e,
            )
        })?
        .map_err(|e| {
            RouteDbError::connection_failed(
                format!("Failed to ping cluster at {}", self.config.endpoint),
                e,
            )
        })?;

        tracing::debug!(
            "Ping to {} succeeded in {:.2}ms",
            self.config.endpoint,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Gets a handle to a collection in the named database.
    pub fn collection<T>(&self, database: &str, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client.database(database).collection::<T>(name)
    }

    /// Gets the driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Gets the configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Inserts one document and returns the identifier the server assigned.
    ///
    /// # Errors
    /// Write error on driver failure or when the query timeout expires
    pub async fn insert_one<T>(&self, collection: &Collection<T>, document: &T) -> Result<Bson>
    where
        T: Serialize + Send + Sync,
    {
        let name = collection.name();
        let limit = self.config.query_timeout;

        let result = timeout(limit, async { collection.insert_one(document).await })
            .await
            .map_err(|e| RouteDbError::write_failed(timed_out("Insert into", name, limit), e))?
            .map_err(|e| {
                RouteDbError::write_failed(
                    format!("Failed to insert document into '{}'", name),
                    e,
                )
            })?;

        tracing::debug!("Inserted document {} into '{}'", result.inserted_id, name);
        Ok(result.inserted_id)
    }

    /// Inserts a batch and returns the assigned identifiers in input order.
    ///
    /// Documents inserted before a mid-batch failure stay in the collection.
    ///
    /// # Errors
    /// Write error on driver failure or when the query timeout expires
    pub async fn insert_many<T>(
        &self,
        collection: &Collection<T>,
        documents: &[T],
    ) -> Result<Vec<Bson>>
    where
        T: Serialize + Send + Sync,
    {
        let name = collection.name();
        if documents.is_empty() {
            tracing::debug!("Skipping empty batch insert into '{}'", name);
            return Ok(Vec::new());
        }

        let limit = self.config.query_timeout;

        let mut result = timeout(limit, async { collection.insert_many(documents).await })
            .await
            .map_err(|e| {
                RouteDbError::write_failed(timed_out("Batch insert into", name, limit), e)
            })?
            .map_err(|e| {
                RouteDbError::write_failed(
                    format!(
                        "Failed to insert {} documents into '{}'",
                        documents.len(),
                        name
                    ),
                    e,
                )
            })?;

        let ids = (0..documents.len())
            .map(|index| {
                result.inserted_ids.remove(&index).ok_or_else(|| {
                    RouteDbError::write_failed(
                        format!("Server returned no id for document {} in '{}'", index, name),
                        std::io::Error::new(std::io::ErrorKind::InvalidData, "missing inserted id"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Inserted {} documents into '{}'", ids.len(), name);
        Ok(ids)
    }

    /// Returns every document matching `filter`, fully drained from the cursor.
    ///
    /// An empty filter matches all documents. When `projection` is given
    /// only the listed fields are returned.
    ///
    /// # Errors
    /// Query error if the query fails, a document cannot be decoded, or the
    /// query timeout expires; no partial results are returned
    pub async fn find_many<T>(
        &self,
        collection: &Collection<T>,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>>
    where
        T: Send + Sync,
    {
        let documents = collection.clone_with_type::<Document>();
        let name = collection.name();
        let limit = self.config.query_timeout;

        let options = FindOptions::builder().projection(projection).build();

        timeout(limit, async {
            let mut cursor = documents
                .find(filter)
                .with_options(options)
                .await
                .map_err(|e| {
                    RouteDbError::query_failed(format!("Failed to run find query on '{}'", name), e)
                })?;

            let mut results = Vec::new();
            while cursor.advance().await.map_err(|e| {
                RouteDbError::query_failed(format!("Failed to iterate cursor for '{}'", name), e)
            })? {
                let document = cursor.deserialize_current().map_err(|e| {
                    RouteDbError::query_failed(
                        format!("Failed to decode document from '{}'", name),
                        e,
                    )
                })?;
                tracing::debug!("Returned: {}", document);
                results.push(document);
            }

            Ok::<_, RouteDbError>(results)
        })
        .await
        .map_err(|e| RouteDbError::query_failed(timed_out("Find on", name, limit), e))?
    }

    /// Deletes every document matching `filter` and returns how many were removed.
    ///
    /// An empty filter clears the collection.
    ///
    /// # Errors
    /// Write error on driver failure or when the query timeout expires
    pub async fn delete_many<T>(&self, collection: &Collection<T>, filter: Document) -> Result<u64>
    where
        T: Send + Sync,
    {
        let name = collection.name();
        let limit = self.config.query_timeout;

        let result = timeout(limit, async { collection.delete_many(filter).await })
            .await
            .map_err(|e| RouteDbError::write_failed(timed_out("Delete from", name, limit), e))?
            .map_err(|e| {
                RouteDbError::write_failed(format!("Failed to delete documents from '{}'", name), e)
            })?;

        tracing::info!(
            "Deleted {} documents from collection '{}'",
            result.deleted_count,
            name
        );
        Ok(result.deleted_count)
    }

    /// Releases the session, closing pooled connections and monitors.
    ///
    /// Clones of this session share the client and fail afterwards.
    pub async fn shutdown(self) {
        tracing::debug!("Shutting down session for {}", self.config.endpoint);
        self.client.shutdown().await;
    }
}

fn timed_out(operation: &str, collection: &str, limit: Duration) -> String {
    format!("{} '{}' timed out after {:?}", operation, collection, limit)
}
