use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{is_duplicate_key, key_filter, season_filter, versioned_filter},
};
use crate::{
    dao::{roster_store::RosterRepository, roster_store::version_conflict, storage::StorageResult},
    state::roster::{Division, DivisionKey},
};

const ROSTER_COLLECTION_NAME: &str = "rosters";

#[derive(Clone)]
pub struct MongoRosterStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRosterStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = IndexModel::builder()
            .keys(doc! { "ageGroup": 1, "season": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("roster_division_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROSTER_COLLECTION_NAME,
                index: "ageGroup,season",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<Division> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<Division>(ROSTER_COLLECTION_NAME)
    }

    async fn list(&self, season: Option<String>) -> MongoResult<Vec<Division>> {
        let collection = self.collection().await;

        collection
            .find(season_filter(season.as_deref()))
            .sort(doc! { "season": 1, "ageGroup": 1 })
            .await
            .map_err(|source| MongoDaoError::ListDivisions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListDivisions { source })
    }

    async fn find(&self, key: DivisionKey) -> MongoResult<Option<Division>> {
        let collection = self.collection().await;

        collection
            .find_one(key_filter(&key))
            .await
            .map_err(|source| MongoDaoError::LoadDivision { key, source })
    }

    async fn create(&self, division: Division) -> MongoResult<()> {
        let collection = self.collection().await;

        match collection.insert_one(&division).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(MongoDaoError::DuplicateDivision {
                key: division.key(),
            }),
            Err(source) => Err(MongoDaoError::SaveDivision {
                key: division.key(),
                source,
            }),
        }
    }

    /// Replace the document only while its stored version still equals `expected_version`.
    async fn replace(&self, division: Division, expected_version: u64) -> MongoResult<()> {
        let key = division.key();
        let collection = self.collection().await;

        let result = collection
            .replace_one(versioned_filter(&key, expected_version), &division)
            .await
            .map_err(|source| MongoDaoError::SaveDivision {
                key: key.clone(),
                source,
            })?;

        if result.matched_count > 0 {
            return Ok(());
        }

        match self.find(key.clone()).await? {
            Some(stored) => Err(MongoDaoError::VersionConflict {
                message: version_conflict(&key, expected_version, Some(stored.version)),
            }),
            None => Err(MongoDaoError::DivisionNotFound { key }),
        }
    }

    async fn delete(&self, key: DivisionKey) -> MongoResult<bool> {
        let collection = self.collection().await;
        let result = collection
            .delete_one(key_filter(&key))
            .await
            .map_err(|source| MongoDaoError::DeleteDivision { key, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl RosterRepository for MongoRosterStore {
    fn list(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<Vec<Division>>> {
        let store = self.clone();
        Box::pin(async move { store.list(season).await.map_err(Into::into) })
    }

    fn find(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<Option<Division>>> {
        let store = self.clone();
        Box::pin(async move { store.find(key).await.map_err(Into::into) })
    }

    fn create(&self, division: Division) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create(division).await.map_err(Into::into) })
    }

    fn replace(
        &self,
        division: Division,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace(division, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn delete(&self, key: DivisionKey) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(key).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
