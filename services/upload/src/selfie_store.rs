use crate::config::DatabaseConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors raised by the selfie store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Insert returned a non-ObjectId identifier: {0}")]
    UnexpectedId(String),
}

/// A validated selfie ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSelfie {
    /// Trimmed, non-empty name
    pub name: String,
    /// Base64 encoded image payload
    pub image: String,
}

impl NewSelfie {
    /// Build a record from a name and the raw image bytes.
    ///
    /// The caller has already checked that both are non-empty.
    pub fn new(name: &str, image: &[u8]) -> Self {
        Self {
            name: name.trim().to_string(),
            image: STANDARD.encode(image),
        }
    }
}

/// Stored selfie document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfieRecord {
    /// Database-assigned identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Person's name
    pub name: String,
    /// Base64 image
    pub image: String,
}

impl From<NewSelfie> for SelfieRecord {
    fn from(selfie: NewSelfie) -> Self {
        Self {
            id: None,
            name: selfie.name,
            image: selfie.image,
        }
    }
}

/// Persistence seam for selfie records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SelfieRepository: Send + Sync {
    /// Insert one record and return its generated id as a hex string
    async fn insert(&self, selfie: NewSelfie) -> Result<String, StoreError>;

    /// Round-trip to the backend to check connectivity
    async fn ping(&self) -> Result<(), StoreError>;
}

/// MongoDB-backed selfie store
pub struct MongoSelfieStore {
    database: Database,
    selfies: Collection<SelfieRecord>,
}

impl MongoSelfieStore {
    /// Connect to MongoDB and verify the server is reachable.
    ///
    /// The driver connects lazily, so a ping is issued here to surface a bad
    /// connection string or unreachable server before the API starts.
    pub async fn connect(config: &DatabaseConfig, app_name: &str) -> Result<Self, StoreError> {
        let timeout = config.connect_timeout();

        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(app_name.to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.name);
        let selfies = database.collection::<SelfieRecord>(&config.collection);

        let store = Self { database, selfies };
        store.ping().await?;

        info!(
            database = %config.name,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(store)
    }
}

#[async_trait]
impl SelfieRepository for MongoSelfieStore {
    #[instrument(skip(self, selfie), fields(name = %selfie.name, image_len = selfie.image.len()))]
    async fn insert(&self, selfie: NewSelfie) -> Result<String, StoreError> {
        let result = self.selfies.insert_one(SelfieRecord::from(selfie), None).await?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::UnexpectedId(result.inserted_id.to_string()))?
            .to_hex();

        debug!(id = %id, "Selfie inserted");
        metrics::counter!("upload.records.inserted").increment(1);

        Ok(id)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_selfie_trims_name_and_encodes_image() {
        let selfie = NewSelfie::new("  Alice \n", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);

        assert_eq!(selfie.name, "Alice");
        assert_eq!(selfie.image, "AAECAwQFBgcICQ==");
    }

    #[test]
    fn test_record_serializes_without_id_before_insert() {
        let record = SelfieRecord::from(NewSelfie::new("Bob", b"jpeg"));
        let document = mongodb::bson::to_document(&record).unwrap();

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("name").unwrap(), "Bob");
        assert_eq!(document.get_str("image").unwrap(), "anBlZw==");
    }

    #[test]
    fn test_record_reads_back_object_id() {
        let id = ObjectId::new();
        let document = doc! { "_id": id, "name": "Carol", "image": "AA==" };

        let record: SelfieRecord = mongodb::bson::from_document(document).unwrap();
        assert_eq!(record.id, Some(id));
        assert_eq!(record.name, "Carol");
    }
}
