//! MongoDB-backed subscriber store.
//!
//! One document per subscriber in the `users` collection, keyed by a
//! unique index on `user_id`. A cache of known ids keeps repeat
//! `/start` commands and join requests away from the database.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOptions, IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, info, warn};

use super::models::Subscriber;
use super::store::SubscriberStore;
use super::Database;
use crate::cache::{CacheConfig, TypedCache};
use crate::error::StoreResult;

const COLLECTION: &str = "users";

/// Subscriber store backed by a MongoDB collection.
pub struct MongoSubscriberStore {
    collection: Collection<Subscriber>,
    known: TypedCache<u64, ()>,
}

impl MongoSubscriberStore {
    /// Open the store and make sure the unique index exists.
    pub async fn open(db: &Database) -> StoreResult<Self> {
        let collection: Collection<Subscriber> = db.collection(COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index).await?;
        info!("Ensured unique index on {}.user_id", COLLECTION);

        Ok(Self {
            collection,
            known: TypedCache::new("known_subscribers", CacheConfig::known_subscribers()),
        })
    }
}

#[async_trait]
impl SubscriberStore for MongoSubscriberStore {
    async fn save(&self, id: u64, name: Option<&str>) -> StoreResult<bool> {
        if self.known.contains(&id) {
            debug!("Subscriber {} already in {} cache", id, self.known.name());
            return Ok(false);
        }

        let subscriber = Subscriber::new(id, name);
        let mut fields = doc! {
            "user_id": subscriber.user_id,
            "joined_at": subscriber.joined_at,
        };
        if let Some(name) = &subscriber.name {
            fields.insert("name", name.as_str());
        }

        // $setOnInsert leaves an existing record untouched
        let filter = doc! { "user_id": subscriber.user_id };
        let update = doc! { "$setOnInsert": fields };
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection
            .update_one(filter, update)
            .with_options(options)
            .await?;

        self.known.insert(id, ());

        let created = result.upserted_id.is_some();
        debug!("Saved subscriber {} (new: {})", id, created);
        Ok(created)
    }

    async fn list_ids(&self) -> StoreResult<Vec<u64>> {
        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let options = FindOptions::builder()
            .projection(doc! { "user_id": 1, "_id": 0 })
            .build();

        let mut cursor = raw_coll.find(doc! {}).with_options(options).await?;
        let mut ids = Vec::new();

        while let Some(doc) = cursor.try_next().await? {
            if let Some(id) = subscriber_id(&doc) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// Read the subscriber id from a stored document.
///
/// Older collections hold ids that fit in 32 bits as Int32.
fn subscriber_id(doc: &Document) -> Option<u64> {
    match doc.get("user_id") {
        Some(Bson::Int64(id)) => Some(*id as u64),
        Some(Bson::Int32(id)) => Some(*id as u64),
        other => {
            warn!("Skipping subscriber document with user_id {:?}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_id_accepts_both_integer_widths() {
        assert_eq!(subscriber_id(&doc! { "user_id": 7_000_000_000i64 }), Some(7_000_000_000));
        assert_eq!(subscriber_id(&doc! { "user_id": 123_456_789i32 }), Some(123_456_789));
    }

    #[test]
    fn test_subscriber_id_rejects_other_shapes() {
        assert_eq!(subscriber_id(&doc! { "user_id": "123" }), None);
        assert_eq!(subscriber_id(&doc! { "name": "no id" }), None);
    }
}
