//! In-process stand-in for the InfluxDB v2 API.
//!
//! Behaves like the server for the operations the provider uses: it assigns
//! ids and timestamps, rejects duplicate names, applies PATCH semantics on
//! update, and cascades organization deletes to their buckets. Used by the
//! lifecycle tests and by anything that wants to drive the provider without a
//! running database.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{Bucket, BucketType, Organization, OrganizationStatus, SchemaType};
use super::{BucketsApi, ClientError, OrganizationsApi};

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    orgs: BTreeMap<String, Organization>,
    buckets: BTreeMap<String, Bucket>,
}

impl Store {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:016x}", self.next_id)
    }
}

/// Thread-safe in-memory InfluxDB.
#[derive(Debug, Default)]
pub struct MemoryClient {
    store: Mutex<Store>,
}

impl MemoryClient {
    /// Create an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All stored organizations, ordered by id.
    pub fn organizations(&self) -> Vec<Organization> {
        self.lock().orgs.values().cloned().collect()
    }

    /// All stored buckets, ordered by id.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.lock().buckets.values().cloned().collect()
    }
}

fn org_not_found() -> ClientError {
    ClientError::NotFound("organization not found".to_string())
}

fn bucket_not_found() -> ClientError {
    ClientError::NotFound("bucket not found".to_string())
}

fn check_rules(bucket: &Bucket) -> Result<(), ClientError> {
    if let Some(rule) = bucket.retention_rules.iter().find(|r| r.every_seconds < 0) {
        return Err(ClientError::Invalid(format!(
            "retention rule every seconds must be non-negative, got {}",
            rule.every_seconds
        )));
    }
    Ok(())
}

#[async_trait]
impl OrganizationsApi for MemoryClient {
    async fn create_organization(&self, org: &Organization) -> Result<Organization, ClientError> {
        if org.name.is_empty() {
            return Err(ClientError::Invalid("org name is empty".to_string()));
        }

        let mut store = self.lock();
        if store.orgs.values().any(|o| o.name == org.name) {
            return Err(ClientError::Conflict(format!(
                "organization with name {} already exists",
                org.name
            )));
        }

        let now = Utc::now();
        let created = Organization {
            id: Some(store.allocate_id()),
            name: org.name.clone(),
            description: org.description.clone(),
            status: Some(OrganizationStatus::Active),
            created_at: Some(now),
            updated_at: Some(now),
        };
        if let Some(id) = &created.id {
            store.orgs.insert(id.clone(), created.clone());
        }
        Ok(created)
    }

    async fn find_organization_by_id(&self, id: &str) -> Result<Organization, ClientError> {
        self.lock().orgs.get(id).cloned().ok_or_else(org_not_found)
    }

    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, ClientError> {
        self.lock()
            .orgs
            .values()
            .find(|o| o.name == name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("organization '{}' not found", name)))
    }

    async fn update_organization(&self, org: &Organization) -> Result<Organization, ClientError> {
        let id = org
            .id
            .as_deref()
            .ok_or_else(|| ClientError::Invalid("organization id is required".to_string()))?;

        let mut store = self.lock();
        if store
            .orgs
            .values()
            .any(|o| o.name == org.name && o.id.as_deref() != Some(id))
        {
            return Err(ClientError::Conflict(format!(
                "organization with name {} already exists",
                org.name
            )));
        }

        let stored = store.orgs.get_mut(id).ok_or_else(org_not_found)?;
        stored.name = org.name.clone();
        if org.description.is_some() {
            stored.description = org.description.clone();
        }
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete_organization_with_id(&self, id: &str) -> Result<(), ClientError> {
        let mut store = self.lock();
        store.orgs.remove(id).ok_or_else(org_not_found)?;
        store
            .buckets
            .retain(|_, bucket| bucket.org_id.as_deref() != Some(id));
        Ok(())
    }
}

#[async_trait]
impl BucketsApi for MemoryClient {
    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError> {
        if bucket.name.is_empty() {
            return Err(ClientError::Invalid("bucket name is empty".to_string()));
        }
        check_rules(bucket)?;

        let mut store = self.lock();
        let org_id = match bucket.org_id.as_deref() {
            Some(org_id) if store.orgs.contains_key(org_id) => org_id.to_string(),
            _ => return Err(org_not_found()),
        };
        if store
            .buckets
            .values()
            .any(|b| b.name == bucket.name && b.org_id.as_deref() == Some(org_id.as_str()))
        {
            return Err(ClientError::Conflict(format!(
                "bucket with name {} already exists",
                bucket.name
            )));
        }

        let now = Utc::now();
        let created = Bucket {
            id: Some(store.allocate_id()),
            bucket_type: Some(BucketType::User),
            name: bucket.name.clone(),
            description: bucket.description.clone(),
            org_id: Some(org_id),
            rp: bucket.rp.clone(),
            schema_type: Some(SchemaType::Implicit),
            created_at: Some(now),
            updated_at: Some(now),
            retention_rules: bucket.retention_rules.clone(),
        };
        if let Some(id) = &created.id {
            store.buckets.insert(id.clone(), created.clone());
        }
        Ok(created)
    }

    async fn find_bucket_by_id(&self, id: &str) -> Result<Bucket, ClientError> {
        self.lock().buckets.get(id).cloned().ok_or_else(bucket_not_found)
    }

    async fn update_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError> {
        let id = bucket
            .id
            .as_deref()
            .ok_or_else(|| ClientError::Invalid("bucket id is required".to_string()))?;
        check_rules(bucket)?;

        let mut store = self.lock();
        let stored = store.buckets.get_mut(id).ok_or_else(bucket_not_found)?;
        // PATCH body carries name, description and retention rules only.
        stored.name = bucket.name.clone();
        if bucket.description.is_some() {
            stored.description = bucket.description.clone();
        }
        stored.retention_rules = bucket.retention_rules.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete_bucket_with_id(&self, id: &str) -> Result<(), ClientError> {
        self.lock()
            .buckets
            .remove(id)
            .map(|_| ())
            .ok_or_else(bucket_not_found)
    }
}
