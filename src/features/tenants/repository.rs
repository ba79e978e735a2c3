use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;

use super::model::{Organization, Platform, SocialConnection, UpsertConnection};

/// Persistence seam for tenant data.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_organization(&self, name: String, slug: String) -> Result<Organization, AppError>;
    async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError>;
    async fn list_organizations(&self) -> Result<Vec<Organization>, AppError>;
    async fn update_organization(
        &self,
        id: Uuid,
        name: String,
        slug: String,
    ) -> Result<Option<Organization>, AppError>;
    /// Also removes the organization's social connections.
    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError>;

    async fn upsert_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
        input: UpsertConnection,
    ) -> Result<SocialConnection, AppError>;
    async fn get_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, AppError>;
    async fn list_connections(&self, organization_id: Uuid) -> Result<Vec<SocialConnection>, AppError>;
    async fn delete_connection(&self, organization_id: Uuid, platform: Platform) -> Result<bool, AppError>;
}

#[derive(Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    connections: HashMap<(Uuid, Platform), SocialConnection>,
}

/// Single-lock in-memory store; slug uniqueness and cascades are atomic.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slug_taken(tables: &Tables, slug: &str, except: Option<Uuid>) -> bool {
    tables
        .organizations
        .values()
        .any(|org| org.slug == slug && Some(org.id) != except)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_organization(&self, name: String, slug: String) -> Result<Organization, AppError> {
        let mut tables = self.tables.write().await;
        if slug_taken(&tables, &slug, None) {
            return Err(AppError::Conflict(format!("organization slug '{}' is already taken", slug)));
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name,
            slug,
            created_at: now,
            updated_at: now,
        };
        tables.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.tables.read().await.organizations.get(&id).cloned())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        let tables = self.tables.read().await;
        let mut organizations: Vec<_> = tables.organizations.values().cloned().collect();
        organizations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.slug.cmp(&b.slug)));
        Ok(organizations)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        name: String,
        slug: String,
    ) -> Result<Option<Organization>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.contains_key(&id) {
            return Ok(None);
        }
        if slug_taken(&tables, &slug, Some(id)) {
            return Err(AppError::Conflict(format!("organization slug '{}' is already taken", slug)));
        }

        let Some(organization) = tables.organizations.get_mut(&id) else {
            return Ok(None);
        };
        organization.name = name;
        organization.slug = slug;
        organization.updated_at = Utc::now();
        Ok(Some(organization.clone()))
    }

    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.organizations.remove(&id).is_none() {
            return Ok(false);
        }
        tables.connections.retain(|(org_id, _), _| *org_id != id);
        Ok(true)
    }

    async fn upsert_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
        input: UpsertConnection,
    ) -> Result<SocialConnection, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.contains_key(&organization_id) {
            return Err(AppError::NotFound(format!("organization {} not found", organization_id)));
        }

        let now = Utc::now();
        let connected_at = tables
            .connections
            .get(&(organization_id, platform))
            .map(|existing| existing.connected_at)
            .unwrap_or(now);

        let connection = SocialConnection {
            organization_id,
            platform,
            account_id: input.account_id,
            account_name: input.account_name,
            profile_url: input.profile_url,
            access_token: input.access_token,
            token_expires_at: input.token_expires_at,
            connected_at,
            updated_at: now,
        };
        tables
            .connections
            .insert((organization_id, platform), connection.clone());
        Ok(connection)
    }

    async fn get_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .connections
            .get(&(organization_id, platform))
            .cloned())
    }

    async fn list_connections(&self, organization_id: Uuid) -> Result<Vec<SocialConnection>, AppError> {
        let tables = self.tables.read().await;
        let mut connections: Vec<_> = Platform::ALL
            .iter()
            .filter_map(|platform| tables.connections.get(&(organization_id, *platform)).cloned())
            .collect();
        connections.sort_by_key(|c| c.platform.as_str());
        Ok(connections)
    }

    async fn delete_connection(&self, organization_id: Uuid, platform: Platform) -> Result<bool, AppError> {
        Ok(self
            .tables
            .write()
            .await
            .connections
            .remove(&(organization_id, platform))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(account: &str, token: &str) -> UpsertConnection {
        UpsertConnection {
            account_id: account.to_string(),
            account_name: None,
            profile_url: None,
            access_token: token.to_string(),
            token_expires_at: None,
        }
    }

    #[tokio::test]
    async fn slugs_are_unique() {
        let repo = InMemoryRepository::new();
        repo.create_organization("Acme".into(), "acme".into()).await.unwrap();
        let err = repo
            .create_organization("ACME".into(), "acme".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn renaming_to_own_slug_is_allowed() {
        let repo = InMemoryRepository::new();
        let org = repo.create_organization("Acme".into(), "acme".into()).await.unwrap();
        let updated = repo
            .update_organization(org.id, "ACME".into(), "acme".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "ACME");
        assert!(updated.updated_at >= org.updated_at);
    }

    #[tokio::test]
    async fn upsert_keeps_connected_at_and_replaces_token() {
        let repo = InMemoryRepository::new();
        let org = repo.create_organization("Acme".into(), "acme".into()).await.unwrap();

        let first = repo
            .upsert_connection(org.id, Platform::Instagram, token("ig-1", "t1"))
            .await
            .unwrap();
        let second = repo
            .upsert_connection(org.id, Platform::Instagram, token("ig-2", "t2"))
            .await
            .unwrap();

        assert_eq!(first.connected_at, second.connected_at);
        assert_eq!(second.access_token, "t2");
        assert_eq!(repo.list_connections(org.id).await.unwrap().len(), 1);

        let stored = repo
            .get_connection(org.id, Platform::Instagram)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.account_id, "ig-2");
        assert!(repo.get_connection(org.id, Platform::TikTok).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_requires_existing_organization() {
        let repo = InMemoryRepository::new();
        let err = repo
            .upsert_connection(Uuid::new_v4(), Platform::TikTok, token("tt", "t"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_organization_cascades_to_connections() {
        let repo = InMemoryRepository::new();
        let acme = repo.create_organization("Acme".into(), "acme".into()).await.unwrap();
        let globex = repo.create_organization("Globex".into(), "globex".into()).await.unwrap();
        repo.upsert_connection(acme.id, Platform::Facebook, token("fb", "t")).await.unwrap();
        repo.upsert_connection(globex.id, Platform::Facebook, token("fb", "t")).await.unwrap();

        assert!(repo.delete_organization(acme.id).await.unwrap());
        assert!(!repo.delete_organization(acme.id).await.unwrap());
        assert!(repo.list_connections(acme.id).await.unwrap().is_empty());
        assert_eq!(repo.list_connections(globex.id).await.unwrap().len(), 1);
    }
}
