use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::{
    constants::validation,
    errors::AppError,
    features::cache::{CacheStats, TtlCache},
};

use super::{
    model::{
        CreateOrganization, Organization, Platform, SocialConnection, SocialConnectionView,
        UpdateOrganization, UpsertConnection, slugify,
    },
    repository::Repository,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TenantCacheStats {
    pub organizations: CacheStats,
    pub connections: CacheStats,
}

/// Tenant operations with cache-aside reads over a [`Repository`].
pub struct TenantService {
    repository: Arc<dyn Repository>,
    organizations: TtlCache<Organization>,
    connections: TtlCache<Vec<SocialConnection>>,
}

fn organization_key(id: Uuid) -> String {
    format!("organization:{}", id)
}

fn connections_key(id: Uuid) -> String {
    format!("connections:{}", id)
}

fn organization_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("organization {} not found", id))
}

fn connection_not_found(organization_id: Uuid, platform: Platform) -> AppError {
    AppError::NotFound(format!("no {} connection for organization {}", platform, organization_id))
}

impl TenantService {
    pub fn new(repository: Arc<dyn Repository>, ttl: Duration) -> Self {
        Self {
            repository,
            organizations: TtlCache::new("organizations", ttl),
            connections: TtlCache::new("connections", ttl),
        }
    }

    pub async fn create_organization(&self, input: CreateOrganization) -> Result<Organization, AppError> {
        let (name, slug) = validate_organization_name(&input.name)?;
        let organization = self.repository.create_organization(name, slug).await?;
        self.organizations
            .set(organization_key(organization.id), organization.clone());
        tracing::info!(organization_id = %organization.id, slug = %organization.slug, "Organization created");
        Ok(organization)
    }

    pub async fn get_organization(&self, id: Uuid) -> Result<Organization, AppError> {
        let repository = self.repository.clone();
        self.organizations
            .get_or_set(&organization_key(id), || async move {
                repository
                    .get_organization(id)
                    .await?
                    .ok_or_else(|| organization_not_found(id))
            })
            .await
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        self.repository.list_organizations().await
    }

    pub async fn update_organization(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> Result<Organization, AppError> {
        let (name, slug) = validate_organization_name(&input.name)?;
        let organization = self
            .repository
            .update_organization(id, name, slug)
            .await?
            .ok_or_else(|| organization_not_found(id))?;
        // Invalidate after the write so in-flight loads of the old row are dropped.
        self.organizations.delete(&organization_key(id));
        self.organizations.set(organization_key(id), organization.clone());
        Ok(organization)
    }

    pub async fn delete_organization(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self.repository.delete_organization(id).await?;
        self.organizations.delete(&organization_key(id));
        self.connections.delete(&connections_key(id));
        if !deleted {
            return Err(organization_not_found(id));
        }
        tracing::info!(organization_id = %id, "Organization deleted");
        Ok(())
    }

    pub async fn list_connections(&self, organization_id: Uuid) -> Result<Vec<SocialConnectionView>, AppError> {
        let connections = self.cached_connections(organization_id).await?;
        let now = Utc::now();
        Ok(connections
            .into_iter()
            .map(|connection| SocialConnectionView::at(connection, now))
            .collect())
    }

    pub async fn get_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
    ) -> Result<SocialConnectionView, AppError> {
        self.get_organization(organization_id).await?;

        let connection = match self.connections.get(&connections_key(organization_id)) {
            Some(cached) => cached.into_iter().find(|c| c.platform == platform),
            None => self.repository.get_connection(organization_id, platform).await?,
        };
        connection
            .map(|connection| SocialConnectionView::at(connection, Utc::now()))
            .ok_or_else(|| connection_not_found(organization_id, platform))
    }

    pub async fn upsert_connection(
        &self,
        organization_id: Uuid,
        platform: Platform,
        input: UpsertConnection,
    ) -> Result<SocialConnectionView, AppError> {
        let input = validate_connection(input)?;
        let connection = self
            .repository
            .upsert_connection(organization_id, platform, input)
            .await?;
        self.connections.delete(&connections_key(organization_id));
        tracing::info!(organization_id = %organization_id, platform = %platform, "Social connection stored");
        Ok(SocialConnectionView::at(connection, Utc::now()))
    }

    pub async fn delete_connection(&self, organization_id: Uuid, platform: Platform) -> Result<(), AppError> {
        let deleted = self
            .repository
            .delete_connection(organization_id, platform)
            .await?;
        self.connections.delete(&connections_key(organization_id));
        if !deleted {
            return Err(connection_not_found(organization_id, platform));
        }
        tracing::info!(organization_id = %organization_id, platform = %platform, "Social connection removed");
        Ok(())
    }

    pub fn cache_stats(&self) -> TenantCacheStats {
        TenantCacheStats {
            organizations: self.organizations.stats(),
            connections: self.connections.stats(),
        }
    }

    /// Drops expired entries from both caches; returns the total removed.
    pub fn purge_expired(&self) -> usize {
        self.organizations.purge_expired() + self.connections.purge_expired()
    }

    async fn cached_connections(&self, organization_id: Uuid) -> Result<Vec<SocialConnection>, AppError> {
        // 404 for unknown tenants rather than an empty list
        self.get_organization(organization_id).await?;

        let repository = self.repository.clone();
        self.connections
            .get_or_set(&connections_key(organization_id), || async move {
                repository.list_connections(organization_id).await
            })
            .await
    }
}

fn validate_organization_name(raw: &str) -> Result<(String, String), AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("organization name is required".into()));
    }
    if name.chars().count() > validation::MAX_ORGANIZATION_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "organization name must be at most {} characters",
            validation::MAX_ORGANIZATION_NAME_LENGTH
        )));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "organization name must contain at least one letter or digit".into(),
        ));
    }
    Ok((name.to_string(), slug))
}

fn validate_connection(mut input: UpsertConnection) -> Result<UpsertConnection, AppError> {
    input.account_id = input.account_id.trim().to_string();
    if input.account_id.is_empty() {
        return Err(AppError::Validation("account_id is required".into()));
    }
    if input.access_token.trim().is_empty() {
        return Err(AppError::Validation("access_token is required".into()));
    }

    input.account_name = input
        .account_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    if let Some(name) = &input.account_name {
        if name.chars().count() > validation::MAX_ACCOUNT_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "account_name must be at most {} characters",
                validation::MAX_ACCOUNT_NAME_LENGTH
            )));
        }
    }

    if let Some(raw) = &input.profile_url {
        let url = Url::parse(raw)
            .map_err(|e| AppError::Validation(format!("profile_url is not a valid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation("profile_url must be an http(s) URL".into()));
        }
        input.profile_url = Some(url.to_string());
    }
    Ok(input)
}
