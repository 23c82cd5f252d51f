//! Boundary HTTP API client and typed resource models

pub mod client;
pub mod common;
pub mod error;
pub mod pool;

pub mod accounts;
pub mod auth_methods;
pub mod credential_libraries;
pub mod credential_stores;
pub mod credentials;
pub mod groups;
pub mod host_catalogs;
pub mod host_sets;
pub mod hosts;
pub mod managed_groups;
pub mod roles;
pub mod scopes;
pub mod sessions;
pub mod storage_buckets;
pub mod targets;
pub mod users;
pub mod workers;

pub use client::{cancellable, Client};
pub use common::{ApiQueryParams, BoundaryApiResource, ItemMeta, ListResponse, UpdateBody};
pub use error::ApiError;

use serde::Serialize;
use std::marker::PhantomData;

/// CRUD operations on one Boundary collection, e.g. `client.groups()`
pub struct Collection<'a, T> {
    client: &'a Client,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: BoundaryApiResource> Collection<'a, T> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    pub async fn read(&self, id: &str) -> Result<T, ApiError> {
        self.client.get(&T::resource_path(id)).await
    }

    pub async fn create<B: Serialize + Sync + ?Sized>(&self, body: &B) -> Result<T, ApiError> {
        self.client.post(&T::api_path(), body).await
    }

    /// PATCH the object; `body` must carry the version being updated
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.client.patch(&T::resource_path(id), body).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&T::resource_path(id)).await
    }

    /// List the collection. The parent defaults to the client's scope when
    /// `params` does not name one.
    pub async fn list(&self, params: ApiQueryParams) -> Result<Vec<T>, ApiError> {
        let params = match self.client.scope_id() {
            Some(scope_id) if !params.contains(T::PARENT_PARAM) => {
                params.add(T::PARENT_PARAM, scope_id)
            }
            _ => params,
        };
        let response: ListResponse<T> = self
            .client
            .get_with_params(&T::api_path(), &params)
            .await?;
        Ok(response.items)
    }

    /// Custom method on a single object, e.g. `:set-members`
    pub async fn action<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        action: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.client.post(&T::action_path(id, action), body).await
    }

    /// Custom method on the collection, e.g. `/v1/workers:create:worker-led`
    pub async fn collection_action<B: Serialize + Sync + ?Sized>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.client
            .post(&format!("{}:{}", T::api_path(), action), body)
            .await
    }
}
