//! Provider data structure passed to resources and data sources

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::api::{ApiError, Client};
use crate::config::{Credentials, ProviderSettings};

/// Shared by every resource and data source of one configured provider.
///
/// The authenticated client is built on first use, so a password login only
/// happens when a resource actually talks to Boundary.
#[derive(Clone)]
pub struct BoundaryProviderData {
    settings: Arc<ProviderSettings>,
    client: Arc<OnceCell<Client>>,
}

impl BoundaryProviderData {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            client: Arc::new(OnceCell::new()),
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// The authenticated client, logging in on first call
    pub async fn client(&self) -> Result<Client, ApiError> {
        let client = self
            .client
            .get_or_try_init(|| connect(&self.settings))
            .await?;
        Ok(client.clone())
    }
}

async fn connect(settings: &ProviderSettings) -> Result<Client, ApiError> {
    let client = Client::new(&settings.addr, settings.tls_insecure)?;
    match &settings.credentials {
        Credentials::Token(token) => Ok(client.with_token(token)),
        Credentials::Password {
            auth_method_id,
            login_name,
            password,
        } => {
            let token = client
                .authenticate(auth_method_id, login_name, password)
                .await?;
            info!(auth_method_id = %auth_method_id, "authenticated with Boundary");
            Ok(client.with_token(&token))
        }
    }
}
