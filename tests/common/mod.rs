#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use collab_admin::app::{self, AppState};
use collab_admin::auth::{generate_jwt, Claims};
use collab_admin::client::{AdministrativeClient, LocalClient, RemoteClient};
use collab_admin::database::models::{Role, ServiceSettings, User};
use collab_admin::database::{MemoryStore, Store};
use collab_admin::services::{AdminService, Caller};

/// An in-process API server over a fresh memory store, seeded with one
/// system admin and two ordinary users
pub struct TestEnv {
    pub base_url: String,
    pub service: Arc<AdminService>,
    pub store: Arc<MemoryStore>,
    /// system_admin
    pub admin: User,
    /// system_user only
    pub basic: User,
    /// system_user + system_user_access_token
    pub holder: User,
    server: JoinHandle<()>,
}

impl TestEnv {
    pub async fn start() -> Result<Self> {
        Self::start_with(true).await
    }

    pub async fn start_with(tokens_enabled: bool) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(AdminService::new(
            store.clone(),
            ServiceSettings {
                enable_user_access_tokens: tokens_enabled,
            },
        ));

        let admin = User::new("admin@example.com", "admin", vec![Role::SystemAdmin, Role::SystemUser]);
        let basic = User::new("basic@example.com", "basic", vec![Role::SystemUser]);
        let holder = User::new(
            "holder@example.com",
            "holder",
            vec![Role::SystemUser, Role::SystemUserAccessToken],
        );
        for user in [&admin, &basic, &holder] {
            service.create_user(&Caller::Local, user.clone()).await?;
        }

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let state = AppState::new(service.clone());
        let server = tokio::spawn(async move {
            let _ = app::serve(listener, state).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            service,
            store,
            admin,
            basic,
            holder,
            server,
        })
    }

    pub fn session_for(&self, user: &User) -> Result<String> {
        Ok(generate_jwt(&Claims::for_user(user))?)
    }

    pub fn remote_as(&self, user: &User) -> Result<RemoteClient> {
        Ok(RemoteClient::new(&self.base_url, Some(self.session_for(user)?))?)
    }

    pub fn local(&self) -> LocalClient {
        LocalClient::new(self.service.clone())
    }

    pub fn local_as(&self, user: &User) -> LocalClient {
        LocalClient::with_caller(self.service.clone(), Caller::for_user(user))
    }

    /// The privileged clients every scenario runs against: the system admin
    /// over HTTP and the local channel
    pub fn admin_clients(&self) -> Result<Vec<(&'static str, Box<dyn AdministrativeClient>)>> {
        Ok(vec![
            ("remote", Box::new(self.remote_as(&self.admin)?) as Box<dyn AdministrativeClient>),
            ("local", Box::new(self.local())),
        ])
    }

    /// The same user reached over HTTP and in-process
    pub fn clients_as(&self, user: &User) -> Result<Vec<(&'static str, Box<dyn AdministrativeClient>)>> {
        Ok(vec![
            ("remote", Box::new(self.remote_as(user)?) as Box<dyn AdministrativeClient>),
            ("local", Box::new(self.local_as(user))),
        ])
    }

    pub async fn token_count(&self, user: &User) -> Result<usize> {
        Ok(self.store.list_access_tokens_for_user(user.id, 0, 1000).await?.len())
    }

    pub async fn seed_token(&self, user: &User, description: &str) -> Result<String> {
        let token = self
            .service
            .create_user_access_token(&Caller::Local, user.id, description)
            .await?;
        Ok(token.id)
    }

    pub async fn set_tokens_enabled(&self, enabled: bool) -> Result<()> {
        self.store
            .save_settings(&ServiceSettings {
                enable_user_access_tokens: enabled,
            })
            .await?;
        Ok(())
    }

    pub fn http(&self) -> reqwest::Client {
        reqwest::Client::new()
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.server.abort();
    }
}
