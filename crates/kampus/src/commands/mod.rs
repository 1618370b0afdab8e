//! Command dispatch: bridges CLI args -> entity stores -> output formatting.

pub mod config_cmd;
pub mod entities;
pub mod kinds;
pub mod news;
pub mod sections;
pub mod util;

use std::sync::Arc;

use kampus_api::{BlobStorage, CollectionGateway, RestClient, StorageClient};
use kampus_core::{
    AcademicSection, Achievement, CoreError, Document, GalleryItem, StoreContext, StoreRegistry,
    Student, Teacher, Video,
};
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config::Connection;
use crate::error::CliError;

/// Gateways and the store registry for one invocation.
pub struct Session {
    registry: StoreRegistry<RestClient>,
    storage: StorageClient,
}

impl Session {
    /// Build the REST gateway, storage client, and registry. Nothing is
    /// fetched yet; each command refreshes the stores it reads.
    pub fn open(conn: Connection) -> Result<Self, CliError> {
        let gateway =
            RestClient::new(&conn.url, &conn.api_key, &conn.transport).map_err(CoreError::from)?;
        let storage = StorageClient::new(&conn.url, conn.bucket, &conn.api_key, &conn.transport)
            .map_err(CoreError::from)?;
        debug!(profile = %conn.profile_name, "session opened");

        Ok(Self {
            registry: StoreRegistry::new(Arc::new(gateway), conn.registry),
            storage,
        })
    }

    pub fn context(&self) -> StoreContext<RestClient> {
        self.registry.context()
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    pub async fn close(self) {
        self.registry.shutdown().await;
    }
}

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch<G, S>(
    cmd: Command,
    ctx: &StoreContext<G>,
    storage: &S,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    G: CollectionGateway,
    S: BlobStorage,
{
    match cmd {
        Command::News(args) => news::handle(ctx, storage, args, global).await,
        Command::Sections(args) => sections::handle(ctx, storage, args, global).await,
        Command::Gallery(args) => {
            entities::handle::<GalleryItem, G, S>(ctx, storage, args.command, global).await
        }
        Command::Achievements(args) => {
            entities::handle::<Achievement, G, S>(ctx, storage, args.command, global).await
        }
        Command::Documents(args) => {
            entities::handle::<Document, G, S>(ctx, storage, args.command, global).await
        }
        Command::Students(args) => {
            entities::handle::<Student, G, S>(ctx, storage, args.command, global).await
        }
        Command::Teachers(args) => {
            entities::handle::<Teacher, G, S>(ctx, storage, args.command, global).await
        }
        Command::Academic(args) => {
            entities::handle::<AcademicSection, G, S>(ctx, storage, args.command, global).await
        }
        Command::Videos(args) => {
            entities::handle::<Video, G, S>(ctx, storage, args.command, global).await
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions do not need a session".into(),
        )),
    }
}
