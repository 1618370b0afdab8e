//! Content section handlers: the shared entity commands plus `set`.

use kampus_api::{BlobStorage, CollectionGateway};
use kampus_core::{ContentSection, StoreContext};

use crate::cli::{GlobalOpts, SectionsArgs, SectionsCommand};
use crate::error::CliError;
use crate::output;

use super::entities;

pub async fn handle<G: CollectionGateway, S: BlobStorage>(
    ctx: &StoreContext<G>,
    storage: &S,
    args: SectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SectionsCommand::Entity(cmd) => {
            entities::handle::<ContentSection, G, S>(ctx, storage, cmd, global).await
        }

        SectionsCommand::Set {
            key,
            content,
            title,
        } => {
            let store = ctx.content_sections()?;
            store.refresh().await?;
            let existed = store.section(&key).is_some();

            store.upsert_section(&key, content, title).await?;

            let verb = if existed { "updated" } else { "created" };
            output::success(global, &format!("section '{key}' {verb}"));
            match store.section(&key) {
                Some(section) => entities::print_detail(section.as_ref(), global),
                None => Ok(()),
            }
        }
    }
}
