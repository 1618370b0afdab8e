//! Generic list / get / add / update / delete handler, shared by every kind.
//!
//! Each invocation re-reads the kind's collection first, so lookups see what
//! the service holds now. Writes go through the store, which re-reads the
//! collection again once the service has accepted them.

use std::sync::Arc;

use kampus_api::{BlobStorage, CollectionGateway};
use kampus_core::{CleanupOutcome, Entity, EntityStore, StoreContext, WriteMode};
use tracing::debug;

use crate::cli::{EntityCommand, GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::kinds::{self, CliEntity};
use super::util;

pub async fn handle<E, G, S>(
    ctx: &StoreContext<G>,
    storage: &S,
    cmd: EntityCommand,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    E: CliEntity,
    G: CollectionGateway,
    S: BlobStorage,
{
    let store = ctx.store::<E>()?;
    store.refresh().await?;
    debug!(kind = %E::KIND, count = store.snapshot().len(), "collection loaded");

    match cmd {
        EntityCommand::List(list) => {
            kinds::check_type_flag::<E>(&list)?;
            let items = E::narrow(&store, &list)?;
            print_list(items, &list, global)
        }

        EntityCommand::Get { key } => {
            let item = find(&store, &E::Key::from(key))?;
            print_detail(item.as_ref(), global)
        }

        EntityCommand::Add(payload) => {
            let draft: E::Draft = util::read_payload(&payload)?;
            store.add(&draft).await?;
            output::success(global, &format!("{} created", E::NOUN));
            Ok(())
        }

        EntityCommand::Update { key, payload } => {
            let key = E::Key::from(key);
            // Upsert kinds create missing rows; the rest must exist.
            if E::WRITE_MODE == WriteMode::ById {
                find(&store, &key)?;
            }
            let patch: E::Patch = util::read_payload(&payload)?;
            store.update(&key, &patch).await?;
            output::success(global, &format!("{} '{key}' updated", E::NOUN));
            match store.find_by_id(&key) {
                Some(item) => print_detail(item.as_ref(), global),
                None => Ok(()),
            }
        }

        EntityCommand::Delete { key, purge_blob } => {
            let key = E::Key::from(key);
            find(&store, &key)?;
            let prompt = format!("Delete {} '{key}'?", E::NOUN);
            if !util::confirm(&prompt, "delete", global.yes)? {
                return Ok(());
            }

            if !purge_blob {
                store.delete(&key).await?;
                output::success(global, &format!("{} '{key}' deleted", E::NOUN));
                return Ok(());
            }

            match E::delete_purging(&store, storage, &key).await? {
                CleanupOutcome::Removed { paths } => output::success(
                    global,
                    &format!(
                        "{} '{key}' deleted, {} file(s) removed",
                        E::NOUN,
                        paths.len()
                    ),
                ),
                CleanupOutcome::Skipped => output::success(
                    global,
                    &format!("{} '{key}' deleted, no files to remove", E::NOUN),
                ),
                CleanupOutcome::Orphaned { paths, error } => {
                    output::success(global, &format!("{} '{key}' deleted", E::NOUN));
                    output::warning(
                        global,
                        &format!("files left in storage ({error}): {}", paths.join(", ")),
                    );
                }
            }
            Ok(())
        }
    }
}

/// Look `key` up in the cached listing.
pub fn find<E: CliEntity, G: CollectionGateway>(
    store: &EntityStore<E, G>,
    key: &E::Key,
) -> Result<Arc<E>, CliError> {
    store.find_by_id(key).ok_or_else(|| CliError::NotFound {
        resource_type: E::NOUN.into(),
        identifier: key.to_string(),
        list_command: format!("{} list", E::COMMAND),
    })
}

/// Apply `--filter` / `--limit` and print in the selected format.
pub fn print_list<E: CliEntity>(
    items: Vec<Arc<E>>,
    list: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let items = util::apply_list_args(items, list)?;
    let out = output::render_list(
        &global.output,
        &items,
        |e| e.row(),
        |e| e.key().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn print_detail<E: CliEntity>(item: &E, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, item, E::detail, |e| e.key().to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
