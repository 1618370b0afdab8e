//! News command handlers: the shared entity commands plus published
//! listing and view recording.

use kampus_api::{BlobStorage, CollectionGateway};
use kampus_core::stream::NewsFilter;
use kampus_core::{EntityId, News, OptimisticOutcome, StoreContext};
use serde_json::json;
use tracing::debug;

use crate::cli::{GlobalOpts, NewsArgs, NewsCommand};
use crate::error::CliError;
use crate::output;

use super::{entities, kinds};

pub async fn handle<G: CollectionGateway, S: BlobStorage>(
    ctx: &StoreContext<G>,
    storage: &S,
    args: NewsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NewsCommand::Entity(cmd) => entities::handle::<News, G, S>(ctx, storage, cmd, global).await,

        NewsCommand::Published(list) => {
            kinds::check_type_flag::<News>(&list)?;
            let store = ctx.news()?;
            store.refresh().await?;
            let category = list
                .category
                .clone()
                .map_or(NewsFilter::All, NewsFilter::ByCategory);
            let items = store
                .published()
                .into_iter()
                .filter(|n| category.matches(n))
                .collect();
            entities::print_list(kinds::search(items, list.search.as_ref()), &list, global)
        }

        NewsCommand::View { id } => {
            let store = ctx.news()?;
            store.refresh().await?;

            let id = EntityId::from(id);
            let outcome =
                store
                    .increment_view_count(&id)
                    .await
                    .ok_or_else(|| CliError::NotFound {
                        resource_type: "news article".into(),
                        identifier: id.to_string(),
                        list_command: "news list".into(),
                    })?;

            match outcome {
                OptimisticOutcome::Committed { attempts } => {
                    let views = store.find_by_id(&id).map_or(0, |n| n.views);
                    debug!(%id, attempts, views, "view recorded");
                    let record = json!({ "id": id, "views": views });
                    let out = output::render_single(
                        &global.output,
                        &record,
                        |_| vec![("ID", id.to_string()), ("Views", views.to_string())],
                        |_| views.to_string(),
                    )?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                OptimisticOutcome::RolledBack { error, .. }
                | OptimisticOutcome::KeptLocal { error, .. }
                | OptimisticOutcome::Superseded { error, .. } => Err(error.into()),
            }
        }
    }
}
