use core::convert::TryFrom;

use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use tracing::Instrument;

use super::converters::{convert_404_or, convert_model_err, convert_repo_err, to_bool};
use super::Result as RepoResult;
use crate::utils::LetChain;

pub async fn initialize_coll(
    coll_name: impl Into<Bson>,
    indexes: Vec<Document>,
    db: &Database,
) -> MongoResult<()> {
    if indexes.is_empty() {
        return Ok(());
    }

    db.run_command(
        doc! {
            "createIndexes": coll_name.into(),
            "indexes": indexes,
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub fn index(name: &str, key: Document) -> Document {
    doc! {
        "name": name,
        "key": key,
    }
}

/// Resume strictly after the row `(created, id)` in `created desc, _id desc` order.
pub fn after_filter(created: i64, id: impl Into<Bson>) -> Document {
    doc! {
        "$or": [
            { "created": { "$lt": created } },
            { "created": created, "_id": { "$lt": id.into() } },
        ]
    }
}

pub fn newest_first(limit: Option<usize>) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created": -1, "_id": -1 })
        .limit(limit.map(|l| l as i64))
        .build()
}

pub fn and(mut filters: Vec<Document>) -> Document {
    match filters.len() {
        0 => doc! {},
        1 => filters.remove(0),
        _ => doc! { "$and": filters },
    }
}

pub async fn get_one<M, E>(coll: &Collection<M>, filter: Document) -> RepoResult<E>
where
    M: Sync + Send + Unpin + ::serde::de::DeserializeOwned,
    E: TryFrom<M, Error = ::anyhow::Error>,
{
    coll.find_one(filter, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)?
        .let_(E::try_from)
        .let_(convert_model_err)
}

pub async fn get_many<M, E>(
    coll: &Collection<M>,
    filter: Document,
    options: FindOptions,
) -> RepoResult<Vec<E>>
where
    M: Sync + Send + Unpin + ::serde::de::DeserializeOwned,
    E: TryFrom<M, Error = ::anyhow::Error>,
{
    coll.find(filter, options)
        .instrument(tracing::trace_span!("find"))
        .await
        .let_(convert_repo_err)?
        .try_collect::<Vec<_>>()
        .await
        .let_(convert_repo_err)?
        .into_iter()
        .map(E::try_from)
        .collect::<::anyhow::Result<Vec<_>>>()
        .let_(convert_model_err)
}

/// Cursor row position, `None` when the cursor document is gone (the page then starts over).
pub async fn cursor_of<M>(coll: &Collection<M>, id: impl Into<Bson>) -> RepoResult<Option<i64>>
where M: Sync + Send + Unpin + ::serde::de::DeserializeOwned {
    let found = coll
        .clone_with_type::<Document>()
        .find_one(doc! { "_id": id.into() }, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?;

    Ok(found.and_then(|d| d.get_i64("created").ok()))
}

pub async fn count<M>(coll: &Collection<M>, filter: Document) -> RepoResult<u64> {
    coll.count_documents(filter, None)
        .instrument(tracing::trace_span!("count_documents"))
        .await
        .let_(convert_repo_err)
}

/// Single-document atomic `$inc`. `NotFound` when the owner document is missing.
pub async fn increment<M>(
    coll: &Collection<M>,
    id: impl Into<Bson>,
    field: &str,
    delta: i64,
    touch: bool,
) -> RepoResult<()> {
    let update = match touch {
        true => doc! {
            "$inc": { field: delta },
            "$set": { "updated": ::chrono::Utc::now().timestamp_millis() },
        },
        false => doc! { "$inc": { field: delta } },
    };

    let res = coll
        .update_one(doc! { "_id": id.into() }, update, None)
        .instrument(tracing::trace_span!("update_one"))
        .await
        .let_(convert_repo_err)?;

    match res.matched_count.let_(to_bool) {
        true => Ok(()),
        false => Err(super::RepositoryError::NotFound),
    }
}
