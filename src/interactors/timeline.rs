use std::collections::HashMap;

use async_trait::async_trait;

use super::profile_of;
use crate::config::Limits;
use crate::entities::{Profile, UserId};
use crate::repositories::{FollowQuery, PostQuery, Repositories};
use crate::usecases::timeline::{feed, FeedEntry, FeedMode};
use crate::usecases::UsecaseError;
use crate::utils::{split_page, AlsoChain, LetChain};

pub struct FeedInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}

impl FeedInteractor {
    /// Authors a follow-graph page may draw from: the first `max_graph_fan_in` of the
    /// following-set (newest edge first) and how many members were left out.
    async fn graph_authors(&self, requester: &UserId) -> Result<(Vec<UserId>, usize), UsecaseError> {
        let mut authors = self
            .repos
            .follows
            .finds(FollowQuery {
                follower: Some(requester.clone()),
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|f| f.following_id)
            .collect::<Vec<_>>();

        let dropped = authors.len().saturating_sub(self.limits.max_graph_fan_in);
        if dropped > 0 {
            tracing::debug!(
                "following-set of {} truncated to {} members ({} dropped)",
                requester,
                self.limits.max_graph_fan_in,
                dropped
            );
            authors.truncate(self.limits.max_graph_fan_in);
        }

        Ok((authors, dropped))
    }
}

#[async_trait]
impl feed::Usecase for FeedInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: feed::Input) -> Result<feed::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let feed::Input {
            requester,
            mode,
            cursor,
            limit,
        } = data;
        let limit = self.limits.page(limit);

        let (query, dropped_authors) = match mode {
            FeedMode::Topic(topic) => (
                PostQuery {
                    topic: Some(topic),
                    ..Default::default()
                },
                0,
            ),
            FeedMode::Following => {
                let (authors, dropped) = self.graph_authors(&requester).await?;

                if authors.is_empty() {
                    return Ok(feed::Output {
                        entries: vec![],
                        has_more: false,
                        dropped_authors: 0,
                    });
                }

                (
                    PostQuery {
                        authors: Some(authors),
                        ..Default::default()
                    },
                    dropped,
                )
            },
        };

        let rows = self
            .repos
            .posts
            .finds(PostQuery {
                after: cursor,
                limit: Some(limit + 1),
                ..query
            })
            .await?;
        let (rows, has_more) = split_page(rows, limit);

        let mut authors = HashMap::<UserId, Option<Profile>>::new();
        let mut entries = Vec::with_capacity(rows.len());
        for post in rows {
            let author = match authors.get(&post.author_id) {
                Some(p) => p.clone(),
                None => {
                    let p = profile_of(&*self.repos.users, &post.author_id).await?;
                    authors.insert(post.author_id.clone(), p.clone());
                    p
                },
            };
            let liked = self.repos.likes.is_exists(&post.id, &requester).await?;

            entries.push(FeedEntry {
                post,
                author,
                liked,
            });
        }

        feed::Output {
            entries,
            has_more,
            dropped_authors,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}
