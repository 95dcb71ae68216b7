//! Fixture data loaded into the in-memory store at startup.
//!
//! Users are written directly. Follows and posts go through their use cases so
//! the denormalized counters and notifications come out the same as in live traffic.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constructors::App;
use crate::entities::{PostContent, TopicId, User, UserId};
use crate::repositories::Repositories;
use crate::usecases::engagement::create_post;
use crate::usecases::graph::follow;
use crate::usecases::UsecaseError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub follows: Vec<SeedFollow>,
    #[serde(default)]
    pub posts: Vec<SeedPost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedUser {
    pub id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedFollow {
    pub follower: UserId,
    pub following: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedPost {
    pub author: UserId,
    /// `{ "type": ..., "content": ... }`, as posted to `/posts`
    pub post: PostContent,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
}

/// Records actually written; entries already present are skipped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub follows: usize,
    pub posts: usize,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid seed data")
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read seed file {}", path.display()))?;

        Self::from_json(&raw).with_context(|| path.display().to_string())
    }

    pub async fn apply(self, app: &App, repos: &Repositories) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for u in self.users {
            let user = User {
                photo_url: u.photo_url,
                admin: u.admin,
                ..User::new(u.id, u.display_name, u.topic_ids)
            };
            let id = user.id.clone();

            if repos.users.insert(user).await? {
                report.users += 1;
            } else {
                tracing::warn!("seed user {} already present, skipped", id);
            }
        }

        for f in self.follows {
            let res = app
                .follow
                .handle(follow::Input {
                    follower_id: f.follower.clone(),
                    target_id: f.following.clone(),
                })
                .await;

            match res {
                Ok(_) => report.follows += 1,
                Err(UsecaseError::AlreadyFollowing) => {
                    tracing::warn!("seed follow {} -> {} exists", f.follower, f.following)
                },
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("seed follow {} -> {}", f.follower, f.following))
                },
            }
        }

        for p in self.posts {
            let author = p.author.clone();
            app.create_post
                .handle(create_post::Input {
                    author_id: p.author,
                    content: p.post,
                    topics: p.topic_ids,
                })
                .await
                .with_context(|| format!("seed post of {}", author))?;
            report.posts += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::constructors::in_memory;

    const SEED: &str = r#"{
        "users": [
            { "id": "alice", "displayName": "Alice", "topicIds": ["BTS"] },
            { "id": "bob", "displayName": "Bob", "topicIds": ["BTS", "TWICE"], "admin": true }
        ],
        "follows": [
            { "follower": "alice", "following": "bob" }
        ],
        "posts": [
            {
                "author": "bob",
                "post": { "type": "image", "content": { "text": "live", "images": ["a.png"] } },
                "topicIds": ["BTS"]
            }
        ]
    }"#;

    #[tokio::test]
    async fn seed_goes_through_counters() {
        let (app, repos) = in_memory(Limits::default());

        let report = Seed::from_json(SEED)
            .unwrap()
            .apply(&app, &repos)
            .await
            .unwrap();

        assert_eq!(report, SeedReport {
            users: 2,
            follows: 1,
            posts: 1,
        });

        let bob = repos.users.find(&"bob".into()).await.unwrap();
        assert!(bob.admin);
        assert_eq!(bob.followers_count, 1);
        assert_eq!(bob.posts_count, 1);
        assert_eq!(
            repos
                .users
                .find(&"alice".into())
                .await
                .unwrap()
                .following_count,
            1
        );
    }

    #[tokio::test]
    async fn applying_twice_skips_present_records() {
        let (app, repos) = in_memory(Limits::default());

        let raw = r#"{ "users": [{ "id": "alice" }, { "id": "bob" }],
                       "follows": [{ "follower": "alice", "following": "bob" }] }"#;
        Seed::from_json(raw)
            .unwrap()
            .apply(&app, &repos)
            .await
            .unwrap();
        let again = Seed::from_json(raw)
            .unwrap()
            .apply(&app, &repos)
            .await
            .unwrap();

        assert_eq!(again, SeedReport::default());
        assert_eq!(
            repos.users.find(&"bob".into()).await.unwrap().followers_count,
            1
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Seed::from_json(r#"{ "users": [{ "id": "a", "nick": "x" }] }"#).is_err());
        assert!(Seed::from_json("{}").is_ok());
    }

    #[tokio::test]
    async fn follow_of_unknown_user_fails() {
        let (app, repos) = in_memory(Limits::default());

        let res = Seed::from_json(
            r#"{ "users": [{ "id": "alice" }],
                 "follows": [{ "follower": "alice", "following": "ghost" }] }"#,
        )
        .unwrap()
        .apply(&app, &repos)
        .await;

        assert!(res.is_err());
    }
}
