use std::collections::HashSet;

use async_trait::async_trait;

use super::user_err_fmt;
use crate::config::Limits;
use crate::entities::{shared_topics, Candidate, TopicId, User};
use crate::repositories::{FollowQuery, Repositories, UserQuery};
use crate::usecases::recommendation::recommend;
use crate::usecases::UsecaseError;
use crate::utils::{AlsoChain, LetChain};

pub struct RecommendInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}

/// Shared-topic count descending, then follower count descending.
/// Stable, so full ties keep query order.
pub fn rank(candidates: &mut Vec<Candidate>, limit: usize) {
    candidates.sort_by(|a, b| {
        b.shared_topic_count
            .cmp(&a.shared_topic_count)
            .then(b.followers_count.cmp(&a.followers_count))
    });
    candidates.truncate(limit);
}

fn to_candidate(user: User, interests: &[TopicId]) -> Candidate {
    let shared = shared_topics(&user.topics, interests);

    Candidate {
        user_id: user.id,
        display_name: user.display_name,
        photo_url: user.photo_url,
        shared_topic_count: shared.len(),
        shared_topics: shared,
        followers_count: user.followers_count,
    }
}

#[async_trait]
impl recommend::Usecase for RecommendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: recommend::Input) -> Result<recommend::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let recommend::Input { requester, limit } = data;
        let limit = self.limits.recommendations(limit);

        let me = self
            .repos
            .users
            .find(&requester)
            .await
            .map_err(user_err_fmt)?;

        let first = match me.topics.first() {
            Some(t) => t.clone(),
            None => return Ok(recommend::Output { candidates: vec![] }),
        };

        let following = self
            .repos
            .follows
            .finds(FollowQuery {
                follower: Some(requester.clone()),
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|f| f.following_id)
            .collect::<HashSet<_>>();

        // over-fetch for the rows excluded below
        let fetch = (limit + following.len() + 1).min(self.limits.candidate_pool);

        let mut candidates = self
            .repos
            .users
            .finds(UserQuery {
                topic: Some(first),
                limit: Some(fetch),
            })
            .await?
            .into_iter()
            .filter(|u| u.id != requester && !following.contains(&u.id) && !u.suspended)
            .map(|u| to_candidate(u, &me.topics))
            .collect::<Vec<_>>();

        rank(&mut candidates, limit);

        recommend::Output { candidates }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, shared: usize, followers: i64) -> Candidate {
        Candidate {
            user_id: id.into(),
            display_name: None,
            photo_url: None,
            shared_topic_count: shared,
            shared_topics: Default::default(),
            followers_count: followers,
        }
    }

    #[test]
    fn rank_by_shared_then_followers() {
        let mut v = vec![
            candidate("a", 1, 100),
            candidate("b", 2, 5),
            candidate("c", 1, 300),
        ];

        rank(&mut v, 2);

        let ids = v.iter().map(|c| c.user_id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn shared_topics_come_from_candidate_order() {
        let mut user = User::new("x".into(), None, vec!["TWICE".into(), "BTS".into()]);
        user.followers_count = 3;

        let c = to_candidate(user, &[TopicId::from("BTS"), TopicId::from("TWICE")]);

        assert_eq!(c.shared_topic_count, 2);
        assert_eq!(
            c.shared_topics.as_slice(),
            &[TopicId::from("TWICE"), TopicId::from("BTS")]
        );
        assert_eq!(c.followers_count, 3);
    }
}
