mod common;

use common::fixture;
use fanbase::entities::{TopicId, UserId};
use fanbase::repositories::{UserCounters, UserMutation};
use fanbase::usecases::recommendation::recommend;

fn ask(requester: &UserId, limit: Option<usize>) -> recommend::Input {
    recommend::Input {
        requester: requester.clone(),
        limit,
    }
}

#[tokio::test]
async fn ranks_by_shared_topics_then_followers() {
    let fx = fixture();
    let me = fx.user("me", None, &["BTS", "TWICE"]).await;
    let u1 = fx.user("u1", None, &["BTS", "TWICE"]).await;
    let u2 = fx.user("u2", None, &["BTS"]).await;
    let u3 = fx.user("u3", None, &["BTS"]).await;

    for (id, followers) in [(&u1, 5), (&u2, 100), (&u3, 1)] {
        fx.repos
            .users
            .set_counters(id, UserCounters {
                followers,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let out = fx.app.recommend.handle(ask(&me, None)).await.unwrap();

    let ids = out
        .candidates
        .iter()
        .map(|c| c.user_id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![u1, u2, u3]);

    let top = &out.candidates[0];
    assert_eq!(top.shared_topic_count, 2);
    assert_eq!(
        top.shared_topics.as_slice(),
        &[TopicId::from("BTS"), TopicId::from("TWICE")]
    );
    assert_eq!(top.followers_count, 5);
}

#[tokio::test]
async fn excludes_self_followed_and_suspended() {
    let fx = fixture();
    let me = fx.user("me", None, &["BTS"]).await;
    let followed = fx.user("followed", None, &["BTS"]).await;
    let banned = fx.user("banned", None, &["BTS"]).await;
    let fresh = fx.user("fresh", None, &["BTS"]).await;

    fx.follow(&me, &followed).await;
    fx.repos
        .users
        .update(
            &banned,
            UserMutation {
                suspended: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let out = fx.app.recommend.handle(ask(&me, None)).await.unwrap();

    let ids = out
        .candidates
        .iter()
        .map(|c| c.user_id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![fresh]);
}

#[tokio::test]
async fn no_interests_means_no_candidates() {
    let fx = fixture();
    let me = fx.user("me", None, &[]).await;
    fx.user("other", None, &["BTS"]).await;

    let out = fx.app.recommend.handle(ask(&me, None)).await.unwrap();

    assert!(out.candidates.is_empty());
}

#[tokio::test]
async fn limit_caps_the_result() {
    let fx = fixture();
    let me = fx.user("me", None, &["BTS"]).await;
    for i in 0..6 {
        fx.user(&format!("u{}", i), None, &["BTS"]).await;
    }

    let out = fx.app.recommend.handle(ask(&me, Some(3))).await.unwrap();

    assert_eq!(out.candidates.len(), 3);
}

#[tokio::test]
async fn equal_overlap_falls_back_to_followers() {
    let fx = fixture();
    let me = fx.user("me", None, &["BTS"]).await;
    let a = fx.user("a", None, &["BTS", "TWICE"]).await;
    let b = fx.user("b", None, &["BTS"]).await;

    for (id, followers) in [(&a, 3), (&b, 40)] {
        fx.repos
            .users
            .set_counters(id, UserCounters {
                followers,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let out = fx.app.recommend.handle(ask(&me, None)).await.unwrap();

    let ids = out
        .candidates
        .iter()
        .map(|c| c.user_id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![b, a]);
    assert!(out.candidates.iter().all(|c| c.shared_topic_count == 1));
    assert!(out
        .candidates
        .iter()
        .all(|c| c.shared_topics.as_slice() == [TopicId::from("BTS")]));
}
