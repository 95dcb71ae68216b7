mod common;

use std::collections::HashSet;

use chrono::{Duration, Utc};
use common::{fixture, image_content};
use fanbase::entities::{Post, PostId, TopicId};
use fanbase::repositories::UserMutation;
use fanbase::usecases::engagement::toggle_like;
use fanbase::usecases::graph::following_activity;
use fanbase::usecases::timeline::{feed, FeedMode};

fn topic(requester: &fanbase::entities::UserId, t: &str, limit: Option<usize>) -> feed::Input {
    feed::Input {
        requester: requester.clone(),
        mode: FeedMode::Topic(TopicId::from(t)),
        cursor: None,
        limit,
    }
}

fn following(requester: &fanbase::entities::UserId, limit: Option<usize>) -> feed::Input {
    feed::Input {
        requester: requester.clone(),
        mode: FeedMode::Following,
        cursor: None,
        limit,
    }
}

#[tokio::test]
async fn topic_feed_only_returns_tagged_posts() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let author = fx.user("author", None, &[]).await;

    let bts = fx.post(&author, &["BTS"]).await;
    let both = fx.post(&author, &["BTS", "TWICE"]).await;
    let _twice = fx.post(&author, &["TWICE"]).await;

    let out = fx.app.feed.handle(topic(&reader, "BTS", None)).await.unwrap();

    let ids = out.entries.iter().map(|e| e.post.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![both, bts]);
    assert!(!out.has_more);
    assert_eq!(out.dropped_authors, 0);
}

#[tokio::test]
async fn following_feed_only_returns_followed_authors() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let followed = fx.user("followed", None, &[]).await;
    let stranger = fx.user("stranger", None, &[]).await;
    fx.follow(&reader, &followed).await;

    let mine = fx.post(&followed, &["BTS"]).await;
    fx.post(&stranger, &["BTS"]).await;
    fx.post(&reader, &["BTS"]).await;

    let out = fx.app.feed.handle(following(&reader, None)).await.unwrap();

    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].post.id, mine);
    assert_eq!(
        out.entries[0].author.as_ref().map(|a| a.id.clone()),
        Some(followed)
    );
}

#[tokio::test]
async fn empty_following_set_yields_empty_page() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let author = fx.user("author", None, &[]).await;
    fx.post(&author, &["BTS"]).await;

    let out = fx.app.feed.handle(following(&reader, None)).await.unwrap();

    assert!(out.entries.is_empty());
    assert!(!out.has_more);
}

#[tokio::test]
async fn large_following_set_is_truncated_to_fan_in() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;

    for i in 0..12 {
        let id = fx.user(&format!("author{}", i), None, &[]).await;
        fx.follow(&reader, &id).await;
        fx.post(&id, &["BTS"]).await;
    }
    assert_eq!(fx.user_of(&reader).await.following_count, 12);

    let out = fx
        .app
        .feed
        .handle(following(&reader, Some(100)))
        .await
        .unwrap();

    let authors = out
        .entries
        .iter()
        .map(|e| e.post.author_id.clone())
        .collect::<HashSet<_>>();
    assert!(authors.len() <= 10);
    assert_eq!(out.entries.len(), authors.len());
    assert_eq!(out.dropped_authors, 2);
}

#[tokio::test]
async fn pages_cover_every_post_once() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let author = fx.user("author", None, &[]).await;

    let mut posted = vec![];
    for _ in 0..5 {
        posted.push(fx.post(&author, &["BTS"]).await);
    }
    posted.reverse();

    let mut seen = vec![];
    let mut cursor = None;
    loop {
        let out = fx
            .app
            .feed
            .handle(feed::Input {
                cursor,
                ..topic(&reader, "BTS", Some(2))
            })
            .await
            .unwrap();
        assert!(out.entries.len() <= 2);

        seen.extend(out.entries.iter().map(|e| e.post.id));
        if !out.has_more {
            break;
        }
        cursor = out.entries.last().map(|e| e.post.id);
    }

    assert_eq!(seen, posted);
}

#[tokio::test]
async fn entries_carry_liked_flag_and_live_author() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let author = fx.user("author", Some("Old"), &[]).await;

    let liked = fx.post(&author, &["BTS"]).await;
    let plain = fx.post(&author, &["BTS"]).await;
    fx.app
        .toggle_like
        .handle(toggle_like::Input {
            post_id: liked,
            user_id: reader.clone(),
        })
        .await
        .unwrap();
    fx.repos
        .users
        .update(
            &author,
            UserMutation {
                display_name: Some("New".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let out = fx.app.feed.handle(topic(&reader, "BTS", None)).await.unwrap();

    assert_eq!(out.entries.len(), 2);
    for e in out.entries.iter() {
        assert_eq!(e.liked, e.post.id == liked);
        assert_eq!(
            e.author.as_ref().and_then(|a| a.display_name.as_deref()),
            Some("New")
        );
    }
    assert_eq!(out.entries[0].post.id, plain);
    assert_eq!(out.entries[1].post.likes_count, 1);
}

fn activity(requester: &fanbase::entities::UserId, limit: Option<usize>) -> following_activity::Input {
    following_activity::Input {
        requester: requester.clone(),
        limit,
    }
}

#[tokio::test]
async fn following_activity_orders_by_latest_post() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    let quiet = fx.user("quiet", None, &[]).await;
    let stale = fx.user("stale", None, &[]).await;
    let fresh = fx.user("fresh", None, &[]).await;
    for id in [&quiet, &stale, &fresh] {
        fx.follow(&reader, id).await;
    }

    let old = Utc::now() - Duration::days(2);
    assert!(fx
        .repos
        .posts
        .insert(Post {
            id: PostId::new(),
            author_id: stale.clone(),
            content: image_content(),
            topics: vec![],
            likes_count: 0,
            comments_count: 0,
            created: old,
            updated: old,
        })
        .await
        .unwrap());
    fx.post(&fresh, &["BTS"]).await;

    let out = fx
        .app
        .following_activity
        .handle(activity(&reader, None))
        .await
        .unwrap();

    let ids = out
        .entries
        .iter()
        .map(|e| e.profile.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![fresh, stale, quiet]);

    assert!(out.entries[0].has_new_post);
    assert!(!out.entries[1].has_new_post);
    assert_eq!(out.entries[1].latest_post_at, Some(old));
    assert!(!out.entries[2].has_new_post);
    assert_eq!(out.entries[2].latest_post_at, None);
}

#[tokio::test]
async fn following_activity_respects_limit() {
    let fx = fixture();
    let reader = fx.user("reader", None, &[]).await;
    for i in 0..5 {
        let id = fx.user(&format!("author{}", i), None, &[]).await;
        fx.follow(&reader, &id).await;
        fx.post(&id, &["BTS"]).await;
    }

    let out = fx
        .app
        .following_activity
        .handle(activity(&reader, Some(2)))
        .await
        .unwrap();
    assert_eq!(out.entries.len(), 2);

    let nobody = fx.user("nobody", None, &[]).await;
    let out = fx
        .app
        .following_activity
        .handle(activity(&nobody, None))
        .await
        .unwrap();
    assert!(out.entries.is_empty());
}
