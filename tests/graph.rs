mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{fixture, with_failing_counter};
use fanbase::entities::{FollowId, NotificationKind, UserId};
use fanbase::repositories::{FollowQuery, NotificationQuery, UserCounter};
use fanbase::usecases::graph::{
    follow, followers, following, is_following, unfollow, user_profile,
};
use fanbase::usecases::reconcile::reconcile;
use fanbase::usecases::UsecaseError;

fn follow_input(a: &fanbase::entities::UserId, b: &fanbase::entities::UserId) -> follow::Input {
    follow::Input {
        follower_id: a.clone(),
        target_id: b.clone(),
    }
}

#[tokio::test]
async fn follow_increments_both_counters_and_notifies() {
    let fx = fixture();
    let alice = fx.user("alice", Some("Alice"), &[]).await;
    let bob = fx.user("bob", Some("Bob"), &[]).await;

    let out = fx.app.follow.handle(follow_input(&alice, &bob)).await.unwrap();
    assert_eq!(out.follow.id, FollowId::new(&alice, &bob));

    assert_eq!(fx.user_of(&alice).await.following_count, 1);
    assert_eq!(fx.user_of(&alice).await.followers_count, 0);
    assert_eq!(fx.user_of(&bob).await.followers_count, 1);

    let is = fx
        .app
        .is_following
        .handle(is_following::Input {
            follower_id: alice.clone(),
            target_id: bob.clone(),
        })
        .await
        .unwrap();
    assert!(is.following);

    let reverse = fx
        .app
        .is_following
        .handle(is_following::Input {
            follower_id: bob.clone(),
            target_id: alice.clone(),
        })
        .await
        .unwrap();
    assert!(!reverse.following);

    let notes = fx
        .repos
        .notifications
        .finds(NotificationQuery {
            recipient: Some(bob.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Follow);
    assert_eq!(notes[0].body, "Alice started following you");
    assert_eq!(notes[0].actor.user_id, alice);
}

#[tokio::test]
async fn self_follow_always_fails() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;

    let res = fx.app.follow.handle(follow_input(&alice, &alice)).await;

    assert!(matches!(res, Err(UsecaseError::SelfFollow)));
    assert_eq!(fx.user_of(&alice).await.following_count, 0);
}

#[tokio::test]
async fn follow_unknown_target_is_not_found() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;

    let res = fx
        .app
        .follow
        .handle(follow_input(&alice, &"ghost".into()))
        .await;

    assert!(matches!(res, Err(UsecaseError::NotFound(_))));
    assert_eq!(fx.user_of(&alice).await.following_count, 0);
}

#[tokio::test]
async fn second_follow_conflicts_without_touching_counters() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;
    let bob = fx.user("bob", None, &[]).await;

    fx.follow(&alice, &bob).await;
    let res = fx.app.follow.handle(follow_input(&alice, &bob)).await;

    assert!(matches!(res, Err(UsecaseError::AlreadyFollowing)));
    assert_eq!(fx.user_of(&alice).await.following_count, 1);
    assert_eq!(fx.user_of(&bob).await.followers_count, 1);
}

#[tokio::test]
async fn unfollow_restores_counters() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;
    let bob = fx.user("bob", None, &[]).await;

    fx.follow(&alice, &bob).await;
    fx.app
        .unfollow
        .handle(unfollow::Input {
            follower_id: alice.clone(),
            target_id: bob.clone(),
        })
        .await
        .unwrap();

    assert_eq!(fx.user_of(&alice).await.following_count, 0);
    assert_eq!(fx.user_of(&bob).await.followers_count, 0);
    assert!(
        !fx.app
            .is_following
            .handle(is_following::Input {
                follower_id: alice.clone(),
                target_id: bob.clone(),
            })
            .await
            .unwrap()
            .following
    );

    let again = fx
        .app
        .unfollow
        .handle(unfollow::Input {
            follower_id: alice.clone(),
            target_id: bob.clone(),
        })
        .await;
    assert!(matches!(again, Err(UsecaseError::NotFollowing)));
    assert_eq!(fx.user_of(&bob).await.followers_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_follows_create_one_edge() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;
    let bob = fx.user("bob", None, &[]).await;
    let app = Arc::new(fx.app);

    let handles = (0..8)
        .map(|_| {
            let app = app.clone();
            let input = follow_input(&alice, &bob);
            tokio::spawn(async move { app.follow.handle(input).await })
        })
        .collect::<Vec<_>>();

    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(UsecaseError::AlreadyFollowing) => conflicts += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(
        fx.repos
            .follows
            .count(FollowQuery {
                follower: Some(alice.clone()),
                ..Default::default()
            })
            .await
            .unwrap(),
        1
    );
    assert_eq!(fx.repos.users.find(&alice).await.unwrap().following_count, 1);
    assert_eq!(fx.repos.users.find(&bob).await.unwrap().followers_count, 1);
}

#[tokio::test]
async fn following_listing_pages_and_reports_follow_back() {
    let fx = fixture();
    let me = fx.user("me", Some("Me"), &[]).await;
    let mut targets = vec![];
    for i in 0..5 {
        let id = fx.user(&format!("u{}", i), None, &[]).await;
        fx.follow(&me, &id).await;
        targets.push(id);
    }
    fx.follow(&targets[2], &me).await;

    let mut seen = HashSet::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let out = fx
            .app
            .following
            .handle(following::Input {
                requester: me.clone(),
                user_id: me.clone(),
                cursor: cursor.clone(),
                limit: Some(2),
            })
            .await
            .unwrap();
        pages += 1;

        for e in out.entries.iter() {
            let counterpart = e.follow.following_id.clone();
            assert!(seen.insert(counterpart.clone()), "duplicate row");
            assert_eq!(e.followed_back, Some(counterpart == targets[2]));
            assert_eq!(e.profile.as_ref().map(|p| p.id.clone()), Some(counterpart));
        }

        if !out.has_more {
            break;
        }
        cursor = out.entries.last().map(|e| e.follow.id.clone());
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 5);

    let followers = fx
        .app
        .followers
        .handle(followers::Input {
            user_id: me.clone(),
            cursor: None,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(followers.entries.len(), 1);
    assert_eq!(followers.entries[0].follow.follower_id, targets[2]);
    assert_eq!(followers.entries[0].followed_back, None);
    assert!(!followers.has_more);
}

#[tokio::test]
async fn failed_counter_step_leaves_drift_until_reconciled() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;
    let bob = fx.user("bob", None, &[]).await;

    let broken = with_failing_counter(&fx, UserCounter::Followers);
    let res = broken.follow.handle(follow_input(&alice, &bob)).await;

    assert!(matches!(res, Err(UsecaseError::Internal(_))));
    // the edge and the first increment stay in place
    assert!(fx
        .repos
        .follows
        .is_exists(&FollowId::new(&alice, &bob))
        .await
        .unwrap());
    assert_eq!(fx.user_of(&alice).await.following_count, 1);
    assert_eq!(fx.user_of(&bob).await.followers_count, 0);

    let out = fx
        .app
        .reconcile
        .handle(reconcile::Input {
            users: vec![alice.clone(), bob.clone()],
            posts: vec![],
        })
        .await
        .unwrap();

    assert!(!out.users[0].drifted());
    assert!(out.users[1].drifted());
    assert_eq!(out.users[1].stored.followers, 0);
    assert_eq!(out.users[1].actual.followers, 1);
    assert_eq!(fx.user_of(&bob).await.followers_count, 1);
}

fn profile_input(requester: &UserId, user: &UserId) -> user_profile::Input {
    user_profile::Input {
        requester: requester.clone(),
        user_id: user.clone(),
    }
}

#[tokio::test]
async fn user_profile_reports_relationship_and_newest_posts() {
    let fx = fixture();
    let alice = fx.user("alice", Some("Alice"), &[]).await;
    let bob = fx.user("bob", Some("Bob"), &["BTS", "TWICE"]).await;
    fx.follow(&bob, &alice).await;

    let mut posted = vec![];
    for _ in 0..25 {
        posted.push(fx.post(&bob, &["BTS"]).await);
    }

    let out = fx
        .app
        .user_profile
        .handle(profile_input(&alice, &bob))
        .await
        .unwrap();

    assert_eq!(out.profile.id, bob);
    assert_eq!(out.profile.display_name.as_deref(), Some("Bob"));
    assert_eq!(out.profile.following_count, 1);
    assert_eq!(out.profile.posts_count, 25);
    assert_eq!(out.topics.len(), 2);
    assert!(!out.is_following);
    assert!(out.is_followed_by);

    assert_eq!(out.posts.len(), 20);
    assert_eq!(out.posts[0].id, posted[24]);
    assert!(out.posts.iter().all(|p| p.author_id == bob));

    fx.follow(&alice, &bob).await;
    let out = fx
        .app
        .user_profile
        .handle(profile_input(&alice, &bob))
        .await
        .unwrap();
    assert!(out.is_following);
    assert_eq!(out.profile.followers_count, 1);
}

#[tokio::test]
async fn own_profile_has_no_relationship_flags() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;

    let out = fx
        .app
        .user_profile
        .handle(profile_input(&alice, &alice))
        .await
        .unwrap();

    assert!(!out.is_following);
    assert!(!out.is_followed_by);
    assert!(out.posts.is_empty());
}

#[tokio::test]
async fn user_profile_of_unknown_user_is_not_found() {
    let fx = fixture();
    let alice = fx.user("alice", None, &[]).await;

    let res = fx
        .app
        .user_profile
        .handle(profile_input(&alice, &UserId::from("ghost")))
        .await;

    assert!(matches!(res, Err(UsecaseError::NotFound(_))));
}
