use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Date = DateTime<Utc>;

macro_rules! string_id {
    ($n:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $n(pub String);

        impl ::core::fmt::Display for $n {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $n {
            fn from(s: &str) -> Self { Self(s.to_string()) }
        }
    };
}

macro_rules! uuid_id {
    ($n:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $n(pub Uuid);

        impl $n {
            pub fn new() -> Self { Self(Uuid::new_v4()) }
        }

        impl Default for $n {
            fn default() -> Self { Self::new() }
        }

        impl ::core::fmt::Display for $n {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $n {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
        }
    };
}

string_id!(UserId);
string_id!(TopicId);
uuid_id!(PostId);
uuid_id!(CommentId);
uuid_id!(NotificationId);

/// Deterministic key of a follow edge: `{follower}_{following}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowId(pub String);

impl FollowId {
    pub fn new(follower: &UserId, following: &UserId) -> Self {
        Self(format!("{}_{}", follower.0, following.0))
    }
}

impl ::core::fmt::Display for FollowId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub topics: Vec<TopicId>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub suspended: bool,
    pub admin: bool,
    pub created: Date,
}

impl User {
    pub fn new(id: UserId, display_name: Option<String>, topics: Vec<TopicId>) -> Self {
        Self {
            id,
            display_name,
            photo_url: None,
            topics,
            followers_count: 0,
            following_count: 0,
            posts_count: 0,
            suspended: false,
            admin: false,
            created: Utc::now(),
        }
    }
}

/// Public part of a user, joined into listings at read time.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

impl From<User> for Profile {
    fn from(
        User {
            id,
            display_name,
            photo_url,
            followers_count,
            following_count,
            posts_count,
            ..
        }: User,
    ) -> Self {
        Self {
            id,
            display_name,
            photo_url,
            followers_count,
            following_count,
            posts_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Follow {
    pub id: FollowId,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created: Date,
}

impl Follow {
    pub fn new(follower_id: UserId, following_id: UserId) -> Self {
        Self {
            id: FollowId::new(&follower_id, &following_id),
            follower_id,
            following_id,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: PostContent,
    pub topics: Vec<TopicId>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created: Date,
    pub updated: Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum PostContent {
    Image {
        #[serde(default)]
        text: Option<String>,
        images: Vec<String>,
    },
    VoteShare {
        #[serde(default)]
        text: Option<String>,
        #[serde(rename = "voteIds")]
        vote_ids: Vec<String>,
        #[serde(rename = "voteSnapshots")]
        vote_snapshots: Vec<VoteSnapshot>,
    },
    MyVotes {
        #[serde(default)]
        text: Option<String>,
        #[serde(rename = "myVotes")]
        my_votes: Vec<MyVoteItem>,
    },
    GoodsTrade {
        #[serde(default)]
        text: Option<String>,
        #[serde(rename = "goodsTrade")]
        goods_trade: GoodsTrade,
    },
}

pub const MAX_POST_IMAGES: usize = 4;

impl PostContent {
    pub fn kind(&self) -> &'static str {
        match self {
            PostContent::Image { .. } => "image",
            PostContent::VoteShare { .. } => "vote_share",
            PostContent::MyVotes { .. } => "my_votes",
            PostContent::GoodsTrade { .. } => "goods_trade",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            PostContent::Image { images, .. } => {
                if images.is_empty() {
                    return Err("images required for image posts".to_string());
                }
                if images.len() > MAX_POST_IMAGES {
                    return Err(format!("maximum {} images allowed", MAX_POST_IMAGES));
                }
            },
            PostContent::VoteShare {
                vote_ids,
                vote_snapshots,
                ..
            } => {
                if vote_ids.is_empty() {
                    return Err("voteIds must be a non-empty array for vote_share".to_string());
                }
                if vote_snapshots.is_empty() {
                    return Err(
                        "voteSnapshots must be a non-empty array for vote_share".to_string()
                    );
                }
            },
            PostContent::MyVotes { my_votes, .. } =>
                if my_votes.is_empty() {
                    return Err("myVotes required for my_votes posts".to_string());
                },
            PostContent::GoodsTrade { goods_trade, .. } => {
                let GoodsTrade {
                    idol_id,
                    goods_image_url,
                    goods_name,
                    goods_tags,
                    ..
                } = goods_trade;

                if idol_id.is_empty()
                    || goods_image_url.is_empty()
                    || goods_name.is_empty()
                    || goods_tags.is_empty()
                {
                    return Err("goodsTrade requires: idolId, goodsImageUrl, goodsName, \
                                tradeType, and goodsTags"
                        .to_string());
                }
            },
        }

        Ok(())
    }

    /// One-line preview shown in timelines.
    pub fn summary(&self) -> String {
        match self {
            PostContent::Image { text, images } => match text {
                Some(t) if !t.is_empty() => format!("{} [{} image(s)]", t, images.len()),
                _ => format!("[{} image(s)]", images.len()),
            },
            PostContent::VoteShare { vote_snapshots, .. } => {
                let titles = vote_snapshots
                    .iter()
                    .map(|v| v.title.as_str())
                    .collect::<Vec<_>>();
                format!("shared votes: {}", titles.join(", "))
            },
            PostContent::MyVotes { my_votes, .. } => {
                let points: i64 = my_votes.iter().map(|v| v.points_used).sum();
                format!("{} vote(s), {} point(s) used", my_votes.len(), points)
            },
            PostContent::GoodsTrade { goods_trade, .. } => {
                let op = match goods_trade.trade_type {
                    TradeType::Want => "want",
                    TradeType::Offer => "offer",
                };
                format!("[{}] {}", op, goods_trade.goods_name)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSnapshot {
    pub vote_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVoteItem {
    pub vote_id: String,
    pub title: String,
    #[serde(default)]
    pub selected_choice_label: Option<String>,
    pub points_used: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsTrade {
    pub idol_id: String,
    pub goods_image_url: String,
    pub goods_name: String,
    pub goods_tags: Vec<String>,
    pub trade_type: TradeType,
    #[serde(default)]
    pub condition: Option<GoodsCondition>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TradeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    Want,
    Offer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsCondition {
    New,
    Excellent,
    Good,
    Fair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Available,
    Reserved,
    Completed,
}

impl Default for TradeStatus {
    fn default() -> Self { TradeStatus::Available }
}

#[derive(Debug, Clone)]
pub struct Like {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created: Date,
}

pub const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
}

/// Actor identity frozen at notification time. Later profile edits do not touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub actor: ActorSnapshot,
    pub read: bool,
    pub related_post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
    pub created: Date,
}

/// Derived on demand, never stored.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub shared_topic_count: usize,
    pub shared_topics: smallvec::SmallVec<[TopicId; 4]>,
    pub followers_count: i64,
}

pub fn shared_topics(left: &[TopicId], right: &[TopicId]) -> smallvec::SmallVec<[TopicId; 4]> {
    let right = right.iter().collect::<HashSet<_>>();
    let mut seen = HashSet::new();

    left.iter()
        .filter(|t| right.contains(t) && seen.insert(*t))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: usize) -> PostContent {
        PostContent::Image {
            text: None,
            images: (0..n).map(|i| format!("img/{}.png", i)).collect(),
        }
    }

    #[test]
    fn follow_key_is_deterministic() {
        let id = FollowId::new(&"alice".into(), &"bob".into());
        assert_eq!(id.0, "alice_bob");
        assert_eq!(Follow::new("alice".into(), "bob".into()).id, id);
    }

    #[test]
    fn image_post_bounds() {
        assert!(image(0).validate().is_err());
        assert!(image(1).validate().is_ok());
        assert!(image(MAX_POST_IMAGES).validate().is_ok());
        assert!(image(MAX_POST_IMAGES + 1).validate().is_err());
    }

    #[test]
    fn vote_share_needs_ids_and_snapshots() {
        let content = PostContent::VoteShare {
            text: None,
            vote_ids: vec!["v1".to_string()],
            vote_snapshots: vec![],
        };
        assert!(content.validate().is_err());

        let content = PostContent::VoteShare {
            text: None,
            vote_ids: vec!["v1".to_string()],
            vote_snapshots: vec![VoteSnapshot {
                vote_id: "v1".to_string(),
                title: "best stage".to_string(),
            }],
        };
        assert!(content.validate().is_ok());
        assert_eq!(content.summary(), "shared votes: best stage");
    }

    #[test]
    fn goods_trade_from_json() {
        let raw = serde_json::json!({
            "type": "goods_trade",
            "content": {
                "goodsTrade": {
                    "idolId": "jimin",
                    "goodsImageUrl": "img/card.png",
                    "goodsName": "photocard",
                    "goodsTags": ["card"],
                    "tradeType": "offer"
                }
            }
        });

        let content: PostContent = serde_json::from_value(raw).unwrap();
        assert_eq!(content.kind(), "goods_trade");
        assert!(content.validate().is_ok());
        assert_eq!(content.summary(), "[offer] photocard");

        match content {
            PostContent::GoodsTrade { goods_trade, .. } =>
                assert_eq!(goods_trade.status, TradeStatus::Available),
            _ => unreachable!(),
        }
    }

    #[test]
    fn goods_trade_rejects_missing_tags() {
        let content = PostContent::GoodsTrade {
            text: None,
            goods_trade: GoodsTrade {
                idol_id: "jimin".to_string(),
                goods_image_url: "img/card.png".to_string(),
                goods_name: "photocard".to_string(),
                goods_tags: vec![],
                trade_type: TradeType::Want,
                condition: None,
                description: None,
                status: TradeStatus::Available,
            },
        };
        assert!(content.validate().is_err());
    }

    #[test]
    fn shared_topics_is_an_intersection() {
        let a = vec![TopicId::from("BTS"), TopicId::from("TWICE")];
        let b = vec![TopicId::from("BTS")];

        assert_eq!(shared_topics(&a, &b).as_slice(), &[TopicId::from("BTS")]);
        assert_eq!(shared_topics(&b, &a).len(), 1);
        assert!(shared_topics(&a, &[]).is_empty());
    }
}
