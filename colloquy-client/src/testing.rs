use chrono::TimeZone;

use crate::{
    api::{self, Author, CommentId, CommentState, PostId, Time, UserId, Uuid},
    Comment, Forest, Replies,
};

pub fn id(n: u128) -> CommentId {
    CommentId(Uuid::from_u128(n))
}

pub fn user(n: u128) -> UserId {
    UserId(Uuid::from_u128(n))
}

pub fn time(secs: i64) -> Time {
    chrono::Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn author(n: u128) -> Author {
    Author {
        id: user(n),
        username: format!("user{n}"),
        nickname: None,
        avatar_url: None,
    }
}

pub fn api_comment(n: u128, parent: Option<u128>) -> api::Comment {
    api::Comment {
        id: id(n),
        post_id: PostId::stub(),
        parent_id: parent.map(id),
        author: author(1),
        body: format!("comment {n}"),
        state: CommentState::Active,
        created_at: time(n as i64),
        edited_at: None,
        reply_count: 0,
        replies: None,
    }
}

/// A comment with unloaded replies
pub fn comment(n: u128, parent: Option<u128>) -> Comment {
    Comment::from(api_comment(n, parent))
}

/// A comment whose replies are loaded with `children`
pub fn with_replies(mut c: Comment, children: Vec<Comment>) -> Comment {
    c.reply_count = children.len() as u32;
    c.replies = Replies::Loaded(children.into_iter().collect());
    c
}

/// 1 -> [2 -> [4], 3], 5 (unloaded, 2 replies)
pub fn sample_forest() -> Forest {
    let mut five = comment(5, None);
    five.reply_count = 2;
    Forest::from_comments(vec![
        with_replies(
            comment(1, None),
            vec![
                with_replies(comment(2, Some(1)), vec![comment(4, Some(2))]),
                comment(3, Some(1)),
            ],
        ),
        five,
    ])
}

/// A single chain of `len` comments, numbered from 1, each replying to the previous one
pub fn chain(len: u128) -> Forest {
    let mut node = None;
    for n in (1..=len).rev() {
        let parent = (n > 1).then(|| n - 1);
        node = Some(match node {
            None => comment(n, parent),
            Some(child) => with_replies(comment(n, parent), vec![child]),
        });
    }
    Forest::from_comments(node.into_iter().collect())
}
