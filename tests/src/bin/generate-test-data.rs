use chrono::{Duration, Utc};
use colloquy_api::{Author, Comment, CommentId, CommentState, PostId, UserId};
use colloquy_mock_server::DbDump;
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

const NUM_USERS: usize = 5;
const NUM_POSTS: usize = 2;
const NUM_ROOTS_PER_POST: usize = 30;
const NUM_REPLIES_PER_POST: usize = 120;

const COMMENT_MAX_WORDS: usize = 40;
const DELETED_RATIO: f64 = 0.05;
const BLOCKED_RATIO: f64 = 0.02;
const EDITED_RATIO: f64 = 0.1;

// Replies mostly go to recent comments, so that some chains get deep
const RECENT_WINDOW: usize = 8;

fn gen_body(rng: &mut impl Rng) -> String {
    lipsum::lipsum_words(rng.gen_range(1..=COMMENT_MAX_WORDS))
}

fn gen_comment(
    rng: &mut impl Rng,
    users: &[Author],
    post_id: PostId,
    parent_id: Option<CommentId>,
    created_at: chrono::DateTime<Utc>,
) -> Comment {
    let state = match rng.gen::<f64>() {
        x if x < BLOCKED_RATIO => CommentState::Blocked,
        x if x < BLOCKED_RATIO + DELETED_RATIO => CommentState::Deleted,
        _ => CommentState::Active,
    };
    let edited_at = rng
        .gen_bool(EDITED_RATIO)
        .then(|| created_at + Duration::minutes(rng.gen_range(1..120)));
    Comment {
        id: CommentId(Uuid::new_v4()),
        post_id,
        parent_id,
        author: users.choose(rng).expect("no users").clone(),
        body: match state.is_tombstone() {
            true => String::new(),
            false => gen_body(rng),
        },
        state,
        created_at,
        edited_at,
        reply_count: 0,
        replies: None,
    }
}

fn main() {
    let mut rng = rand::thread_rng();

    let users = (0..NUM_USERS)
        .map(|i| Author {
            id: UserId(Uuid::new_v4()),
            username: format!("user{i}"),
            nickname: rng
                .gen_bool(0.5)
                .then(|| lipsum::lipsum_words(2)),
            avatar_url: None,
        })
        .collect::<Vec<_>>();

    let mut comments = Vec::new();
    for _ in 0..NUM_POSTS {
        let post_id = PostId(Uuid::new_v4());
        let mut time = Utc::now() - Duration::days(30);
        let mut ids = Vec::new();
        for _ in 0..NUM_ROOTS_PER_POST {
            time = time + Duration::minutes(rng.gen_range(1..600));
            let c = gen_comment(&mut rng, &users, post_id, None, time);
            ids.push(c.id);
            comments.push(c);
        }
        for _ in 0..NUM_REPLIES_PER_POST {
            time = time + Duration::minutes(rng.gen_range(1..60));
            let parent = match rng.gen_bool(0.7) {
                true => ids[ids.len().saturating_sub(RECENT_WINDOW)..]
                    .choose(&mut rng)
                    .copied(),
                false => ids.choose(&mut rng).copied(),
            };
            let c = gen_comment(&mut rng, &users, post_id, parent, time);
            ids.push(c.id);
            comments.push(c);
        }
    }

    let dump = DbDump { users, comments };
    println!(
        "{}",
        serde_json::to_string_pretty(&dump).expect("serializing dump")
    );
}
