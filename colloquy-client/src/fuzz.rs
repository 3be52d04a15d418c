#![cfg(test)]

use std::collections::HashSet;

use crate::{
    api::{CommentId, CommentState},
    project,
    testing::{self, id},
    Comment, Error, Forest, MAX_DISPLAY_DEPTH,
};

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum Op {
    CreateRoot,
    CreateReply { target: u8 },
    Edit { target: u8 },
    Delete { target: u8 },
    Materialize { target: u8, count: u8, reuse: Option<u8> },
}

// Missing comments are targeted once in a while
const MISSING: u8 = u8::MAX;

fn pick(f: &Forest, target: u8) -> CommentId {
    let ids = f.iter().map(|c| c.id).collect::<Vec<_>>();
    match (target, ids.is_empty()) {
        (MISSING, _) | (_, true) => id(999_999),
        (t, false) => ids[t as usize % ids.len()],
    }
}

fn check_projection(f: &Forest) {
    let all = f.iter().map(|c| c.id).collect::<HashSet<_>>();
    let view = project(f, &all);
    assert_eq!(
        view.iter().map(|r| r.comment.id).collect::<Vec<_>>(),
        f.iter().map(|c| c.id).collect::<Vec<_>>(),
        "fully expanded view is the pre-order traversal"
    );
    for r in &view {
        assert!(r.depth <= MAX_DISPLAY_DEPTH);
        assert_eq!(Some(r.true_depth), f.depth_of(&r.comment.id));
        assert_eq!(r.deeper_than_displayed, r.true_depth > MAX_DISPLAY_DEPTH);
    }
    let collapsed = project(f, &());
    assert_eq!(collapsed.len(), f.roots().len());
}

fn check_unique_ids(f: &Forest) {
    let mut seen = HashSet::new();
    for c in f.iter() {
        assert!(seen.insert(c.id), "comment {:?} appears twice", c.id);
        if let Some(children) = c.children() {
            assert!(children.iter().all(|r| r.parent_id == Some(c.id)));
        }
    }
    assert!(f.roots().iter().all(|c| c.parent_id.is_none()));
}

fn apply(f: Forest, op: Op, next_id: &mut u128) -> Forest {
    match op {
        Op::CreateRoot => {
            *next_id += 1;
            let g = f.create_root(testing::comment(*next_id, None)).unwrap();
            assert_eq!(g.roots().len(), f.roots().len() + 1);
            g
        }
        Op::CreateReply { target } => {
            let parent = pick(&f, target);
            *next_id += 1;
            let new = id(*next_id);
            match f.create_reply(&parent, testing::comment(*next_id, None)) {
                Ok(g) => {
                    let before = f.find(&parent).unwrap().reply_count;
                    assert_eq!(g.find(&parent).unwrap().reply_count, before + 1);
                    assert_eq!(g.find(&new).and_then(|c| c.parent_id), Some(parent));
                    assert_eq!(g.len(), f.len() + 1);
                    g
                }
                Err(e) => {
                    assert_eq!(e, Error::NotFound(parent));
                    assert!(!f.contains(&parent));
                    f
                }
            }
        }
        Op::Edit { target } => {
            let target = pick(&f, target);
            let res = f.edit_content(&target, String::from("edited"), testing::time(0));
            match f.find(&target) {
                None => assert_eq!(res, Err(Error::NotFound(target))),
                Some(c) if c.is_tombstone() => assert_eq!(
                    res,
                    Err(Error::InvalidState {
                        id: target,
                        state: c.state,
                    })
                ),
                Some(c) => {
                    let g = res.as_ref().unwrap();
                    let edited = g.find(&target).unwrap();
                    assert_eq!(edited.body, "edited");
                    assert_eq!(edited.replies, c.replies);
                }
            }
            res.unwrap_or(f)
        }
        Op::Delete { target } => {
            let target = pick(&f, target);
            match f.soft_delete(&target) {
                Ok(g) => {
                    let before: &Comment = f.find(&target).unwrap();
                    let after = g.find(&target).unwrap();
                    assert_eq!(after.state, CommentState::Deleted);
                    assert_eq!(after.body, "");
                    assert_eq!(after.replies, before.replies);
                    assert_eq!(g.soft_delete(&target).unwrap(), g);
                    assert_eq!(g.len(), f.len());
                    g
                }
                Err(e) => {
                    assert_eq!(e, Error::NotFound(target));
                    f
                }
            }
        }
        Op::Materialize {
            target,
            count,
            reuse,
        } => {
            let target = pick(&f, target);
            let mut payload = (0..count % 4)
                .map(|_| {
                    *next_id += 1;
                    testing::comment(*next_id, None)
                })
                .collect::<Vec<_>>();
            // Comments already loaded may only come back under their former ancestor
            let reused = reuse.map(|r| pick(&f, r));
            let mut conflict = None;
            if let Some(reused) = reused {
                *next_id += 1;
                payload.push(Comment {
                    id: reused,
                    ..testing::comment(*next_id, None)
                });
                let replaced = f
                    .find(&target)
                    .and_then(|c| c.children())
                    .map(|r| Forest::from_comments(r.iter().cloned().collect()));
                if f.contains(&reused) && !replaced.map_or(false, |r| r.contains(&reused)) {
                    conflict = Some(reused);
                }
            }
            match f.materialize_replies(&target, payload.clone()) {
                Err(e) if f.contains(&target) => {
                    assert_eq!(Some(e), conflict.map(Error::DuplicateId));
                    f
                }
                Ok(g) => {
                    assert_eq!(conflict, None);
                    assert_eq!(g.materialize_replies(&target, payload.clone()).unwrap(), g);
                    let parent = g.find(&target).unwrap();
                    assert_eq!(parent.children().map(|c| c.len()), Some(payload.len()));
                    g
                }
                Err(e) => {
                    assert_eq!(e, Error::NotFound(target));
                    f
                }
            }
        }
    }
}

#[test]
fn random_operations_keep_invariants() {
    bolero::check!()
        .with_type::<Vec<Op>>()
        .cloned()
        .for_each(|ops| {
            let mut f = testing::sample_forest();
            let mut next_id = 1000;
            for op in ops {
                f = apply(f, op, &mut next_id);
                check_unique_ids(&f);
                check_projection(&f);
            }
        })
}
