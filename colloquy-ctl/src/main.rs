use std::path::PathBuf;

use anyhow::{anyhow, Context};
use colloquy_client::{
    api::{CommentId, CommentState, PostId, Uuid},
    DisplayRecord, Expansion, Thread,
};
use colloquy_mock_server::{DbDump, MockServer};

#[derive(structopt::StructOpt)]
struct Opt {
    /// JSON dump of the comment database
    #[structopt(short, long, env = "COLLOQUY_DATA", parse(from_os_str))]
    data: PathBuf,

    /// Post whose comments to use, defaults to the post of the first comment
    #[structopt(short, long)]
    post: Option<Uuid>,

    /// Username to act as
    #[structopt(short, long, env = "COLLOQUY_USER")]
    user: Option<String>,

    /// Number of root comments fetched at once
    #[structopt(long, default_value = "20")]
    page_size: usize,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Display the comment thread
    Show {
        /// Load and expand all replies
        #[structopt(long)]
        expand_all: bool,

        /// Comments whose replies to expand
        #[structopt(long)]
        expand: Vec<Uuid>,
    },

    /// Post a new comment, or a reply if a parent is given
    Post {
        #[structopt(long)]
        parent: Option<Uuid>,

        body: String,
    },

    /// Edit one of your comments
    Edit { id: Uuid, body: String },

    /// Delete one of your comments
    Delete { id: Uuid },

    /// Hide a comment as a moderator
    Block { id: Uuid },
}

impl Command {
    fn modifies_comments(&self) -> bool {
        !matches!(self, Command::Show { .. })
    }
}

fn load_dump(path: &PathBuf) -> anyhow::Result<MockServer> {
    let data = std::fs::read(path).with_context(|| format!("reading {path:?}"))?;
    let dump: DbDump =
        serde_json::from_slice(&data).with_context(|| format!("parsing dump {path:?}"))?;
    MockServer::from_dump(dump).with_context(|| format!("loading dump {path:?}"))
}

fn save_dump(path: &PathBuf, server: &MockServer) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(&server.dump()).context("serializing dump")?;
    std::fs::write(path, data).with_context(|| format!("writing {path:?}"))
}

/// Load every root comment and every reply, expanding them all
async fn expand_all(thread: &mut Thread<MockServer>) -> anyhow::Result<()> {
    while thread.load_more_roots().await? > 0 {}
    loop {
        let todo = thread
            .view()
            .iter()
            .filter(|r| r.has_replies_toggle() && !r.replies_visible)
            .map(|r| r.comment.id)
            .collect::<Vec<_>>();
        if todo.is_empty() {
            return Ok(());
        }
        for id in todo {
            thread.toggle_replies(id).await?;
        }
    }
}

fn render(r: &DisplayRecord<'_>) -> String {
    let c = r.comment;
    let mut res = "    ".repeat(r.depth);
    if r.is_reply() {
        res.push_str("↳ ");
    }
    if r.deeper_than_displayed {
        res.push_str(&format!("(+{}) ", r.true_depth - r.depth));
    }
    res.push_str(&format!(
        "{} [{}] {}",
        c.author.display_name(),
        c.id.0,
        c.created_at.format("%Y-%m-%d %H:%M")
    ));
    if c.is_edited() {
        res.push_str(" (edited)");
    }
    res.push_str(": ");
    match c.state {
        CommentState::Active => res.push_str(&c.body.replace('\n', " ")),
        CommentState::Deleted => res.push_str("<deleted>"),
        CommentState::Blocked => res.push_str("<hidden by a moderator>"),
    }
    if r.has_replies_toggle() && !r.replies_visible {
        res.push_str(&format!(" [{} replies]", c.reply_count));
    }
    res
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut server = load_dump(&opt.data)?;
    let post = match opt.post {
        Some(p) => PostId(p),
        None => server
            .dump()
            .comments
            .first()
            .map(|c| c.post_id)
            .ok_or_else(|| anyhow!("no comment in dump, please specify --post"))?,
    };
    let viewer = match &opt.user {
        None => None,
        Some(name) => {
            let id = server
                .user(name)
                .map(|u| u.id)
                .ok_or_else(|| anyhow!("no user named {name:?}"))?;
            server.login(id);
            Some(id)
        }
    };
    tracing::debug!(?post, ?viewer, "starting");

    let mut thread = Thread::new(server, post, viewer, opt.page_size.max(1));
    thread.refresh().await?;

    // Comments must be loaded before they can be modified
    let mutated = opt.cmd.modifies_comments();
    if mutated {
        expand_all(&mut thread).await?;
    }
    match opt.cmd {
        Command::Show {
            expand_all: true, ..
        } => expand_all(&mut thread).await?,
        Command::Show { expand, .. } => {
            while thread.load_more_roots().await? > 0 {}
            for id in expand {
                let id = CommentId(id);
                if !thread.view_state().replies_visible(&id) {
                    thread.toggle_replies(id).await?;
                }
            }
        }
        Command::Post { parent: None, body } => {
            thread.post_comment(body).await?;
        }
        Command::Post {
            parent: Some(parent),
            body,
        } => {
            thread.reply(CommentId(parent), body).await?;
        }
        Command::Edit { id, body } => thread.edit(CommentId(id), body).await?,
        Command::Delete { id } => thread.delete(CommentId(id)).await?,
        Command::Block { id } => {
            thread
                .fetcher_mut()
                .block_comment(CommentId(id))
                .with_context(|| format!("blocking comment {id}"))?;
            thread.refresh().await?;
            expand_all(&mut thread).await?;
        }
    }

    if mutated {
        save_dump(&opt.data, thread.fetcher())?;
    }

    for r in thread.view() {
        println!("{}", render(&r));
    }
    let shown = thread.view().len();
    let loaded = thread.forest().len();
    if shown < loaded {
        println!("({} of {} loaded comments shown)", shown, loaded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use structopt::StructOpt;

    use super::*;

    fn parse(args: &[&str]) -> Opt {
        Opt::from_iter_safe(["colloquy-ctl", "--data", "dump.json"].iter().chain(args))
            .expect("parsing arguments")
    }

    #[test]
    fn only_show_leaves_the_dump_alone() {
        let id = Uuid::new_v4().to_string();
        assert!(!parse(&["show"]).cmd.modifies_comments());
        assert!(!parse(&["show", "--expand-all"]).cmd.modifies_comments());
        assert!(!parse(&["show", "--expand", &id]).cmd.modifies_comments());
        assert!(parse(&["post", "hello"]).cmd.modifies_comments());
        assert!(parse(&["post", "--parent", &id, "hello"]).cmd.modifies_comments());
        assert!(parse(&["edit", &id, "hello"]).cmd.modifies_comments());
        assert!(parse(&["delete", &id]).cmd.modifies_comments());
        assert!(parse(&["block", &id]).cmd.modifies_comments());
    }

    #[test]
    fn show_arguments() {
        let id = Uuid::new_v4();
        let opt = parse(&["--page-size", "5", "show", "--expand", &id.to_string()]);
        assert_eq!(opt.page_size, 5);
        assert_eq!(opt.data, PathBuf::from("dump.json"));
        match opt.cmd {
            Command::Show { expand_all, expand } => {
                assert!(!expand_all);
                assert_eq!(expand, vec![id]);
            }
            _ => panic!("expected the show command"),
        }
    }
}
