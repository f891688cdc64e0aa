// SPDX-License-Identifier: MPL-2.0

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use feedtuner::atproto::{FeedPage, parse_embed};
use feedtuner::config::{LOG_ENV, PUBLIC_APPVIEW};
use feedtuner::feed::{FeedDescriptor, FeedSlice, FeedTuner, SliceReason, TuneOptions, tuners_for};
use feedtuner::link::{RecordLinkView, ResolvedLink, resolve_link};
use feedtuner::{FeedClient, FeedSettings, runtime};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "feedtuner: Bluesky feed tuning and link resolution",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tune saved feed pages in order, as one session would see them.
    Tune {
        /// JSON files holding `{ "feed": [...], "cursor": ... }` responses.
        #[arg(required = true)]
        pages: Vec<PathBuf>,

        #[command(flatten)]
        feed: FeedArgs,

        /// Show what would be displayed without recording anything as seen.
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch live pages of a feed and tune them.
    Fetch {
        #[command(flatten)]
        feed: FeedArgs,

        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Service to talk to; FEEDTUNER_HANDLE and FEEDTUNER_APP_PASSWORD
        /// log in against it, otherwise it must be a public AppView.
        #[arg(long, default_value = PUBLIC_APPVIEW)]
        service: String,
    },

    /// Resolve a link the way the composer would embed it.
    Resolve {
        url: String,

        #[arg(long, default_value = PUBLIC_APPVIEW)]
        service: String,
    },
}

#[derive(clap::Args, Debug)]
struct FeedArgs {
    /// Feed descriptor, e.g. `following` or `feedgen|at://...`.
    #[arg(long, default_value = "following")]
    feed: FeedDescriptor,

    /// Viewer DID, used to decide which replies to show.
    #[arg(long, default_value = "")]
    user: String,

    /// Feed settings file; defaults to the user config directory.
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl FeedArgs {
    fn tuner(&self) -> FeedTuner {
        let settings = match &self.settings {
            Some(path) => FeedSettings::load_from(path),
            None => FeedSettings::load(),
        };
        FeedTuner::new(tuners_for(&self.feed, &settings, &self.user))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Tune {
            pages,
            feed,
            dry_run,
        } => {
            let mut tuner = feed.tuner();
            let options = TuneOptions { dry_run };
            for path in &pages {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let page: FeedPage = serde_json::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?;
                info!(page = %path.display(), items = page.feed.len(), "tuning page");
                print_slices(&tuner.tune(page.feed, options));
            }
        }
        Command::Fetch {
            feed,
            pages,
            service,
        } => {
            let mut tuner = feed.tuner();
            runtime::block_on(async {
                let client = connect(&service).await?;
                let mut cursor: Option<String> = None;
                for n in 0..pages {
                    let page = client.get_feed_page(&feed.feed, cursor.as_deref()).await?;
                    info!(page = n + 1, items = page.feed.len(), "fetched page");
                    print_slices(&tuner.tune(page.feed, TuneOptions::default()));
                    cursor = page.cursor;
                    if cursor.is_none() {
                        break;
                    }
                }
                anyhow::Ok(())
            })?;
        }
        Command::Resolve { url, service } => {
            let client = FeedClient::public_at(&service);
            let resolved = runtime::block_on(resolve_link(&client, &url))?;
            print_resolved(&resolved);
        }
    }

    Ok(())
}

async fn connect(service: &str) -> anyhow::Result<FeedClient> {
    match (env::var("FEEDTUNER_HANDLE"), env::var("FEEDTUNER_APP_PASSWORD")) {
        (Ok(handle), Ok(password)) => {
            let client = FeedClient::with_service(service);
            let session = client.login(&handle, &password).await?;
            info!(did = %session.did, "logged in");
            Ok(client)
        }
        (Ok(_), Err(_)) => bail!("FEEDTUNER_HANDLE is set but FEEDTUNER_APP_PASSWORD is not"),
        _ => Ok(FeedClient::public_at(service)),
    }
}

fn print_slices(slices: &[FeedSlice]) {
    for slice in slices {
        if slice.is_fallback_marker() {
            println!("-- end of feed --");
            continue;
        }

        let mut flags = Vec::new();
        match slice.reason() {
            Some(SliceReason::Repost(repost)) => flags.push(format!("reposted by @{}", repost.by.handle)),
            Some(SliceReason::Pin) => flags.push("pinned".to_string()),
            Some(SliceReason::FeedSource(source)) => flags.push(format!("from {}", source.uri)),
            _ => {}
        }
        if slice.is_incomplete_thread() {
            flags.push("incomplete".to_string());
        }
        if slice.is_orphan() {
            flags.push("orphan".to_string());
        }
        if flags.is_empty() {
            println!("{}", slice.key());
        } else {
            println!("{} [{}]", slice.key(), flags.join(", "));
        }

        for item in slice.items() {
            let text: String = item.record.text.chars().take(60).collect();
            let embed = parse_embed(item.post.embed.as_ref()).kind();
            println!(
                "  @{}: {}{}",
                item.post.author.handle,
                text.replace('\n', " "),
                if embed == "unknown" { String::new() } else { format!(" <{embed}>") }
            );
        }
    }
}

fn print_resolved(resolved: &ResolvedLink) {
    match resolved {
        ResolvedLink::Record { record, view } => {
            println!("{} {} ({})", view.kind(), record.uri, record.cid);
            match view {
                RecordLinkView::Post(post) => println!("  by @{}", post.author.handle),
                RecordLinkView::Feed(feed) => println!("  {}", feed.display_name),
                RecordLinkView::List(list) => println!("  {}", list.name),
                RecordLinkView::StarterPack(pack) => println!("  by @{}", pack.creator.handle),
            }
        }
        ResolvedLink::External {
            uri,
            title,
            description,
            thumb,
        } => {
            println!("external {uri}");
            println!("  title: {title}");
            if !description.is_empty() {
                println!("  description: {description}");
            }
            if let Some(thumb) = thumb {
                println!("  thumb: {}x{} {} bytes", thumb.width, thumb.height, thumb.bytes.len());
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "feedtuner=debug,info"
        } else {
            "feedtuner=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
