use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postform::api::ContentApi;
use postform::config::Config;
use postform::constants::MAX_IMAGE_SIZE;
use postform::cooldown::{format_remaining, CooldownTracker};
use postform::models::{AttachedImage, CooldownKey};
use postform::storage::SqliteStore;
use postform::workflow::PostForm;

#[derive(Parser)]
#[command(name = "postform", about = "Post to an imageboard from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new thread, or reply to one with --thread
    Post {
        /// Board code, e.g. "g"
        board: String,

        /// Reply to this thread instead of starting a new one
        #[arg(long)]
        thread: Option<u64>,

        /// Comment text
        #[arg(long, default_value = "")]
        content: String,

        /// Name (optional)
        #[arg(long)]
        name: Option<String>,

        /// Email (optional)
        #[arg(long)]
        email: Option<String>,

        /// Subject (new threads only)
        #[arg(long)]
        subject: Option<String>,

        /// Password used to derive a tripcode server-side
        #[arg(long)]
        tripcode_password: Option<String>,

        /// Attach an image file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Wait out an active cooldown instead of failing
        #[arg(long)]
        wait: bool,
    },

    /// Show the cooldown status for a target
    Status {
        /// Board code, e.g. "g"
        board: String,

        /// Check the reply cooldown for this thread
        #[arg(long)]
        thread: Option<u64>,
    },
}

fn target_key(board: String, thread: Option<u64>) -> CooldownKey {
    match thread {
        Some(thread_no) => CooldownKey::Reply { board, thread_no },
        None => CooldownKey::NewThread { board },
    }
}

fn load_image(path: &Path) -> anyhow::Result<AttachedImage> {
    let bytes = std::fs::read(path)?;
    if bytes.len() > MAX_IMAGE_SIZE {
        anyhow::bail!("Image is too large (max {}MB)", MAX_IMAGE_SIZE / (1024 * 1024));
    }

    let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(AttachedImage { file_name, mime_type, bytes })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let cli = Cli::parse();

    // Durable cooldown store shared by every target
    let store = SqliteStore::new(&config.database_url).await?;
    let tracker = CooldownTracker::new(Arc::new(store), config.policy);

    match cli.command {
        Command::Status { board, thread } => {
            let key = target_key(board, thread);
            let now = chrono::Utc::now().timestamp_millis();
            let status = tracker.status(&key, now).await;

            if status.limited {
                println!(
                    "Rate limited: {} remaining",
                    format_remaining(status.remaining_millis)
                );
            } else {
                println!("Ready to post");
            }
        }

        Command::Post {
            board,
            thread,
            content,
            name,
            email,
            subject,
            tripcode_password,
            image,
            wait,
        } => {
            let api = ContentApi::new(config.api_base_url.clone());
            let key = target_key(board, thread);
            let mut form = PostForm::new(api, tracker, key);

            form.on_posted(|created| {
                tracing::info!(
                    "Post accepted (thread {:?}, post {:?})",
                    created.thread_number,
                    created.post_number
                );
            });

            form.open();
            {
                let draft = form
                    .draft_mut()
                    .ok_or_else(|| anyhow::anyhow!("form is not open"))?;
                draft.content = content;
                if let Some(value) = name {
                    draft.author = value;
                }
                if let Some(value) = email {
                    draft.email = value;
                }
                if let Some(value) = subject {
                    draft.subject = value;
                }
                if let Some(value) = tripcode_password {
                    draft.tripcode_password = value;
                }
                if let Some(path) = image {
                    draft.image = Some(load_image(&path)?);
                }
            }

            if wait {
                let mut countdown = form.countdown().await;
                while countdown.current().limited {
                    eprintln!(
                        "Rate limited: {} remaining",
                        format_remaining(countdown.current().remaining_millis)
                    );
                    if !countdown.changed().await {
                        break;
                    }
                }
            }

            match form.submit().await {
                Ok(outcome) => {
                    println!("Post submitted");
                    if let Some(path) = outcome.redirect {
                        println!("New thread at {}", path);
                    }
                }
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
