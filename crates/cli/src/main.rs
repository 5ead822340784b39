use clap::{Parser, Subcommand};
use lib::agent::{run_turn, TurnContext, TurnOptions};
use lib::cancel::CancelToken;
use lib::conversation::{Conversation, Message, Role};
use lib::llm::CompletionClient;
use lib::notify::{NoticeKind, Notifier};
use lib::store::{ChatStore, MemoryStore, MessageRecord, RestStore};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "nexora")]
#[command(about = "Nexora CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: NEXORA_CONFIG_PATH or ~/.nexora/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Chat with Nexora (interactive). Replies are revealed word by word;
    /// Ctrl-C stops the current reply. /new starts a fresh chat, /clear
    /// wipes the current one, /delete removes it, /chats lists chats,
    /// /exit quits.
    Chat {
        /// Config file path (default: NEXORA_CONFIG_PATH or ~/.nexora/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Deep-reasoning mode: complex prompts get step-by-step framing.
        #[arg(long)]
        deep: bool,

        /// Persist chats to the hosted store (needs store config plus
        /// NEXORA_EMAIL and NEXORA_PASSWORD).
        #[arg(long)]
        remote: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("nexora {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, deep, remote }) => {
            if let Err(e) = run_chat(config, deep, remote).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::config::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Prints notices the way the web client shows toasts.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        let kind = match kind {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        };
        eprintln!("[{}] {}", kind, message);
    }
}

fn record_to_message(record: MessageRecord) -> Option<Message> {
    let role = Role::parse(&record.role)?;
    Some(Message {
        id: record.id,
        content: record.content,
        role,
        is_typing: false,
    })
}

/// Pick the most recent chat for the user, or start a new one.
async fn select_chat(store: &dyn ChatStore, user_id: &str) -> anyhow::Result<String> {
    let chats = store
        .list_chats(user_id)
        .await
        .map_err(|e| anyhow::anyhow!("listing chats: {}", e))?;
    if let Some(chat) = chats.into_iter().next() {
        return Ok(chat.id);
    }
    let chat = store
        .create_chat(user_id)
        .await
        .map_err(|e| anyhow::anyhow!("creating chat: {}", e))?;
    Ok(chat.id)
}

async fn load_conversation(
    store: &dyn ChatStore,
    chat_id: String,
) -> anyhow::Result<Conversation> {
    let records = store
        .list_messages(&chat_id)
        .await
        .map_err(|e| anyhow::anyhow!("loading messages: {}", e))?;
    let mut conversation = Conversation::with_chat(chat_id);
    conversation.reset(records.into_iter().filter_map(record_to_message).collect());
    Ok(conversation)
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    deep: bool,
    remote: bool,
) -> anyhow::Result<()> {
    use std::io::{self, BufRead, Write};

    let (config, _path) = lib::config::load_config(config_path)?;
    let endpoint = lib::config::resolve_endpoint(&config);
    let client = CompletionClient::new(endpoint, &config.api);
    let notifier = StderrNotifier;

    let (store, user_id): (Box<dyn ChatStore>, String) = if remote {
        let key = lib::config::resolve_store_key(&config)
            .ok_or_else(|| anyhow::anyhow!("--remote needs store.anonKey or NEXORA_STORE_KEY"))?;
        let email = std::env::var("NEXORA_EMAIL")
            .map_err(|_| anyhow::anyhow!("--remote needs NEXORA_EMAIL"))?;
        let password = std::env::var("NEXORA_PASSWORD")
            .map_err(|_| anyhow::anyhow!("--remote needs NEXORA_PASSWORD"))?;
        let auth = lib::auth::AuthClient::new(&config.store, key.clone());
        let session = auth
            .sign_in(&email, &password)
            .await
            .map_err(|e| anyhow::anyhow!("sign-in failed: {}", e))?;
        log::info!("signed in as {}", session.user_id);
        (
            Box::new(RestStore::new(&config.store, key, session.access_token)),
            session.user_id,
        )
    } else {
        (Box::new(MemoryStore::new()), "local".to_string())
    };

    let chat_id = select_chat(store.as_ref(), &user_id).await?;
    let mut conversation = load_conversation(store.as_ref(), chat_id).await?;
    for message in conversation.messages() {
        println!("{}: {}", message.role.as_str(), message.content);
    }

    let mut rng = StdRng::from_entropy();
    let opts = TurnOptions { deep_mode: deep };
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if input.eq_ignore_ascii_case("/new") {
            let chat = store
                .create_chat(&user_id)
                .await
                .map_err(|e| anyhow::anyhow!("creating chat: {}", e))?;
            conversation = Conversation::with_chat(chat.id);
            println!("(new chat)");
            continue;
        }
        if input.eq_ignore_ascii_case("/clear") {
            if let Some(chat_id) = conversation.chat_id() {
                if let Err(e) = store.clear_messages(chat_id).await {
                    log::warn!("clearing chat failed: {}", e);
                    continue;
                }
                if let Err(e) = store.rename_chat(chat_id, lib::store::NEW_CHAT_TITLE).await {
                    log::warn!("resetting chat title failed: {}", e);
                }
            }
            conversation.clear();
            notifier.notify(NoticeKind::Success, "Chat berhasil dihapus");
            continue;
        }
        if input.eq_ignore_ascii_case("/delete") {
            if let Some(chat_id) = conversation.chat_id().map(str::to_string) {
                if let Err(e) = store.delete_chat(&chat_id).await {
                    log::warn!("deleting chat failed: {}", e);
                    continue;
                }
                let next = select_chat(store.as_ref(), &user_id).await?;
                conversation = load_conversation(store.as_ref(), next).await?;
                notifier.notify(NoticeKind::Success, "Chat dihapus");
            }
            continue;
        }
        if input.eq_ignore_ascii_case("/chats") {
            match store.list_chats(&user_id).await {
                Ok(chats) => {
                    for chat in chats {
                        println!("{}  {}", chat.id, chat.title);
                    }
                }
                Err(e) => log::warn!("listing chats failed: {}", e),
            }
            continue;
        }

        let cancel = CancelToken::new();
        let mut shown = 0usize;
        let mut on_word = |acc: &str| {
            print!("{}", &acc[shown..]);
            io::stdout().flush().ok();
            shown = acc.len();
        };

        let outcome = {
            let ctx = TurnContext {
                config: &config,
                client: &client,
                store: store.as_ref(),
                notifier: &notifier,
                user_id: Some(&user_id),
            };
            let turn = run_turn(
                &ctx,
                &mut conversation,
                input,
                opts,
                &cancel,
                &mut rng,
                Some(&mut on_word),
            );
            tokio::pin!(turn);
            loop {
                tokio::select! {
                    out = &mut turn => break out,
                    _ = tokio::signal::ctrl_c() => cancel.cancel(),
                }
            }
        };
        if shown > 0 {
            println!();
        }
        if let Err(e) = outcome {
            log::debug!("turn not started: {}", e);
        }
    }

    Ok(())
}
