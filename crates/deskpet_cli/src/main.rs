mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{Command, HELP};
use deskpet_core::{Expression, PetConfig, Signal, SpeechDisplay};
use deskpet_expression::{
    run_camera, CameraWatch, CooldownGate, FrameObservation, RouterConfig, RouterHandle,
    SignalRouter, SpeechDispatcher,
};
use deskpet_limbic::{BehaviorStore, HeartbeatConfig, TransientConfig};
use deskpet_memory::RewardLedger;
use deskpet_reasoning::{create_generator, ChatResponder, CHAT_GREETING};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "deskpet.toml", env = "DESKPET_CONFIG")]
    config: PathBuf,

    /// Directory holding the reward ledger (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Text generator: ollama, ollama_cli or mock (overrides config)
    #[arg(long)]
    provider: Option<String>,

    /// Model name (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Name the pet answers to
    #[arg(long, default_value = "Mochi")]
    name: String,

    /// Disable the camera signal source
    #[arg(long)]
    no_camera: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Speech bubble stand-in: prints the line.
struct TerminalBubble;

impl SpeechDisplay for TerminalBubble {
    fn show(&self, text: &str, _duration_ms: u64) {
        println!("🐱💬 {}", text);
    }
}

struct App {
    router: Arc<SignalRouter>,
    handle: RouterHandle,
    frames: Option<mpsc::Sender<FrameObservation>>,
    chat: Arc<ChatResponder>,
    speech: SpeechDispatcher,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_json);

    let mut config = PetConfig::load_or_default(&args.config);
    if let Some(dir) = args.data_dir {
        config.rewards.data_dir = dir;
    }
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if args.no_camera {
        config.camera.enabled = false;
    }

    info!("Waking up {}...", args.name);

    let ledger = Arc::new(
        RewardLedger::open(&config.rewards.data_dir).with_context(|| {
            format!(
                "Failed to open reward ledger in {}",
                config.rewards.data_dir.display()
            )
        })?,
    );
    info!(dir = %ledger.dir().display(), "Reward ledger ready");
    let generator = create_generator(&config.llm)?;
    let display: Arc<dyn SpeechDisplay> = Arc::new(TerminalBubble);
    let speech = SpeechDispatcher::spawn(generator.clone(), display, &config.speech);
    let gate = Arc::new(CooldownGate::new(config.speech.cooldown()));

    let router = Arc::new(SignalRouter::new(
        RouterConfig::new(&config.engine, &config.milestones),
        BehaviorStore::new(TransientConfig::from_engine(&config.engine)),
        ledger,
        gate.clone(),
        speech.clone(),
    ));

    info!(reversion = ?router.store().policy(), "Behavior store ready");
    let mut states = router.store().subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            info!(state = %state, "pet state");
        }
    });

    let handle = router.spawn(HeartbeatConfig::from_engine(&config.engine));

    let frames = if config.camera.enabled {
        let (tx, rx) = mpsc::channel(32);
        let watch = CameraWatch::new(&config.camera, Instant::now());
        tokio::spawn(run_camera(
            rx,
            watch,
            router.clone(),
            gate,
            speech.clone(),
        ));
        Some(tx)
    } else {
        info!("Camera disabled");
        None
    };

    let app = App {
        router,
        handle,
        frames,
        chat: Arc::new(
            ChatResponder::new(generator, &args.name).with_timeout(config.llm.timeout()),
        ),
        speech,
    };

    // Blocking stdin reads live on their own thread, like a keyboard hook
    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("{} is on your desk. {}", args.name, CHAT_GREETING);
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                if !app.execute(commands::parse(&line)).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down...");
    app.handle.shutdown().await;
    Ok(())
}

impl App {
    /// Run one command. Returns false when the user asked to quit.
    async fn execute(&self, command: Command) -> bool {
        match command {
            Command::Key => {
                self.send(Signal::KeyPressed(Instant::now())).await;
            }
            Command::Pat => self.send(Signal::Pat).await,
            Command::Smile => self.send(Signal::ExpressionObserved(Expression::Smile)).await,
            Command::Frame(frame) => match &self.frames {
                Some(tx) => {
                    if tx.send(frame).await.is_err() {
                        warn!("Camera task is gone");
                    }
                }
                None => println!("The camera is disabled."),
            },
            Command::Chat(message) => {
                // Replies arrive in the background so typing and /quit stay responsive
                let chat = Arc::clone(&self.chat);
                let speech = self.speech.clone();
                tokio::spawn(async move {
                    let reply = chat.reply(&message).await;
                    speech.announce(&reply);
                });
            }
            Command::Stats => match self.router.ledger().stats() {
                Ok(stats) => println!(
                    "⭐ Level {} | XP {}/100 | 🔥 Streak {} | last focus {}",
                    stats.level,
                    stats.xp,
                    stats.streak,
                    if stats.last_focus_date.is_empty() {
                        "never"
                    } else {
                        stats.last_focus_date.as_str()
                    }
                ),
                Err(e) => warn!("Failed to read stats: {}", e),
            },
            Command::Quests => match self.router.ledger().quests() {
                Ok(quests) => {
                    for (id, done) in quests {
                        let reward = self.router.ledger().quest_reward(&id).unwrap_or(0);
                        println!("{} {} (+{} xp)", if done { "✅" } else { "⬜" }, id, reward);
                    }
                }
                Err(e) => warn!("Failed to read quests: {}", e),
            },
            Command::Unlocks => match self.router.ledger().unlocks() {
                Ok(unlocks) => {
                    for (category, items) in unlocks {
                        println!("{}: {}", category, items.join(", "));
                    }
                }
                Err(e) => warn!("Failed to read unlocks: {}", e),
            },
            Command::Unlock { category, name } => {
                match self.router.ledger().unlock_item(&category, &name) {
                    Ok(true) => println!("Unlocked {} {} 🎁", category, name),
                    Ok(false) => println!("Nothing new to unlock."),
                    Err(e) => warn!("Failed to unlock item: {}", e),
                }
            }
            Command::ResetQuests => match self.router.ledger().reset_daily_quests() {
                Ok(()) => println!("Daily quests reset."),
                Err(e) => warn!("Failed to reset quests: {}", e),
            },
            Command::State => {
                let state = self.router.store().get_state();
                match self.router.focus_elapsed(Instant::now()) {
                    Some(elapsed) => {
                        println!("{} (focused for {}s)", state, elapsed.as_secs())
                    }
                    None => println!("{}", state),
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Invalid(message) => println!("{}", message),
        }
        true
    }

    async fn send(&self, signal: Signal) {
        if !self.handle.send(signal).await {
            warn!("Monitor loop is not running");
        }
    }
}
