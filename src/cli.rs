// command line interface

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing::info;

use crate::client::RelayClient;
use crate::config::{Config, RelayConfig};
use crate::core::{Ai, Provider, SafetyClassifier, Verdict};
use crate::{Relay, Server};

#[derive(Parser)]
#[command(
    name = "chatguard",
    about = "Chat relay that warns you before you overshare"
)]
struct Cli {
    /// ai provider used to screen messages (claude, openai)
    #[arg(
        long,
        short = 'p',
        env = "CHATGUARD_PROVIDER",
        default_value = "claude",
        global = true
    )]
    provider: Provider,

    /// api key for the ai provider
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    /// model override, defaults to the provider's pick
    #[arg(long, global = true)]
    model: Option<String>,

    /// seconds to wait for one screening attempt
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    /// extra screening attempts after a failure
    #[arg(long, default_value = "0", global = true)]
    retries: u32,

    /// reject messages longer than this many bytes
    #[arg(long, global = true)]
    max_text_bytes: Option<usize>,

    /// log filter when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// log as json lines
    #[arg(long, global = true)]
    log_json: bool,

    /// relay to chat through
    #[arg(long, short, env = "CHATGUARD_SERVER", default_value = "http://127.0.0.1:5123")]
    server: String,

    /// name shown next to your messages
    #[arg(long, short, env = "USER", default_value = "anonymous")]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// start the chat relay
    Serve {
        /// port number
        #[arg(long, env = "PORT", default_value = "5123")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// screen one message and print the verdict
    Check {
        /// message text
        text: String,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            provider: self.provider,
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            relay: RelayConfig {
                max_text_bytes: self.max_text_bytes,
                classify_timeout: Duration::from_secs(self.timeout_secs),
                classify_retries: self.retries,
            },
            log_level: self.log_level.clone(),
            log_json: self.log_json,
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.config();

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            cfg.init_tracing();

            let ai = Ai::new(cfg.provider, cfg.api_key.clone(), cfg.model.clone())?;
            info!(
                provider = cfg.provider.name(),
                model = ai.model(),
                version = env!("CARGO_PKG_VERSION"),
                "starting chat relay"
            );

            let relay = Relay::new(Arc::new(ai), &cfg.relay);
            Ok(Server::run(relay, &host, port).await?)
        }

        Some(Commands::Check { text }) => {
            cfg.init_tracing();

            let ai = Ai::new(cfg.provider, cfg.api_key.clone(), cfg.model.clone())?;
            let classifier = SafetyClassifier::new(Arc::new(ai), &cfg.relay);

            match classifier.classify(&text).await {
                Verdict::Safe => println!("SAFE"),
                Verdict::Warning { text } => println!("WARNING: {}", text.trim()),
                Verdict::ClassificationFailed { reason } => {
                    println!("FAILED: could not screen message ({reason})")
                }
            }
            Ok(())
        }

        None => {
            // tui owns the terminal, so no tracing subscriber here
            let client = RelayClient::new(&cli.server);
            Ok(crate::tui::run(client, cli.user).await?)
        }
    }
}
