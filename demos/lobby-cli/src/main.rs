//! lobby - a terminal client for the session lobby

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lobbyist::prelude::*;

#[derive(Parser)]
#[command(name = "lobby")]
#[command(about = "Log in, list game sessions and act on them from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Lobby service address (overrides LOBBYIST_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Where to keep credentials between runs (overrides LOBBYIST_CREDENTIALS)
    #[arg(long)]
    credentials: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the token pair
    Login {
        /// Username; defaults to the last one used
        username: Option<String>,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the token pair (the username is kept)
    Logout,
    /// List the game kinds a session can be started for
    Games,
    /// Show the session table
    Sessions {
        /// Keep running and print every change until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// Act on a session: join, leave, delete, launch, play or watch
    Act {
        action: String,
        session: String,
    },
    /// Start a new session
    Start {
        game: String,
        /// Savegame to resume
        #[arg(long, default_value = "")]
        savegame: String,
    },
}

/// Default credentials file when neither flag nor environment names one.
const DEFAULT_CREDENTIALS: &str = ".lobbyist-credentials.json";

/// How long to wait for the first session table before giving up.
const FIRST_TABLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Reports navigation requests on stderr.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn reload(&self) {
        eprintln!("session expired, log in again with `lobby login`");
    }

    fn redirect(&self, landing: Landing) {
        match landing {
            Landing::Entry => eprintln!("not logged in, run `lobby login` first"),
            Landing::Lobby => eprintln!("welcome, run `lobby sessions` to see the lobby"),
            Landing::Admin => eprintln!("logged in with an administrator account"),
        }
    }
}

type Client = LobbyClient<HttpTransport, ConfiguredStore, TerminalNavigator>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), LobbyError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(path) = cli.credentials {
        config.credentials_path = Some(path);
    }
    if config.credentials_path.is_none() {
        config.credentials_path = Some(PathBuf::from(DEFAULT_CREDENTIALS));
    }

    let client = LobbyClientBuilder::new()
        .config(config)
        .build(TerminalNavigator)?;

    match cli.command {
        Commands::Login { username, password } => login(&client, username, &password).await,
        Commands::Logout => {
            if !client.logout().await? {
                eprintln!("already logged out");
            }
            Ok(())
        }
        Commands::Games => {
            for game in client.game_services().await? {
                println!("{game}");
            }
            Ok(())
        }
        Commands::Sessions { watch } => sessions(&client, watch).await,
        Commands::Act { action, session } => act(&client, &action, session).await,
        Commands::Start { game, savegame } => {
            client.start_session(&game, &savegame).await?;
            println!("started a {game} session");
            Ok(())
        }
    }
}

async fn login(client: &Client, username: Option<String>, password: &str) -> Result<(), LobbyError> {
    let username = match username {
        Some(name) => name,
        None => match client.prefill_username().await {
            Some(name) => name.to_string(),
            None => return Err(LobbyError::Config("no username given and none remembered".into())),
        },
    };

    match client.login(&username, password).await? {
        LoginOutcome::Accepted => {
            client.forward_to_landing().await?;
        }
        LoginOutcome::Rejected(reason) => eprintln!("login refused: {reason}"),
    }
    Ok(())
}

async fn sessions(client: &Client, watch: bool) -> Result<(), LobbyError> {
    let lobby = client.open_lobby(TextRenderer::new(std::io::stdout())).await?;
    lobby.wait_for_first_render_within(FIRST_TABLE_TIMEOUT).await?;
    if !watch {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = lobby.wait_for_update() => println!(),
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn act(client: &Client, action: &str, session: String) -> Result<(), LobbyError> {
    let Some(action) = Action::parse(action) else {
        return Err(LobbyError::Config(format!("unknown action {action}")));
    };

    let lobby = client.open_lobby(TextRenderer::new(std::io::sink())).await?;
    lobby.wait_for_first_render_within(FIRST_TABLE_TIMEOUT).await?;

    match lobby.trigger(&SessionId(session), action).await? {
        DispatchOutcome::Sent => println!("{action} sent"),
        DispatchOutcome::Navigate(location) => println!("open {location}"),
    }
    Ok(())
}
