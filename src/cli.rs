use crate::auth::{AuthState, Authenticator, Credentials};
use crate::browser::ChromiumFactory;
use crate::config::{Config, ConfigOverrides};
use crate::output::{self, OutputFormatter};
use crate::publish::{Audience, PublishRequest, Schedule};
use crate::session::SessionStore;
use crate::wait::WaitOptions;
use crate::{PilotError, Result, discover, identity, publish};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "feedpilot")]
#[command(version, about = "Human-paced browser automation client for social feeds")]
#[command(
    long_about = "Authenticates an identity against a social-media web application, reusing \
persisted sessions when possible, and drives paced discovery and publish workflows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Run the browser headless")]
    pub headless: Option<bool>,

    #[arg(long, global = true, help = "Path to browser executable")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, global = true, help = "Session storage directory")]
    pub session_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authenticate an identity, reusing its cached session when usable
    Login {
        /// Identity (e.g. username) to authenticate
        identity: String,

        #[arg(long, env = "FEEDPILOT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(
            long,
            help = "Abort the login after this many seconds instead of waiting indefinitely"
        )]
        timeout: Option<u64>,
    },

    /// Authenticate, then harvest reference links from a tag listing
    Search {
        /// Tag to search, without the leading '#'
        tag: String,

        #[arg(long)]
        identity: String,

        #[arg(long, env = "FEEDPILOT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Authenticate, then run the publish workflow for a media file
    Publish {
        /// Media file to upload
        file: PathBuf,

        #[arg(long)]
        identity: String,

        #[arg(long, env = "FEEDPILOT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, help = "public, friends, or private")]
        audience: Option<Audience>,

        #[arg(long, requires = "schedule_time", help = "Schedule date, site-local format")]
        schedule_date: Option<String>,

        #[arg(long, requires = "schedule_date", help = "Schedule time, site-local format")]
        schedule_time: Option<String>,

        #[arg(
            long,
            help = "Abort the workflow after this many seconds instead of waiting indefinitely"
        )]
        timeout: Option<u64>,
    },

    /// Show the resolved configuration
    Config,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        let content = std::fs::read_to_string(config_path)?;
        toml::from_str(&content)?
    } else {
        Config::load()?
    };

    let overrides = ConfigOverrides {
        headless: cli.headless,
        chrome_path: cli.chrome_path.clone(),
        session_dir: cli.session_dir.clone(),
    };

    let config = config.load_with_overrides(overrides);
    config.validate()?;

    dispatch(cli, config).await
}

async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Login {
            identity,
            password,
            timeout,
        } => {
            let mut auth = build_authenticator(config)?;
            let state = auth
                .authenticate_with(
                    &Credentials::new(identity.as_str(), password),
                    deadline_opts(timeout),
                )
                .await?;

            let session_path = auth
                .store()
                .record_path(&identity::storage_key(&identity));
            let result = LoginResult {
                identity,
                state,
                session_path: session_path.display().to_string(),
            };
            output::print_output(&result, cli.json)
        }

        Command::Search {
            tag,
            identity,
            password,
        } => {
            let mut auth = build_authenticator(config)?;
            let state = auth
                .authenticate(&Credentials::new(identity, password))
                .await?;
            if state != AuthState::Authenticated {
                return Err(PilotError::NotAuthenticated);
            }

            let references = discover::search_tag(&auth, &tag).await?;
            let result = SearchResult { tag, references };
            output::print_output(&result, cli.json)
        }

        Command::Publish {
            file,
            identity,
            password,
            description,
            audience,
            schedule_date,
            schedule_time,
            timeout,
        } => {
            let mut auth = build_authenticator(config)?;
            let state = auth
                .authenticate(&Credentials::new(identity, password))
                .await?;
            if state != AuthState::Authenticated {
                return Err(PilotError::NotAuthenticated);
            }

            let schedule = match (schedule_date, schedule_time) {
                (Some(date), Some(time)) => Some(Schedule { date, time }),
                _ => None,
            };
            let request = PublishRequest {
                media_path: file,
                description,
                audience,
                schedule,
            };

            let outcome = publish::publish_with(&auth, &request, deadline_opts(timeout)).await?;
            output::print_output(&outcome, cli.json)
        }

        Command::Config => {
            println!("{}", config.show_masked());
            Ok(())
        }
    }
}

fn deadline_opts(timeout_secs: Option<u64>) -> WaitOptions {
    match timeout_secs {
        Some(secs) => WaitOptions::with_deadline(Duration::from_secs(secs)),
        None => WaitOptions::unbounded(),
    }
}

fn build_authenticator(config: Config) -> Result<Authenticator<ChromiumFactory>> {
    let store = SessionStore::new(
        config.session.resolve_base_dir()?,
        config.session.cookies_file.clone(),
    );
    let factory = ChromiumFactory::new(config.clone());
    Ok(Authenticator::new(factory, store, config))
}

#[derive(Debug, Serialize)]
struct LoginResult {
    identity: String,
    state: AuthState,
    session_path: String,
}

impl OutputFormatter for LoginResult {
    fn format_text(&self) -> String {
        use crate::output::text;
        let headline = match self.state {
            AuthState::Authenticated => text::success(&format!("Authenticated: {}", self.identity)),
            AuthState::Failed => text::warning(&format!(
                "Login not accepted for {}; the browser window may still need manual steps",
                self.identity
            )),
            _ => text::error(&format!("Login ended in state {}", self.state)),
        };
        format!(
            "{}\n{}\n{}",
            headline,
            text::key_value("State", &self.state.to_string()),
            text::key_value("Session", &self.session_path)
        )
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

#[derive(Debug, Serialize)]
struct SearchResult {
    tag: String,
    references: Vec<String>,
}

impl OutputFormatter for SearchResult {
    fn format_text(&self) -> String {
        use crate::output::text;
        let mut lines = vec![text::success(&format!(
            "Found {} references for #{}",
            self.references.len(),
            self.tag
        ))];
        for reference in &self.references {
            lines.push(text::bullet(&text::truncate(reference, 100)));
        }
        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}
