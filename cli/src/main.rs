//! `portal-cli`: drive the portal session and REST API from a terminal.
//!
//! The CLI owns a [`SessionController`] backed by `reqwest` and a token file,
//! so `login` here behaves exactly like the web client's login form and later
//! commands reuse the persisted bearer token.

mod http;
mod token_file;


use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use portal::endpoints::{self, Audience, ClientProjectRequest, ClientProjectUpdate, ContactMessage, Endpoint, ProjectStatus};
use portal::guard::{self, GuardDecision};
use portal::types::SignupProfile;
use portal::{ApiError, AuthFailure, ConfigError, PortalConfig, Role, SessionController, SessionView};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use crate::http::{DEFAULT_TIMEOUT_SECS, HttpApi};
use crate::token_file::FileTokenStore;

type Session = SessionController<HttpApi, FileTokenStore>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("{0}")]
    Auth(#[from] AuthFailure),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("not logged in; run `portal-cli login` first")]
    NotLoggedIn,
    #[error("{path} requires the admin role (current: {current})")]
    Forbidden { path: String, current: Role },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal-cli", about = "Agency portal session and API CLI")]
struct Cli {
    #[arg(long, env = "PORTAL_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PORTAL_ADMIN_DOMAIN", help = "Email domain treated as admin when the server omits a role")]
    admin_domain: Option<String>,

    #[arg(long, env = "PORTAL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange email and password for a session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a client account and start a session.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session token.
    Logout,
    /// Verify the stored token and print the session.
    Whoami,
    /// Show where the route guard sends the current session for a path.
    Route { path: String },
    Projects(ProjectsCommand),
    Services(ServicesCommand),
    Contact(ContactCommand),
    Requests(RequestsCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct ProjectsCommand {
    #[command(subcommand)]
    command: ProjectsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectsSubcommand {
    List {
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Show {
        slug: String,
    },
}

#[derive(Args, Debug)]
struct ServicesCommand {
    #[command(subcommand)]
    command: ServicesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ServicesSubcommand {
    List,
}

#[derive(Args, Debug)]
struct ContactCommand {
    #[command(subcommand)]
    command: ContactSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContactSubcommand {
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        timeline: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RequestsCommand {
    #[command(subcommand)]
    command: RequestsSubcommand,
}

/// Client project requests owned by the logged-in client.
#[derive(Subcommand, Debug)]
enum RequestsSubcommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        budget: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Requests {
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    Request {
        id: String,
    },
    UpdateRequest {
        id: String,
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        deployment_url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Messages,
    Message {
        id: String,
    },
    DeleteMessage {
        id: String,
    },
    CreateProject {
        #[arg(long)]
        data: String,
    },
    UpdateProject {
        id: String,
        #[arg(long)]
        data: String,
    },
    DeleteProject {
        id: String,
    },
    CreateService {
        #[arg(long)]
        data: String,
    },
    UpdateService {
        id: String,
        #[arg(long)]
        data: String,
    },
    DeleteService {
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let token_key = std::env::var("PORTAL_TOKEN_KEY").ok();
    let config = PortalConfig::from_values(cli.base_url.as_deref(), cli.admin_domain.as_deref(), token_key.as_deref())?;
    let token_path = cli
        .token_file
        .clone()
        .unwrap_or_else(|| FileTokenStore::default_path(&config.token_key));
    tracing::debug!(base_url = %config.api_base_url, token_file = %token_path.display(), "cli configured");

    let api = HttpApi::new(&config.api_base_url, Duration::from_secs(cli.timeout_secs))?;
    let session = SessionController::new(api, FileTokenStore::new(token_path), config.role_policy());

    run(&session, cli.command).await
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(session: &Session, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            eprintln!("logged in as {} ({})", user.email, user.role);
            print_json(&json!(user))
        }
        Command::Signup { name, email, password } => {
            let user = session.signup(SignupProfile { name, email, password }).await?;
            eprintln!("signed up as {} ({})", user.email, user.role);
            print_json(&json!(user))
        }
        Command::Logout => {
            session.logout();
            eprintln!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let view = session.bootstrap().await;
            print_json(&view_json(&view))
        }
        Command::Route { path } => {
            let view = session.bootstrap().await;
            let resolution = guard::resolve(view.guard_state(), &path);
            let decision = match resolution.decision {
                GuardDecision::Loading => "loading",
                GuardDecision::Render => "render",
                GuardDecision::Redirect(_) => "redirect",
            };
            print_json(&json!({
                "requested": guard::normalize_path(&path),
                "resolved": resolution.path,
                "decision": decision,
                "redirects": resolution.hops,
            }))
        }
        Command::Projects(cmd) => match cmd.command {
            ProjectsSubcommand::List { featured, limit } => call(session, endpoints::list_projects(featured, limit), None).await,
            ProjectsSubcommand::Show { slug } => call(session, endpoints::project_by_slug(&slug), None).await,
        },
        Command::Services(cmd) => match cmd.command {
            ServicesSubcommand::List => call(session, endpoints::list_services(), None).await,
        },
        Command::Contact(cmd) => match cmd.command {
            ContactSubcommand::Send { name, email, message, budget, timeline } => {
                let body = json!(ContactMessage { name, email, message, budget, timeline });
                call(session, endpoints::send_contact_message(), Some(body)).await
            }
        },
        Command::Requests(cmd) => run_requests(session, cmd.command).await,
        Command::Admin(cmd) => run_admin(session, cmd.command).await,
    }
}

async fn run_requests(session: &Session, command: RequestsSubcommand) -> Result<(), CliError> {
    match command {
        RequestsSubcommand::List => call(session, endpoints::my_client_projects(), None).await,
        RequestsSubcommand::Show { id } => call(session, endpoints::client_project(&id), None).await,
        RequestsSubcommand::Create { title, description, budget } => {
            let body = json!(ClientProjectRequest {
                project_title: title,
                project_description: description,
                estimated_budget: budget,
            });
            call(session, endpoints::create_client_project(), Some(body)).await
        }
    }
}

async fn run_admin(session: &Session, command: AdminSubcommand) -> Result<(), CliError> {
    match command {
        AdminSubcommand::Requests { status } => call(session, endpoints::admin_client_projects(status), None).await,
        AdminSubcommand::Request { id } => call(session, endpoints::admin_client_project(&id), None).await,
        AdminSubcommand::UpdateRequest { id, status, deployment_url, notes } => {
            let body = json!(ClientProjectUpdate { status, deployment_url, notes_from_admin: notes });
            call(session, endpoints::admin_update_client_project(&id), Some(body)).await
        }
        AdminSubcommand::Messages => call(session, endpoints::admin_messages(), None).await,
        AdminSubcommand::Message { id } => call(session, endpoints::admin_message(&id), None).await,
        AdminSubcommand::DeleteMessage { id } => call(session, endpoints::admin_delete_message(&id), None).await,
        AdminSubcommand::CreateProject { data } => {
            call(session, endpoints::admin_create_project(), Some(parse_data(&data)?)).await
        }
        AdminSubcommand::UpdateProject { id, data } => {
            call(session, endpoints::admin_update_project(&id), Some(parse_data(&data)?)).await
        }
        AdminSubcommand::DeleteProject { id } => call(session, endpoints::admin_delete_project(&id), None).await,
        AdminSubcommand::CreateService { data } => {
            call(session, endpoints::admin_create_service(), Some(parse_data(&data)?)).await
        }
        AdminSubcommand::UpdateService { id, data } => {
            call(session, endpoints::admin_update_service(&id), Some(parse_data(&data)?)).await
        }
        AdminSubcommand::DeleteService { id } => call(session, endpoints::admin_delete_service(&id), None).await,
    }
}

/// Send a resource request, attaching the session token when the endpoint
/// needs one and refusing locally when the role cannot reach it.
async fn call(session: &Session, endpoint: Endpoint, body: Option<Value>) -> Result<(), CliError> {
    let token = if endpoint.requires_token() {
        let view = session.bootstrap().await;
        authorize(&view, &endpoint)?;
        Some(session.token().ok_or(CliError::NotLoggedIn)?)
    } else {
        None
    };
    let json = session.api().send(&endpoint, token.as_deref(), body.as_ref()).await?;
    print_json(&json)
}

fn authorize(view: &SessionView, endpoint: &Endpoint) -> Result<(), CliError> {
    match (endpoint.audience, view.role()) {
        (Audience::Public, _) => Ok(()),
        (_, None) => Err(CliError::NotLoggedIn),
        (Audience::Admin, Some(current @ Role::Client)) => Err(CliError::Forbidden {
            path: endpoint.path.clone(),
            current,
        }),
        _ => Ok(()),
    }
}

fn view_json(view: &SessionView) -> Value {
    json!({
        "authenticated": view.is_authenticated(),
        "role": view.role(),
        "user": view.user,
    })
}

fn parse_data(data: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str::<Value>(data)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
