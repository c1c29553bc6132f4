/// Accounts Server - user accounts over HTTP
use accounts_core::{AccountStore, ListUsersParams};
use accounts_server::{
    api,
    config::ServerConfig,
    services::users::AccountRequest,
    state::AppState,
};
use accounts_storage::LocalStorageContext;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "accounts-server")]
#[command(about = "User accounts service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a new user
    AddUser {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        age: i64,
        /// Extra role to grant (name or ordinal)
        #[arg(short, long)]
        role: Option<String>,
    },
    /// List users
    ListUsers {
        #[arg(long, default_value_t = 0)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Delete expired access tokens
    PurgeTokens,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "accounts_server=info,accounts_storage=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::AddUser {
            name,
            email,
            password,
            age,
            role,
        } => {
            let req = AccountRequest {
                name,
                email,
                password,
                age,
            };
            add_user(config, req, role.as_deref()).await?;
        }
        Commands::ListUsers {
            limit,
            offset,
            order_by,
            sort,
            filter,
        } => {
            let params = ListUsersParams {
                limit,
                offset,
                order_by,
                sort,
                filter,
            };
            list_users(config, &params).await?;
        }
        Commands::PurgeTokens => purge_tokens(config).await?,
    }

    Ok(())
}

/// Open storage and build the shared state
async fn open_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let store = LocalStorageContext::open(
        &config.storage.database_url,
        config.storage.max_connections,
    )
    .await?;
    let store: Arc<dyn AccountStore> = Arc::new(store);

    Ok(AppState::new(store, config))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Accounts Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let app_state = open_state(&config).await?;
    tracing::info!("Database connected");

    let app = api::router(app_state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(config: ServerConfig, req: AccountRequest, role: Option<&str>) -> anyhow::Result<()> {
    let app_state = open_state(&config).await?;

    let mut user = app_state.users.register(&req).await?;
    if let Some(role) = role {
        user = app_state.users.add_role(&user.id, role).await?;
    }

    let roles: Vec<String> = user.roles.iter().map(ToString::to_string).collect();
    println!("Created user {} <{}> [{}]", user.id, user.email, roles.join(", "));

    Ok(())
}

async fn list_users(config: ServerConfig, params: &ListUsersParams) -> anyhow::Result<()> {
    let app_state = open_state(&config).await?;
    let page = app_state.users.list_users(params).await?;

    println!(
        "Users {}-{} of {}:",
        page.offset + u64::from(!page.users.is_empty()),
        page.offset + page.users.len() as u64,
        page.total
    );
    for user in page.users {
        let roles: Vec<String> = user.roles.iter().map(ToString::to_string).collect();
        println!(
            "  {} - {} <{}> age {} [{}]",
            user.id,
            user.name,
            user.email,
            user.age,
            roles.join(", ")
        );
    }

    Ok(())
}

async fn purge_tokens(config: ServerConfig) -> anyhow::Result<()> {
    let app_state = open_state(&config).await?;
    let purged = app_state.users.purge_expired_tokens().await?;

    println!("Purged {} expired access tokens", purged);

    Ok(())
}
