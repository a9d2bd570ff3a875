//! StorePulse CLI - backend administration from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create the first platform admin
//! sp-cli admin bootstrap -e admin@example.com -p 'secret'
//!
//! # Tenants (admin credentials from SP_ADMIN_EMAIL / SP_ADMIN_PASSWORD)
//! sp-cli tenants list
//! sp-cli tenants create -s mystore -t shpat_xxx
//! sp-cli tenants init -s mystore -e owner@example.com -p 'secret'
//! sp-cli tenants ingest <TENANT_ID> --type orders
//!
//! # Public shop lookup
//! sp-cli lookup mystore
//!
//! # API keys
//! sp-cli keys list <TENANT_ID>
//! sp-cli keys issue <TENANT_ID> -l ci
//! sp-cli keys revoke <TENANT_ID> <KEY_ID>
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_BACKEND_URL` - Analytics backend origin (shared with the dashboard)
//! - `SP_ADMIN_EMAIL` / `SP_ADMIN_PASSWORD` - Admin sign-in for admin commands

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::Backend;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(author, version, about = "StorePulse CLI tools")]
struct Cli {
    /// Analytics backend origin
    #[arg(long, env = "DASHBOARD_BACKEND_URL")]
    backend_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Admin email used by admin commands
    #[arg(long, env = "SP_ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Admin password used by admin commands
    #[arg(long, env = "SP_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Platform admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage tenants
    Tenants {
        #[command(subcommand)]
        action: TenantAction,
    },
    /// Look up a shop by domain
    Lookup {
        /// Shop domain or bare store name
        shop: String,
    },
    /// Manage a tenant's API keys
    Keys {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create the first admin account
    Bootstrap {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// List every tenant
    List,
    /// Onboard a shop with an existing access token
    Create {
        /// Shop domain or bare store name
        #[arg(short, long)]
        shop: String,

        /// Shopify Admin API access token
        #[arg(short = 't', long, env = "SP_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },
    /// Create a tenant together with its first user
    Init {
        #[arg(short, long)]
        shop: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Trigger a data ingestion run
    Ingest {
        tenant_id: String,

        /// Limit the run to these data sets (customers, products, orders)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// List a tenant's keys
    List { tenant_id: String },
    /// Issue a key; its raw value is printed once
    Issue {
        tenant_id: String,

        #[arg(short, long)]
        label: Option<String>,
    },
    /// Revoke a key
    Revoke { tenant_id: String, key_id: String },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storepulse_cli=info,storepulse_dashboard=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::new(
        &cli.backend_url,
        cli.timeout_secs,
        cli.admin_email,
        cli.admin_password,
    )?;

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::Bootstrap { email, password } => {
                commands::admin::bootstrap(&backend, &email, &password).await?;
            }
        },
        Commands::Tenants { action } => match action {
            TenantAction::List => commands::tenants::list(&backend).await?,
            TenantAction::Create { shop, access_token } => {
                commands::tenants::create(&backend, &shop, &access_token).await?;
            }
            TenantAction::Init {
                shop,
                email,
                password,
            } => commands::tenants::init(&backend, &shop, &email, &password).await?,
            TenantAction::Ingest { tenant_id, types } => {
                commands::tenants::ingest(&backend, &tenant_id, &types).await?;
            }
        },
        Commands::Lookup { shop } => commands::tenants::lookup(&backend, &shop).await?,
        Commands::Keys { action } => match action {
            KeyAction::List { tenant_id } => commands::keys::list(&backend, &tenant_id).await?,
            KeyAction::Issue { tenant_id, label } => {
                commands::keys::issue(&backend, &tenant_id, label.as_deref()).await?;
            }
            KeyAction::Revoke { tenant_id, key_id } => {
                commands::keys::revoke(&backend, &tenant_id, &key_id).await?;
            }
        },
    }
    Ok(())
}
