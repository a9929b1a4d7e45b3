use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};

use garden_db::SessionFactory;
use garden_users::config::GardenUsersConfig;
use garden_users::contract::{Member, NewProfile, Profile, ProfilePatch};
use garden_users::GardenUsers;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Gardenspace - community garden members and profiles
#[derive(Parser)]
#[command(name = "gardenspace")]
#[command(about = "Gardenspace - community garden members and profiles")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the default member "Goodness"
    Seed,
    /// Register a member
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// Manage member profiles
    #[command(subcommand)]
    Profile(ProfileCommands),
    /// Inspect registered members
    #[command(subcommand)]
    Members(MembersCommands),
    /// Apply database migrations
    Migrate,
    /// Check configuration
    Check,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create a profile
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        avatar_url: Option<String>,
        /// Use this id instead of generating one
        #[arg(long)]
        id: Option<Uuid>,
    },
    /// Create the profile under an external id, or refresh it
    Sync {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        email: String,
        /// Defaults to the email when omitted
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Show a profile
    Show { id: Uuid },
    /// Update the full name or avatar of a profile
    Update {
        id: Uuid,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum MembersCommands {
    /// List members in id order
    List {
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::config::default_logging_config);
    runtime::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("Gardenspace starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Commands::Seed);
    if let Commands::Check = command {
        return check_config(&config);
    }

    let sessions = Arc::new(SessionFactory::new(config.database_config()));
    let module_cfg: GardenUsersConfig = config.module_config("garden_users")?;
    let garden = GardenUsers::new(Arc::clone(&sessions), &module_cfg);

    let result = run_command(&garden, command).await;
    sessions.close().await;
    result
}

async fn run_command(garden: &GardenUsers, command: Commands) -> Result<()> {
    garden.migrate().await?;
    let client = garden.client();

    match command {
        Commands::Seed => {
            let member = client
                .register_user("Goodness".to_string(), None)
                .await
                .context("Failed to save garden member")?;
            tracing::info!(id = member.id, "Seed member registered");
            println!("Garden saved successfully!");
        }
        Commands::Register { name, role } => {
            let member = client.register_user(name, role).await?;
            print_member(&member);
        }
        Commands::Profile(ProfileCommands::Create {
            full_name,
            email,
            avatar_url,
            id,
        }) => {
            let profile = client
                .create_profile(NewProfile {
                    id,
                    full_name,
                    email,
                    avatar_url,
                })
                .await?;
            print_profile(&profile);
        }
        Commands::Profile(ProfileCommands::Sync {
            id,
            email,
            full_name,
            avatar_url,
        }) => {
            let profile = client
                .sync_profile(NewProfile {
                    id: Some(id),
                    full_name,
                    email,
                    avatar_url,
                })
                .await?;
            print_profile(&profile);
        }
        Commands::Profile(ProfileCommands::Show { id }) => {
            print_profile(&client.get_profile(id).await?);
        }
        Commands::Profile(ProfileCommands::Update {
            id,
            full_name,
            avatar_url,
        }) => {
            let patch = ProfilePatch {
                full_name,
                avatar_url,
            };
            print_profile(&client.update_profile(id, patch).await?);
        }
        Commands::Members(MembersCommands::List { limit, offset }) => {
            for member in client.list_members(limit, offset).await? {
                print_member(&member);
            }
        }
        Commands::Migrate => println!("Migrations applied"),
        Commands::Check => {}
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let _: GardenUsersConfig = config.module_config("garden_users")?;
    garden_db::options::validate_config_consistency(&config.database_config())?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn print_member(m: &Member) {
    println!(
        "member id={} name={} role={} created_at={} updated_at={}",
        m.id,
        m.name,
        m.role.as_deref().unwrap_or("-"),
        m.created_at.to_rfc3339(),
        m.updated_at.to_rfc3339()
    );
}

fn print_profile(p: &Profile) {
    println!(
        "profile id={} full_name={} email={} avatar_url={} created_at={} updated_at={}",
        p.id,
        p.full_name,
        p.email,
        p.avatar_url.as_deref().unwrap_or("-"),
        p.created_at.to_rfc3339(),
        p.updated_at.to_rfc3339()
    );
}
