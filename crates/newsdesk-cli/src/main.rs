use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use newsdesk_cli::commands;
use newsdesk_config::JwtConfig;
use newsdesk_db::{PgStore, init_db_pool};

#[derive(Parser)]
#[command(name = "newsdesk-cli")]
#[command(about = "Newsdesk CLI - Administrative tools for Newsdesk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account (full access)
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Issue an access token for an existing user
    IssueToken {
        /// Email address of the user
        #[arg(short = 'e', long)]
        email: String,
    },
    /// Replace the permission list of a role
    SetPermissions {
        /// Role name
        role: String,

        /// Permissions, comma-separated (e.g. news.create,news.update)
        #[arg(short = 'p', long, value_delimiter = ',')]
        permissions: Vec<String>,

        /// Optional role description
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        fail("DATABASE_URL must be set");
    };
    let pool = match init_db_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => fail(&format!("Failed to connect to database: {e}")),
    };
    let store = PgStore::new(pool);

    match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&store, name, email, password).await,
        Commands::IssueToken { email } => handle_issue_token(&store, &email).await,
        Commands::SetPermissions {
            role,
            permissions,
            description,
        } => handle_set_permissions(&store, &role, &permissions, description.as_deref()).await,
    }
}

fn fail(message: &str) -> ! {
    eprintln!("\n❌ {message}");
    std::process::exit(1);
}

fn prompt(label: &str) -> String {
    match Input::new().with_prompt(label).interact_text() {
        Ok(value) => value,
        Err(e) => fail(&format!("Failed to read {}: {e}", label.to_lowercase())),
    }
}

async fn handle_create_admin(
    store: &PgStore,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let name = name.unwrap_or_else(|| prompt("Name"));
    let email = email.unwrap_or_else(|| prompt("Email address"));
    let password = password.unwrap_or_else(|| {
        match Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
        {
            Ok(p) => p,
            Err(e) => fail(&format!("Failed to read password: {e}")),
        }
    });

    match commands::create_admin(store, &name, &email, &password).await {
        Ok(user) => {
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", user.email);
            println!("   Name: {}", user.name);
        }
        Err(e) => fail(&format!("Error creating admin: {e:#}")),
    }
}

async fn handle_issue_token(store: &PgStore, email: &str) {
    let jwt_config = JwtConfig::from_env();
    match commands::issue_token(store, email, &jwt_config).await {
        Ok(token) => println!("{token}"),
        Err(e) => fail(&format!("Error issuing token: {e:#}")),
    }
}

async fn handle_set_permissions(
    store: &PgStore,
    role: &str,
    permissions: &[String],
    description: Option<&str>,
) {
    match commands::set_permissions(store, role, permissions, description).await {
        Ok(role) => {
            println!("\n✅ Role '{}' updated", role.name);
            println!("   Permissions: {}", role.permissions.join(", "));
        }
        Err(e) => fail(&format!("Error updating role: {e:#}")),
    }
}
