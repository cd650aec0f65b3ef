use clap::{Parser, Subcommand};
use tracing::{info, warn};

use recipe_server::infrastructure::config::AppConfig;
use recipe_server::infrastructure::database::{create_pool, run_migrations};
use recipe_server::infrastructure::logging::init_logging;
use recipe_server::{AppState, start_rest_server};

#[derive(Parser, Debug)]
#[command(name = "recipe-server", about = "Recipe API server and management commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Apply migrations and serve the HTTP API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create an account with staff and superuser rights
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Delete an account and everything it owns
    DeleteUser {
        #[arg(long)]
        email: String,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            run_migrations(&pool).await?;
            let state = AppState::postgres(pool, &config);
            start_rest_server(config, state).await?;
        }
        Command::Migrate => run_migrations(&pool).await?,
        Command::CreateSuperuser { email, password } => {
            let state = AppState::postgres(pool, &config);
            let user = state.auth.create_superuser(&email, &password).await?;
            info!(user_id = %user.id, email = %user.email, "superuser ready");
        }
        Command::DeleteUser { email } => {
            let state = AppState::postgres(pool, &config);
            if state.delete_user(&email).await? {
                info!(email = %email, "user deleted");
            } else {
                warn!(email = %email, "no such user");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["recipe-server"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn create_superuser_takes_flags() {
        let cli = Cli::try_parse_from([
            "recipe-server",
            "create-superuser",
            "--email",
            "admin@example.com",
            "--password",
            "secret",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::CreateSuperuser {
                email: "admin@example.com".into(),
                password: "secret".into(),
            })
        );
    }

    #[test]
    fn delete_user_requires_email() {
        assert!(Cli::try_parse_from(["recipe-server", "delete-user"]).is_err());
    }
}
