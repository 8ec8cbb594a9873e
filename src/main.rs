use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use aitu_messenger::apps::AppsClient;
use aitu_messenger::config::Config;
use aitu_messenger::models::NotificationOptions;
use aitu_messenger::passport::PassportClient;

#[derive(Parser)]
#[command(name = "aitu-messenger")]
#[command(about = "Aitu Passport and Aitu Apps client", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook and OAuth callback server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Database file path
        #[arg(long, default_value = "./aitu.db")]
        db: String,
    },
    /// Print the OAuth authorization URL
    AuthUrl {
        /// Scopes to request (space separated); defaults to configured scopes
        #[arg(long)]
        scopes: Option<String>,
        /// CSRF state echoed back on the callback
        #[arg(long)]
        state: Option<String>,
    },
    /// Send a push notification to one user
    SendPush {
        /// Recipient user UUID
        #[arg(long)]
        user_id: String,
        /// Notification title
        #[arg(long)]
        title: String,
        /// Notification message
        #[arg(long)]
        message: String,
        /// Locale: 1 Russian, 2 Kazakh, 3 English, 4 Uzbek
        #[arg(long, default_value = "1")]
        locale: u8,
        /// URL opened when the notification is tapped
        #[arg(long)]
        to_url: Option<String>,
    },
    /// Send a broadcast notification to every user of the app
    Broadcast {
        /// Notification title
        #[arg(long)]
        title: String,
        /// Notification message
        #[arg(long)]
        message: String,
        /// Locale: 1 Russian, 2 Kazakh, 3 English, 4 Uzbek
        #[arg(long, default_value = "1")]
        locale: u8,
    },
    /// Fetch push delivery statistics
    Stats {
        /// Start of the date range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End of the date range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Fetch delivery status of one notification
    Status {
        /// Notification ID
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aitu_messenger=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port, db } => {
            let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
            aitu_messenger::server::run_server(addr, &db, &config).await?;
        }
        Commands::AuthUrl { scopes, state } => {
            let passport = PassportClient::new(config.passport.clone(), &config.http)?;
            let scopes: Vec<String> = scopes
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|| config.passport.default_scopes.clone());
            println!("{}", passport.authorization_url(&scopes, state.as_deref()));
        }
        Commands::SendPush {
            user_id,
            title,
            message,
            locale,
            to_url,
        } => {
            let apps = AppsClient::new(config.apps, &config.http)?;
            let options = NotificationOptions { locale, to_url };
            let response = apps.send_targeted(&user_id, &title, &message, options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Broadcast {
            title,
            message,
            locale,
        } => {
            let apps = AppsClient::new(config.apps, &config.http)?;
            let options = NotificationOptions {
                locale,
                to_url: None,
            };
            let response = apps.send_broadcast(&title, &message, options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Stats { from, to } => {
            let apps = AppsClient::new(config.apps, &config.http)?;
            let mut filters = Vec::new();
            if let Some(from) = from {
                filters.push(("date_from".to_string(), from));
            }
            if let Some(to) = to {
                filters.push(("date_to".to_string(), to));
            }
            let response = apps.statistics(&filters).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Status { id } => {
            let apps = AppsClient::new(config.apps, &config.http)?;
            let response = apps.notification_status(&id).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
