use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_api::{build_router, AppState};
use parley_chat::{
    ConversationCreateForm, ConversationService, MessageForm, MessageService, UserCreateForm,
    UserService,
};
use parley_config::{load as load_config, AppConfig};
use parley_database::{ConversationRepository, User, UserRepository};
use parley_runtime::{telemetry, BackendServices};
use sqlx::Row;
use tokio::net::TcpListener;
use tracing::info;

const DEMO_USERS: [&str; 3] = ["alice", "bob", "carol"];
const DEMO_PASSWORD: &str = "password123";
const DUMP_PAGE_SIZE: i64 = 200;

#[derive(Parser)]
#[command(name = "parley-server")]
#[command(about = "Parley chat backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Dump users, conversations, participants and messages
    DumpData,
    /// Delete all conversations and users
    ClearData,
    /// Seed the database with demo users and a conversation
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::DumpData => dump_data(&services).await,
        Commands::ClearData => clear_data(&services).await,
        Commands::SeedData => seed_data(&services).await,
    }
}

async fn run_server(config: &AppConfig, services: BackendServices) -> anyhow::Result<()> {
    info!("starting Parley backend");

    let state = AppState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        services.chat.clone(),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(parley_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data(services: &BackendServices) -> anyhow::Result<()> {
    info!("dumping chat data from database");

    let users = all_users(&UserRepository::new(services.db_pool.clone()), DUMP_PAGE_SIZE).await?;

    println!("=== USERS ===");
    if users.is_empty() {
        println!("No users found in database");
    } else {
        println!("Found {} users:", users.len());
        println!(
            "{:<5} {:<26} {:<20} {:<30} {:<35} {:<35}",
            "ID", "Public ID", "Username", "Email", "Created At", "Last Login"
        );
        println!("{}", "-".repeat(155));

        for user in users {
            println!(
                "{:<5} {:<26} {:<20} {:<30} {:<35} {:<35}",
                user.id,
                user.public_id,
                user.username,
                user.email.as_deref().unwrap_or("NULL"),
                user.created_at,
                user.last_login_at.as_deref().unwrap_or("NULL")
            );
        }
    }

    println!("\n=== CONVERSATIONS ===");
    let conversations = ConversationRepository::new(services.db_pool.clone())
        .list_all()
        .await
        .context("failed to fetch conversations")?;

    if conversations.is_empty() {
        println!("No conversations found in database");
    } else {
        println!("Found {} conversations:", conversations.len());
        println!(
            "{:<5} {:<26} {:<30} {:<11} {:<35} {:<35}",
            "ID", "Public ID", "Title", "Created By", "Created At", "Updated At"
        );
        println!("{}", "-".repeat(145));

        for conversation in conversations {
            println!(
                "{:<5} {:<26} {:<30} {:<11} {:<35} {:<35}",
                conversation.id,
                conversation.public_id,
                conversation.title.as_deref().unwrap_or("NULL"),
                conversation
                    .created_by
                    .map(|id| id.to_string())
                    .unwrap_or("NULL".to_string()),
                conversation.created_at,
                conversation.updated_at
            );
        }
    }

    println!("\n=== PARTICIPANTS ===");
    let participants = sqlx::query(
        r#"
        SELECT conversation_id, user_id, joined_at
        FROM conversation_participants
        ORDER BY conversation_id ASC, joined_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch participants")?;

    if participants.is_empty() {
        println!("No participants found in database");
    } else {
        println!("Found {} participants:", participants.len());
        println!(
            "{:<16} {:<10} {:<35}",
            "Conversation ID", "User ID", "Joined At"
        );
        println!("{}", "-".repeat(63));

        for participant in participants {
            let conversation_id: i64 = participant.get("conversation_id");
            let user_id: i64 = participant.get("user_id");
            let joined_at: String = participant.get("joined_at");

            println!("{:<16} {:<10} {:<35}", conversation_id, user_id, joined_at);
        }
    }

    println!("\n=== MESSAGES ===");
    let messages = sqlx::query(
        r#"
        SELECT id, public_id, conversation_id, sender_id, text, created_at
        FROM messages
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch messages")?;

    if messages.is_empty() {
        println!("No messages found in database");
    } else {
        println!("Found {} messages:", messages.len());
        println!(
            "{:<5} {:<26} {:<16} {:<10} {:<50} {:<35}",
            "ID", "Public ID", "Conversation ID", "Sender ID", "Text (truncated)", "Created At"
        );
        println!("{}", "-".repeat(147));

        for message in messages {
            let id: i64 = message.get("id");
            let public_id: String = message.get("public_id");
            let conversation_id: i64 = message.get("conversation_id");
            let sender_id: i64 = message.get("sender_id");
            let text: String = message.get("text");
            let created_at: String = message.get("created_at");

            println!(
                "{:<5} {:<26} {:<16} {:<10} {:<50} {:<35}",
                id,
                public_id,
                conversation_id,
                sender_id,
                truncate(&text, 47),
                created_at
            );
        }
    }

    Ok(())
}

/// Page through every account in id order.
async fn all_users(repository: &UserRepository, page_size: i64) -> anyhow::Result<Vec<User>> {
    let total = repository.count().await.context("failed to count users")?;
    let mut users = Vec::with_capacity(usize::try_from(total).unwrap_or_default());

    let mut offset = 0;
    while offset < total {
        let page = repository
            .list(page_size, offset)
            .await
            .context("failed to fetch users")?;
        if page.is_empty() {
            break;
        }
        offset += page.len() as i64;
        users.extend(page);
    }

    Ok(users)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

async fn clear_data(services: &BackendServices) -> anyhow::Result<()> {
    info!("clearing all data from database");

    // Conversations first so messages and participants cascade before their users go.
    let conversations_deleted = sqlx::query("DELETE FROM conversations")
        .execute(&services.db_pool)
        .await
        .context("failed to delete conversations")?;

    let users_deleted = sqlx::query("DELETE FROM users")
        .execute(&services.db_pool)
        .await
        .context("failed to delete users")?;

    println!("Database cleared:");
    println!(
        "- {} conversations deleted",
        conversations_deleted.rows_affected()
    );
    println!("- {} users deleted", users_deleted.rows_affected());

    Ok(())
}

async fn seed_data(services: &BackendServices) -> anyhow::Result<()> {
    info!("seeding database with demo data");

    let users = UserService::new(services.db_pool.clone(), services.authenticator.clone());
    let repository = UserRepository::new(services.db_pool.clone());

    let mut seeded: Vec<User> = Vec::with_capacity(DEMO_USERS.len());
    for username in DEMO_USERS {
        let user = match repository
            .find_by_username(username)
            .await
            .with_context(|| format!("failed to look up demo user {username}"))?
        {
            Some(existing) => existing,
            None => users
                .register(UserCreateForm {
                    username: username.to_string(),
                    email: Some(format!("{username}@example.com")),
                    password: DEMO_PASSWORD.to_string(),
                })
                .await
                .with_context(|| format!("failed to create demo user {username}"))?,
        };
        seeded.push(user);
    }

    let [alice, bob, carol] = <[User; 3]>::try_from(seeded)
        .map_err(|_| anyhow::anyhow!("expected exactly three demo users"))?;

    let conversations = ConversationService::new(services.db_pool.clone(), services.chat.clone());
    let conversation = conversations
        .create(
            &alice,
            ConversationCreateForm {
                title: Some("Welcome to Parley".to_string()),
                participants: vec![bob.public_id.clone(), carol.public_id.clone()],
            },
        )
        .await
        .context("failed to create demo conversation")?;

    let messages = MessageService::new(services.db_pool.clone(), services.chat.clone());
    let script = [
        (&alice, "Hi everyone, welcome to the demo conversation!"),
        (&bob, "Thanks Alice. Glad to be here."),
        (&carol, "Hello! Is this where we plan the release?"),
        (&alice, "It is. Let's start with the open issues."),
    ];
    for (sender, text) in script {
        messages
            .create(
                sender,
                &conversation.public_id,
                MessageForm {
                    text: text.to_string(),
                },
            )
            .await
            .with_context(|| format!("failed to post demo message from {}", sender.username))?;
    }

    println!("Database seeded with demo data:");
    println!(
        "- users: {} (password '{DEMO_PASSWORD}')",
        DEMO_USERS.join(", ")
    );
    println!("- 1 conversation created ({})", conversation.public_id);
    println!("- {} messages posted", script.len());
    println!("Run 'dump-data' to see the inserted data");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn services_in(temp_dir: &TempDir) -> anyhow::Result<BackendServices> {
        let mut config = AppConfig::default();
        config.database.url = format!(
            "sqlite://{}",
            temp_dir.path().join("server.db").display()
        );
        config.database.max_connections = 2;
        BackendServices::initialise(&config).await
    }

    #[tokio::test]
    async fn all_users_pages_through_every_account() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let services = services_in(&temp_dir).await?;

        let usernames = ["ann", "ben", "cat", "dan", "eve"];
        for username in usernames {
            services
                .authenticator
                .register_with_password(username, None, DEMO_PASSWORD)
                .await?;
        }

        let repository = UserRepository::new(services.db_pool.clone());
        let users = all_users(&repository, 2).await?;

        let listed: Vec<&str> = users.iter().map(|user| user.username.as_str()).collect();
        assert_eq!(listed, usernames);
        Ok(())
    }

    #[tokio::test]
    async fn all_users_is_empty_for_a_fresh_database() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let services = services_in(&temp_dir).await?;

        let users = all_users(&UserRepository::new(services.db_pool.clone()), DUMP_PAGE_SIZE).await?;
        assert!(users.is_empty());
        Ok(())
    }

    #[test]
    fn truncate_keeps_short_text_and_marks_long_text() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }
}
