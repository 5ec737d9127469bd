use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{AdminMintCmd, AdminOperation, Engine, Money, users};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

#[derive(Parser, Debug)]
#[command(name = "beco_admin")]
#[command(about = "Admin utilities for beco (bootstrap users/wallets, manage supply)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./beco.db?mode=rwc")]
    database_url: String,

    /// Account that owns the system wallet.
    #[arg(long, default_value = "system")]
    system_user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Supply(Supply),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user together with their wallet.
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Role name; `admin` unlocks supply operations.
    #[arg(long, default_value = "member")]
    role: String,
}

#[derive(Args, Debug)]
struct Supply {
    #[command(subcommand)]
    command: SupplyCommand,
}

#[derive(Subcommand, Debug)]
enum SupplyCommand {
    /// Mint becoin onto the system wallet.
    Mint(SupplyArgs),
    /// Destroy becoin from the system wallet.
    Destroy(SupplyArgs),
}

#[derive(Args, Debug)]
struct SupplyArgs {
    /// Amount as a decimal, e.g. `100` or `12.50`.
    #[arg(long)]
    amount: String,
    #[arg(long)]
    note: Option<String>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds an engine with the system wallet resolved (creating it on
/// first use).
async fn engine_with_system_wallet(
    db: &DatabaseConnection,
    system_user: &str,
) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    if users::Entity::find_by_id(system_user.to_string())
        .one(db)
        .await?
        .is_none()
    {
        let user = users::ActiveModel {
            username: Set(system_user.to_string()),
            password: Set(String::new()),
            role_name: Set(users::ROLE_ADMIN.to_string()),
        };
        users::Entity::insert(user).exec(db).await?;
    }

    let bootstrap = Engine::builder().database(db.clone()).build().await?;
    let wallet = bootstrap.ensure_wallet(system_user).await?;

    Ok(Engine::builder()
        .database(db.clone())
        .system_wallet(wallet.id)
        .build()
        .await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
                role_name: Set(args.role),
            };
            users::Entity::insert(user).exec(&db).await?;

            let engine = Engine::builder().database(db.clone()).build().await?;
            let wallet = engine.new_wallet(&args.username).await?;

            println!("created user: {} (wallet {})", args.username, wallet.id);
        }
        Command::Supply(Supply { command }) => {
            let (operation, args) = match command {
                SupplyCommand::Mint(args) => (AdminOperation::Create, args),
                SupplyCommand::Destroy(args) => (AdminOperation::Destroy, args),
            };

            let amount: Money = match args.amount.parse() {
                Ok(amount) => amount,
                Err(err) => {
                    eprintln!("invalid amount: {err}");
                    std::process::exit(2);
                }
            };

            let engine = engine_with_system_wallet(&db, &cli.system_user).await?;
            let mut cmd = AdminMintCmd::new(operation, amount, cli.system_user.clone());
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }

            let (wallet, record) = engine.admin_mint(cmd).await?;
            println!(
                "{} {} becoin (system balance {})",
                record.operation.as_str(),
                record.amount,
                wallet.becoin
            );
        }
    }

    Ok(())
}
