use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, LevelFilter};

use timelogs::config::Config;
use timelogs::console::{ConsoleMarkdownList, ConsolePresenter};
use timelogs::session::{Session, SessionStore};
use timelogs::timelog_api::TimelogClient;
use timelogs::timelog_command::{TimelogArgs, TimelogCommand};
use timelogs::users_command::{UsersArgs, UsersCommand};

/// timelogを表示するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- login <token>
/// $ cargo run -- timelog --tab last
/// $ cargo run -- users list
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", global = true, help = "Shows debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Stores the credential token.
    Login { token: String },
    /// Removes the stored credential token.
    Logout,
    Timelog(TimelogArgs),
    Users(UsersArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let config = Config::from_env().context("Failed to load config")?;
    let store = SessionStore::new(config.token_path.clone());
    let mut stdout = io::stdout();

    match args.subcommand {
        SubCommands::Login { token } => {
            let session = store.save_token(&token)?;
            info!("Logged in as {} ({})", session.user.userid, session.user.role);
        }
        SubCommands::Logout => store.logout()?,
        SubCommands::Timelog(timelog) => {
            let session = require_session(&store)?;
            let client = TimelogClient::new(&config, &session.token);
            let page = TimelogCommand::new(&session, &client).run(timelog).await?;
            ConsoleMarkdownList::new(&mut stdout).show_timelog(&page)?;
        }
        SubCommands::Users(users) => {
            let session = require_session(&store)?;
            let client = TimelogClient::new(&config, &session.token);
            let rows = UsersCommand::new(&client).run(users).await?;
            ConsoleMarkdownList::new(&mut stdout).show_user_rows(&rows)?;
        }
    }

    Ok(())
}

/// 保存されているトークンからセッションを復元する。
fn require_session(store: &SessionStore) -> Result<Session> {
    store
        .bootstrap()?
        .context("Not logged in. Run `timelogs login <token>` first")
}

/// 標準エラー出力にログを出力する。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}
