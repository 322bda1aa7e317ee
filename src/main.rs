// Entrypoint for the CLI application.
// - Parses the single positional command plus its flags and hands them to
//   `ui::dispatch`.
// - Failures are printed, not signaled: the process always exits 0.

use clap::Parser;
use trickle_cli::{api::ApiClient, session::SessionStore, ui};

/// Command-line client for the trickle journaling service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// login, list-topic or list-activity
    command: String,

    /// user name for login
    #[arg(short, long)]
    userid: Option<String>,

    /// password for login; prompted when omitted
    #[arg(short, long)]
    password: Option<String>,

    /// bearer token to use instead of the stored session token
    #[arg(short, long = "access_token")]
    access_token: Option<String>,

    /// list activities for this topic instead of the current user
    #[arg(short, long = "topic_id")]
    topic_id: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("{err:#}");
    }
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let store = SessionStore::default();
    let mut api = ApiClient::from_env()?;
    ui::dispatch(
        &mut api,
        &store,
        &args.command,
        args.userid.as_deref(),
        args.password.as_deref(),
        args.access_token.as_deref(),
        args.topic_id,
    )
}
