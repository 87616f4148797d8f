//! Teller CLI
//!
//! An interactive cash-terminal session against a SQLite-backed ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- [database-path]
//! ```
//!
//! The database defaults to `atm.db` in the working directory.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use teller::{AuthOutcome, Result, Session, SqliteStore, Terminal};

const DEFAULT_DB_PATH: &str = "atm.db";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let db_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_DB_PATH);

    let store = SqliteStore::open(db_path)?;
    let mut terminal = Terminal::new(store);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let username = prompt(&mut input, &mut output, "Enter Your Username: ")?;
    let secret = prompt(&mut input, &mut output, "Enter Your PIN: ")?;

    let account = match terminal.authenticate(username.trim(), secret.trim())? {
        AuthOutcome::Authenticated(account) => {
            writeln!(output, "Logging in...")?;
            account
        }
        AuthOutcome::WrongSecret => {
            writeln!(output, "Invalid credentials.")?;
            return Ok(());
        }
        AuthOutcome::UnknownUser => {
            let name = prompt(&mut input, &mut output, "Enter Your Full Name: ")?;
            let account = terminal.register(username.trim(), secret.trim(), name.trim())?;
            writeln!(
                output,
                "New customer account created for {}",
                account.username
            )?;
            account
        }
    };

    Session::new(terminal, account, input, output).run()
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}
