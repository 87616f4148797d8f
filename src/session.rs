//! The menu-driven console session.
//!
//! One login-to-logout cycle: dispatches menu selections to the terminal
//! and ledger, then reconciles the session state on quit (or on end of
//! input). Generic over `BufRead`/`Write` so the loop is tested without a
//! TTY.
//!
//! Amounts that fail to parse are recovered locally: the operation is
//! aborted with a message and the menu comes back. Funds-related refusals
//! are reported the same way. Store outages and identifier exhaustion are
//! surfaced as hard errors.

use crate::account::Account;
use crate::error::{Result, TellerError};
use crate::money::Money;
use crate::reconcile;
use crate::store::Store;
use crate::terminal::{Technician, Terminal};
use log::debug;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// How many history entries the view shows.
const RECENT_LIMIT: usize = 10;

/// An authenticated session bound to a running terminal.
pub struct Session<S: Store, R: BufRead, W: Write> {
    terminal: Terminal<S>,
    account: Account,
    technician: Technician,
    input: R,
    output: W,
}

impl<S: Store, R: BufRead, W: Write> Session<S, R, W> {
    pub fn new(terminal: Terminal<S>, account: Account, input: R, output: W) -> Self {
        Session {
            terminal,
            account,
            technician: Technician,
            input,
            output,
        }
    }

    /// Runs the menu loop until quit or end of input, then reconciles.
    pub fn run(mut self) -> Result<()> {
        loop {
            self.show_menu()?;
            let Some(selection) = self.read_line()? else {
                break;
            };

            match selection.trim() {
                "1" => self.show_balance()?,
                "2" => self.handle_deposit()?,
                "3" => self.handle_withdrawal()?,
                "4" => self.show_recent_transactions()?,
                "5" => self.handle_transfer()?,
                "6" => self.technician_menu()?,
                "7" => break,
                _ => writeln!(self.output, "Invalid selection. Try again.")?,
            }
        }

        writeln!(self.output, "Thank you for using our ATM.")?;
        reconcile::flush_session(self.terminal.ledger_mut().store_mut(), &self.account)
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.output, "\nWelcome {}!", self.account.display_name)?;
        writeln!(
            self.output,
            "1 - Check Balance \t 2 - Deposit Funds \t 3 - Withdraw Cash \t 4 - Recent Transactions \t 5 - Transfer Funds \t 6 - Technician Operations \t 7 - Quit"
        )?;
        write!(self.output, "\nEnter your selection (1-7): ")?;
        self.output.flush()?;
        Ok(())
    }

    fn show_balance(&mut self) -> Result<()> {
        let balance = self.terminal.ledger().balance(&self.account);
        writeln!(self.output, "Customer Account Number: {}", self.account.account_number)?;
        writeln!(self.output, "Customer Name: {}", self.account.display_name)?;
        writeln!(self.output, "Your Balance is: {balance}")?;
        Ok(())
    }

    fn handle_deposit(&mut self) -> Result<()> {
        let Some(amount) = self.prompt_amount("Enter amount to deposit: ")? else {
            return Ok(());
        };

        match self
            .terminal
            .ledger_mut()
            .deposit(&mut self.account, amount)
        {
            Ok(reference) => {
                debug!("Deposit recorded under {reference}");
                writeln!(
                    self.output,
                    "Deposit successful. New Balance is: {}",
                    self.account.balance
                )?;
                Ok(())
            }
            Err(err) => self.report_or_raise(err),
        }
    }

    fn handle_withdrawal(&mut self) -> Result<()> {
        let Some(amount) = self.prompt_amount("Enter amount to withdraw: ")? else {
            return Ok(());
        };

        match self.terminal.withdraw_cash(&mut self.account, amount) {
            Ok(reference) => {
                debug!("Withdrawal recorded under {reference}");
                writeln!(
                    self.output,
                    "Withdrawal successful. Updated Balance: {}",
                    self.account.balance
                )?;
                Ok(())
            }
            Err(err) => self.report_or_raise(err),
        }
    }

    fn show_recent_transactions(&mut self) -> Result<()> {
        writeln!(self.output, "\nRecent Transactions")?;
        if self.account.transactions.is_empty() {
            writeln!(self.output, "No transactions recorded.")?;
            return Ok(());
        }

        for tx in self.account.recent_transactions(RECENT_LIMIT) {
            writeln!(
                self.output,
                "{} --> ${} | {} | {}",
                tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                tx.amount,
                tx.kind,
                tx.reference
            )?;
        }
        Ok(())
    }

    fn handle_transfer(&mut self) -> Result<()> {
        write!(self.output, "Enter destination account number: ")?;
        self.output.flush()?;
        let Some(destination) = self.read_line()? else {
            return Ok(());
        };
        let destination = destination.trim().to_string();

        let Some(amount) = self.prompt_amount("Enter amount to transfer: ")? else {
            return Ok(());
        };

        match self
            .terminal
            .ledger_mut()
            .transfer(&mut self.account, amount, &destination)
        {
            Ok(reference) => {
                debug!("Transfer recorded under {reference}");
                writeln!(
                    self.output,
                    "Transfer successful. Updated Balance: {}",
                    self.account.balance
                )?;
                Ok(())
            }
            Err(err) => self.report_or_raise(err),
        }
    }

    fn technician_menu(&mut self) -> Result<()> {
        writeln!(self.output, "\nTechnician Operations:")?;
        writeln!(
            self.output,
            "1 - Perform Maintenance \t 2 - Perform Repairs \t 3 - View Cash Balance \t 4 - Replenish Cash \t 5 - Upgrade Hardware \t 6 - Upgrade Firmware"
        )?;
        write!(self.output, "\nEnter technician operation (1-6): ")?;
        self.output.flush()?;

        let Some(operation) = self.read_line()? else {
            return Ok(());
        };

        match operation.trim() {
            "1" => {
                self.technician.perform_maintenance();
                writeln!(self.output, "Maintenance complete.")?;
            }
            "2" => {
                self.technician.perform_repairs();
                writeln!(self.output, "Repairs complete.")?;
            }
            "3" => {
                writeln!(self.output, "ATM Balance: ${}", self.terminal.vault_balance())?;
            }
            "4" => {
                let Some(amount) = self.prompt_amount("Enter amount to replenish: ")? else {
                    return Ok(());
                };
                match self.terminal.replenish(amount) {
                    Ok(()) => writeln!(
                        self.output,
                        "Replenished. ATM Balance: ${}",
                        self.terminal.vault_balance()
                    )?,
                    Err(err) => self.report_or_raise(err)?,
                }
            }
            "5" => {
                self.technician.upgrade_hardware();
                writeln!(self.output, "Hardware upgrade complete.")?;
            }
            "6" => {
                self.technician.upgrade_firmware();
                writeln!(self.output, "Firmware upgrade complete.")?;
            }
            _ => writeln!(self.output, "Invalid technician operation. Try again.")?,
        }
        Ok(())
    }

    /// Prompts for an amount; `None` means the input was invalid (already
    /// reported) or exhausted, and the operation is aborted.
    fn prompt_amount(&mut self, label: &str) -> Result<Option<Money>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let Some(line) = self.read_line()? else {
            return Ok(None);
        };

        match Money::from_str(line.trim()) {
            Ok(amount) => Ok(Some(amount)),
            Err(_) => {
                writeln!(self.output, "Invalid amount.")?;
                Ok(None)
            }
        }
    }

    /// Reads one line; `None` on end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Prints recoverable refusals and propagates everything else.
    fn report_or_raise(&mut self, err: TellerError) -> Result<()> {
        match err {
            TellerError::InvalidAmount(_)
            | TellerError::InsufficientFunds { .. }
            | TellerError::VaultInsufficient { .. }
            | TellerError::DestinationNotFound(_) => {
                writeln!(self.output, "{err}")?;
                Ok(())
            }
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn run_session(db: &NamedTempFile, script: &str) -> String {
        let store = SqliteStore::open(db.path()).unwrap();
        let mut terminal = Terminal::new(store);
        let account = match terminal.authenticate("alice", "1234").unwrap() {
            crate::terminal::AuthOutcome::Authenticated(account) => account,
            _ => terminal.register("alice", "1234", "Alice Example").unwrap(),
        };

        let mut output = Vec::new();
        Session::new(terminal, account, Cursor::new(script), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_deposit_withdraw_and_reconcile() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "2\n100.00\n3\n40.00\n7\n");

        assert!(output.contains("Deposit successful. New Balance is: 100.00"));
        assert!(output.contains("Withdrawal successful. Updated Balance: 60.00"));
        assert!(output.contains("Thank you for using our ATM."));

        let store = SqliteStore::open(db.path()).unwrap();
        let account = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(account.balance.to_string(), "60.00");
        assert_eq!(
            store
                .load_transactions(&account.account_number)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_invalid_amount_recovers_locally() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "2\nabc\n1\n7\n");

        assert!(output.contains("Invalid amount."));
        assert!(output.contains("Your Balance is: 0.00"));
    }

    #[test]
    fn test_insufficient_funds_is_reported() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "3\n5.00\n7\n");

        assert!(output.contains("insufficient funds"));
    }

    #[test]
    fn test_recent_transactions_listing() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "2\n10.00\n4\n7\n");

        assert!(output.contains("Recent Transactions"));
        assert!(output.contains("deposit"));
    }

    #[test]
    fn test_technician_replenish_and_view() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "6\n3\n6\n4\n500.00\n7\n");

        assert!(output.contains("ATM Balance: $10000.00"));
        assert!(output.contains("Replenished. ATM Balance: $10500.00"));
    }

    #[test]
    fn test_end_of_input_reconciles() {
        let db = NamedTempFile::new().unwrap();
        let output = run_session(&db, "2\n25.00\n");

        assert!(output.contains("Thank you for using our ATM."));

        let store = SqliteStore::open(db.path()).unwrap();
        let account = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(account.balance.to_string(), "25.00");
    }

    #[test]
    fn test_session_reload_sees_prior_history() {
        let db = NamedTempFile::new().unwrap();
        run_session(&db, "2\n100.00\n7\n");
        let output = run_session(&db, "4\n1\n7\n");

        assert!(output.contains("deposit"));
        assert!(output.contains("Your Balance is: 100.00"));
    }
}
