//! Integration tests for the teller CLI.
//!
//! These tests run the actual binary with scripted stdin against a
//! throwaway database file and verify the session output and the durable
//! state left behind.

use assert_cmd::Command;
use predicates::prelude::*;
use teller::{SqliteStore, Store};
use tempfile::TempDir;

/// Run the binary against `db_path` feeding `script` to stdin.
fn run_teller(db_path: &str, script: &str) -> String {
    let mut cmd = Command::cargo_bin("teller").unwrap();
    let assert = cmd
        .arg(db_path)
        .write_stdin(script)
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn test_first_use_registers_deposits_and_reconciles() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    let output = run_teller(db_path, "alice\n1234\nAlice Example\n2\n100.00\n7\n");

    assert!(output.contains("New customer account created for alice"));
    assert!(output.contains("Deposit successful. New Balance is: 100.00"));
    assert!(output.contains("Thank you for using our ATM."));

    let store = SqliteStore::open(db_path).unwrap();
    let account = store.find_by_username("alice").unwrap().unwrap();
    assert_eq!(account.balance.to_string(), "100.00");
    assert_eq!(
        store
            .load_transactions(&account.account_number)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_returning_customer_sees_durable_balance() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    run_teller(db_path, "alice\n1234\nAlice Example\n2\n100.00\n7\n");
    let output = run_teller(db_path, "alice\n1234\n1\n4\n7\n");

    assert!(output.contains("Logging in..."));
    assert!(output.contains("Your Balance is: 100.00"));
    assert!(output.contains("deposit"));
}

#[test]
fn test_wrong_pin_is_declined_without_session() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    run_teller(db_path, "alice\n1234\nAlice Example\n7\n");

    let mut cmd = Command::cargo_bin("teller").unwrap();
    cmd.arg(db_path)
        .write_stdin("alice\n9999\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid credentials."));
}

#[test]
fn test_transfer_between_customers() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    run_teller(db_path, "alice\n1234\nAlice Example\n2\n100.00\n7\n");
    run_teller(db_path, "bob\n5678\nBob Example\n7\n");

    let store = SqliteStore::open(db_path).unwrap();
    let bob_number = store
        .find_by_username("bob")
        .unwrap()
        .unwrap()
        .account_number;
    drop(store);

    let output = run_teller(db_path, &format!("alice\n1234\n5\n{bob_number}\n30.00\n7\n"));
    assert!(output.contains("Transfer successful. Updated Balance: 70.00"));

    let store = SqliteStore::open(db_path).unwrap();
    assert_eq!(
        store
            .find_by_username("bob")
            .unwrap()
            .unwrap()
            .balance
            .to_string(),
        "30.00"
    );
    assert_eq!(
        store
            .find_by_username("alice")
            .unwrap()
            .unwrap()
            .balance
            .to_string(),
        "70.00"
    );
}

#[test]
fn test_transfer_to_unknown_account_is_reported() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    let output = run_teller(
        db_path,
        "alice\n1234\nAlice Example\n2\n100.00\n5\n99999999\n30.00\n1\n7\n",
    );

    assert!(output.contains("destination account 99999999 not found"));
    assert!(output.contains("Your Balance is: 100.00"));
}

#[test]
fn test_technician_vault_operations() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    let output = run_teller(
        db_path,
        "alice\n1234\nAlice Example\n6\n3\n6\n4\n500.00\n6\n1\n7\n",
    );

    assert!(output.contains("ATM Balance: $10000.00"));
    assert!(output.contains("Replenished. ATM Balance: $10500.00"));
    assert!(output.contains("Maintenance complete."));
}

#[test]
fn test_invalid_selection_recovers() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("atm.db");
    let db_path = db_path.to_str().unwrap();

    let output = run_teller(db_path, "alice\n1234\nAlice Example\n9\n1\n7\n");

    assert!(output.contains("Invalid selection. Try again."));
    assert!(output.contains("Your Balance is: 0.00"));
}
