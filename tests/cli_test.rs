use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/settlement.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "buyer,seller,status,total_price,total_items",
        ))
        // The cart split into one order per seller; bob's was confirmed.
        .stdout(predicate::str::contains("alice,bob,CONFIRMED,50.0,2"))
        .stdout(predicate::str::contains("alice,carol,PENDING,10.0,1"));

    Ok(())
}

#[test]
fn test_cli_cancel_restocks_and_reports() {
    let file = script(
        "\
stock, bob, SKU-1, Plain Tee, red, M, 5, 25.0
address, alice, 1 Main St, Hanoi
cart, alice, SKU-1, 1
checkout, alice
cancel, alice, 1
# the restocked unit can be bought again
cart, alice, SKU-1, 1
checkout, alice
",
    );

    let mut cmd = Command::new(cargo_bin!("bazaar"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("alice,bob,CANCELLED,25.0,1"))
        .stdout(predicate::str::contains("alice,bob,PENDING,25.0,1"));
}

#[test]
fn test_cli_rejected_command_does_not_stop_the_script() {
    let file = script(
        "\
stock, bob, SKU-1, Plain Tee, red, M, 5, 25.0
address, alice, 1 Main St, Hanoi
cart, alice, SKU-1, 1
checkout, alice
# buyers may not drive the status state machine
status, alice, 1, CONFIRMED
",
    );

    let mut cmd = Command::new(cargo_bin!("bazaar"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("ACCESS_DENIED"))
        .stdout(predicate::str::contains("alice,bob,PENDING,25.0,1"));
}

#[test]
fn test_cli_out_of_stock_checkout_leaves_no_orders() {
    let file = script(
        "\
stock, bob, SKU-1, Plain Tee, red, M, 1, 25.0
address, alice, 1 Main St, Hanoi
cart, alice, SKU-1, 3
checkout, alice
",
    );

    let mut cmd = Command::new(cargo_bin!("bazaar"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("OUT_OF_STOCK"))
        .stdout(predicate::str::contains("alice").not());
}

#[test]
fn test_cli_malformed_rows_are_skipped() {
    let file = script(
        "\
stock, bob, SKU-1, Plain Tee, red, M, not_a_number, 25.0
restock, bob, SKU-1, 5
stock, bob, SKU-2, Coffee Mug, white, OS, 2, 10.0
address, alice, 1 Main St, Hanoi
cart, alice, SKU-2, 1
checkout, alice
",
    );

    let mut cmd = Command::new(cargo_bin!("bazaar"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("INVALID_INPUT"))
        .stdout(predicate::str::contains("alice,bob,PENDING,10.0,1"));
}

#[test]
fn test_cli_admin_delete_removes_the_order_from_the_report() {
    let file = script(
        "\
stock, bob, SKU-1, Plain Tee, red, M, 5, 25.0
address, alice, 1 Main St, Hanoi
cart, alice, SKU-1, 1
checkout, alice
delete, admin, 1
",
    );

    let mut cmd = Command::new(cargo_bin!("bazaar"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("buyer,seller,status"))
        .stdout(predicate::str::contains("alice").not());
}
