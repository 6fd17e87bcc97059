//! `CREATE TABLE` output for the bank schema.

mod common;

use tally_core::{generate_up_migration, CreateTable, Query};

#[test]
fn accounts_table() {
    let bank = common::bank();
    assert_eq!(
        generate_up_migration(&bank.accounts).unwrap(),
        "CREATE TABLE accounts (\n    account_id SERIAL NOT NULL PRIMARY KEY,\n    \
         account_type TEXT NOT NULL,\n    created_at TIMESTAMP NOT NULL DEFAULT NOW(),\n    \
         updated_at TIMESTAMP NULL DEFAULT NULL\n);"
    );
}

#[test]
fn payments_table() {
    let bank = common::bank();
    assert_eq!(
        CreateTable::new(&bank.payments).to_sql().unwrap(),
        "CREATE TABLE payments (\n    payment_id SERIAL NOT NULL PRIMARY KEY,\n    \
         account_id INTEGER NOT NULL,\n    amount FLOAT NOT NULL,\n    \
         created_at TIMESTAMP NOT NULL DEFAULT NOW(),\n    \
         updated_at TIMESTAMP NULL DEFAULT NULL\n);"
    );
}

#[test]
fn every_registered_table_renders_identically_twice() {
    let bank = common::bank();
    for table in bank.registry.iter() {
        assert_eq!(
            generate_up_migration(table).unwrap(),
            generate_up_migration(table).unwrap()
        );
    }
}
