#![allow(dead_code)]

use std::sync::Arc;

use tally_core::{float, integer, text, timestamp, SqlFunction, TableRegistry, TableSchema};

pub struct Bank {
    pub registry: TableRegistry,
    pub accounts: Arc<TableSchema>,
    pub payments: Arc<TableSchema>,
}

/// Declares the `accounts` and `payments` tables used across the tests.
pub fn bank() -> Bank {
    let mut registry = TableRegistry::new();
    let accounts = registry
        .declare_table(
            "accounts",
            Some("account_id"),
            vec![
                integer("account_id").primary_key(),
                text("account_type"),
                timestamp("created_at").default_function(SqlFunction::Now),
                timestamp("updated_at").nullable().default_null(),
            ],
        )
        .unwrap_or_else(|e| panic!("accounts declaration failed: {e}"));
    let payments = registry
        .declare_table(
            "payments",
            Some("payment_id"),
            vec![
                integer("payment_id").primary_key(),
                integer("account_id"),
                float("amount"),
                timestamp("created_at").default_function(SqlFunction::Now),
                timestamp("updated_at").nullable().default_null(),
            ],
        )
        .unwrap_or_else(|e| panic!("payments declaration failed: {e}"));
    Bank {
        registry,
        accounts,
        payments,
    }
}
