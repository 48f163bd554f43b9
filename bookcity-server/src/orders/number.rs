//! Order numbers: "ORD-" + zero-padded sequence

use sqlx::SqliteConnection;

use crate::db::repository::{RepoResult, order};

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Six digits minimum; longer sequences are not truncated
pub fn format_order_number(sequence: i64) -> String {
    format!("{ORDER_NUMBER_PREFIX}{sequence:06}")
}

/// Take the next number from the storage counter.
///
/// Must run inside the checkout transaction so a rolled-back checkout
/// does not consume a number.
pub async fn allocate(conn: &mut SqliteConnection) -> RepoResult<String> {
    let sequence = order::next_sequence(conn).await?;
    Ok(format_order_number(sequence))
}
