//! Concurrent checkout against a file-backed database
//!
//! Many customers race for the same books. Every accepted order must get a
//! distinct number and stock must never go negative.
//!
//! ```bash
//! cargo test -p bookcity-server --test checkout_concurrency_test -- --nocapture
//! ```

use std::collections::HashSet;
use std::str::FromStr;

use bookcity_server::db::DbService;
use bookcity_server::db::repository::{book, user};
use bookcity_server::orders::{self, OrderError, Pricing};
use futures::future::join_all;
use rust_decimal::Decimal;
use shared::models::{CartLine, CheckoutRequest, OrderStatus};
use sqlx::SqlitePool;

/// Concurrent checkouts per scenario
const CUSTOMERS: usize = 24;
/// Copies available of the contested title
const SCARCE_STOCK: i64 = 10;

async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let path = dir.path().join("bookcity.db");
    let db = DbService::new(&format!("sqlite:{}", path.display()))
        .await
        .unwrap();
    db.pool
}

async fn seed_book(pool: &SqlitePool, sku: &str, price_cents: i64, stock: i64) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let id = book::create(
        &mut conn,
        &book::NewBook {
            sku,
            price_cents,
            stock_quantity: stock,
            image_path: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    book::upsert_translation(&mut conn, id, "en", sku, None)
        .await
        .unwrap();
    id
}

fn request(book_id: i64, price: &str, n: usize) -> CheckoutRequest {
    CheckoutRequest {
        customer_name: format!("Customer {n}"),
        customer_email: format!("customer{n}@example.com"),
        customer_phone: None,
        shipping_address: "1 Mount Road".into(),
        city: "Chennai".into(),
        state: "Tamil Nadu".into(),
        postal_code: "600002".into(),
        cart: vec![CartLine {
            id: book_id,
            quantity: 1,
            price: Decimal::from_str(price).unwrap(),
        }],
        notes: None,
        locale: None,
    }
}

#[tokio::test]
async fn test_concurrent_checkouts_get_distinct_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let user_id = user::create(&pool, "Buyer", "buyer@example.com", "$argon2id$unused", false)
        .await
        .unwrap()
        .id;
    let book_id = seed_book(&pool, "PLENTY-1", 2_500, 1_000).await;
    let pricing = Pricing::default();

    let tasks = (0..CUSTOMERS).map(|n| {
        let pool = pool.clone();
        tokio::spawn(async move {
            orders::place_order(&pool, &pricing, user_id, request(book_id, "25.00", n)).await
        })
    });
    let results = join_all(tasks).await;

    let mut numbers = HashSet::new();
    for result in results {
        let placed = result.unwrap().unwrap();
        assert_eq!(placed.status, OrderStatus::Pending);
        assert!(placed.order_number.starts_with("ORD-"));
        assert!(numbers.insert(placed.order_number), "duplicate order number");
    }
    assert_eq!(numbers.len(), CUSTOMERS);
    assert!(numbers.contains("ORD-000001"));
    assert!(numbers.contains(&format!("ORD-{CUSTOMERS:06}")));

    let remaining = book::stock_of(&pool, book_id).await.unwrap().unwrap();
    assert_eq!(remaining, 1_000 - CUSTOMERS as i64);
}

#[tokio::test]
async fn test_concurrent_checkouts_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let user_id = user::create(&pool, "Buyer", "buyer@example.com", "$argon2id$unused", false)
        .await
        .unwrap()
        .id;
    let book_id = seed_book(&pool, "SCARCE-1", 9_900, SCARCE_STOCK).await;
    let pricing = Pricing::default();

    let tasks = (0..CUSTOMERS).map(|n| {
        let pool = pool.clone();
        tokio::spawn(async move {
            orders::place_order(&pool, &pricing, user_id, request(book_id, "99.00", n)).await
        })
    });
    let results = join_all(tasks).await;

    let mut accepted = Vec::new();
    let mut rejected = 0;
    for result in results {
        match result.unwrap() {
            Ok(placed) => accepted.push(placed.order_number),
            Err(OrderError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                rejected += 1;
            }
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(accepted.len(), SCARCE_STOCK as usize);
    assert_eq!(rejected, CUSTOMERS - SCARCE_STOCK as usize);
    assert_eq!(book::stock_of(&pool, book_id).await.unwrap(), Some(0));

    // Rejected checkouts roll back their number allocation
    let unique: HashSet<_> = accepted.iter().collect();
    assert_eq!(unique.len(), accepted.len());
    for n in 1..=SCARCE_STOCK {
        assert!(accepted.contains(&format!("ORD-{n:06}")));
    }

    // Cancelling one frees exactly one copy
    let order_id: i64 = sqlx::query_scalar("SELECT id FROM orders ORDER BY id LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    orders::cancel(&pool, order_id, None).await.unwrap();
    assert_eq!(book::stock_of(&pool, book_id).await.unwrap(), Some(1));
}
