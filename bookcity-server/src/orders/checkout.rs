//! Checkout
//!
//! Turns a validated cart into an order, its items and the first history
//! entry while decrementing stock, all inside one SQLite transaction.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, CheckoutRequest, OrderStatus, PlacedOrder};
use shared::money::{OrderTotals, is_valid_price, line_total, to_minor_units};
use sqlx::SqlitePool;

use super::{OrderError, OrderResult, Pricing, number};
use crate::catalog::resolve_locale;
use crate::db::repository::book::{self, Book};
use crate::db::repository::order::{self, NewOrder, NewOrderItem};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_optional,
    validate_email, validate_optional_text, validate_required_text,
};

/// Largest quantity accepted for one book in one order
pub const MAX_LINE_QUANTITY: i64 = 9999;

const ORDER_CREATED_COMMENT: &str = "Order created";

/// One book in the cart after duplicate lines were merged
#[derive(Debug, Clone, PartialEq)]
struct MergedLine {
    book_id: i64,
    quantity: i64,
    price: Decimal,
}

/// Validate the checkout payload without touching the database
fn validate(req: &CheckoutRequest) -> OrderResult<()> {
    validate_required_text(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_email(&req.customer_email, "customer_email")?;
    validate_optional_text(&req.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.shipping_address, "shipping_address", MAX_ADDRESS_LEN)?;
    validate_required_text(&req.city, "city", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.state, "state", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.postal_code, "postal_code", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;
    Ok(())
}

/// Check every line and merge repeated books, keeping first-seen order.
///
/// Repeated lines must agree on price; their quantities are summed.
fn merge_cart(cart: &[CartLine]) -> OrderResult<Vec<MergedLine>> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut merged: Vec<MergedLine> = Vec::with_capacity(cart.len());
    for (index, line) in cart.iter().enumerate() {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(AppError::with_message(
                ErrorCode::InvalidQuantity,
                format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            )
            .with_detail("field", format!("cart.{index}.quantity"))
            .into());
        }
        if !is_valid_price(line.price) {
            return Err(AppError::with_message(
                ErrorCode::InvalidPrice,
                "Price must be non-negative with at most 2 decimal places",
            )
            .with_detail("field", format!("cart.{index}.price"))
            .into());
        }

        match merged.iter_mut().find(|m| m.book_id == line.id) {
            Some(existing) if existing.price != line.price => {
                return Err(AppError::with_message(
                    ErrorCode::PriceMismatch,
                    format!("Book {} appears in the cart with different prices", line.id),
                )
                .with_detail("field", format!("cart.{index}.price"))
                .into());
            }
            Some(existing) => {
                existing.quantity += line.quantity;
                if existing.quantity > MAX_LINE_QUANTITY {
                    return Err(AppError::with_message(
                        ErrorCode::InvalidQuantity,
                        format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
                    )
                    .with_detail("field", format!("cart.{index}.quantity"))
                    .into());
                }
            }
            None => merged.push(MergedLine {
                book_id: line.id,
                quantity: line.quantity,
                price: line.price,
            }),
        }
    }
    Ok(merged)
}

fn cents(value: Decimal, what: &str) -> OrderResult<i64> {
    to_minor_units(value).ok_or_else(|| {
        AppError::with_message(ErrorCode::ValueOutOfRange, format!("{what} is out of range")).into()
    })
}

/// Place an order for `user_id`.
///
/// Catalog prices are authoritative: a line whose submitted price differs
/// from the current price is rejected, as is any line the stock cannot cover.
/// Nothing is persisted unless every step succeeds.
pub async fn place_order(
    pool: &SqlitePool,
    pricing: &Pricing,
    user_id: i64,
    req: CheckoutRequest,
) -> OrderResult<PlacedOrder> {
    validate(&req)?;
    let lines = merge_cart(&req.cart)?;
    let locale = resolve_locale(req.locale.as_deref());

    let mut tx = pool.begin().await?;

    // First statement is a write so this transaction holds the lock from here on
    let order_number = number::allocate(&mut tx).await?;

    let mut priced: Vec<(Book, i64)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let book = book::find_by_id(&mut *tx, line.book_id)
            .await?
            .ok_or(OrderError::BookNotFound(line.book_id))?;

        if !book.is_active {
            return Err(OrderError::BookInactive(book.sku));
        }
        let current = book.price();
        if current != line.price {
            tracing::info!(sku = %book.sku, submitted = %line.price, current = %current, "Checkout rejected: price changed");
            return Err(OrderError::PriceMismatch {
                sku: book.sku,
                submitted: line.price,
                current,
            });
        }
        if book.stock_quantity < line.quantity {
            return Err(OrderError::InsufficientStock {
                sku: book.sku,
                requested: line.quantity,
                available: book.stock_quantity,
            });
        }
        priced.push((book, line.quantity));
    }

    let totals = OrderTotals::compute(
        priced.iter().map(|(book, qty)| line_total(book.price(), *qty)),
        pricing.tax_rate,
        pricing.shipping_cost,
    );

    let customer_phone = normalize_optional(req.customer_phone.clone());
    let notes = normalize_optional(req.notes.clone());
    let customer_email = req.customer_email.trim().to_lowercase();
    let order_id = order::insert(
        &mut tx,
        &NewOrder {
            user_id: Some(user_id),
            order_number: &order_number,
            customer_name: req.customer_name.trim(),
            customer_email: &customer_email,
            customer_phone: customer_phone.as_deref(),
            shipping_address: req.shipping_address.trim(),
            city: req.city.trim(),
            state: req.state.trim(),
            postal_code: req.postal_code.trim(),
            subtotal_cents: cents(totals.subtotal, "subtotal")?,
            tax_amount_cents: cents(totals.tax_amount, "tax_amount")?,
            shipping_cost_cents: cents(totals.shipping_cost, "shipping_cost")?,
            total_amount_cents: cents(totals.total_amount, "total_amount")?,
            notes: notes.as_deref(),
        },
    )
    .await?;

    for (book, quantity) in &priced {
        let title = book::localized_title(&mut *tx, book.id, locale)
            .await?
            .unwrap_or_else(|| book.sku.clone());
        order::insert_item(
            &mut tx,
            order_id,
            &NewOrderItem {
                book_id: book.id,
                book_title: &title,
                book_sku: &book.sku,
                quantity: *quantity,
                unit_price_cents: book.price_cents,
                total_price_cents: cents(line_total(book.price(), *quantity), "total_price")?,
            },
        )
        .await?;

        if !book::decrement_stock(&mut tx, book.id, *quantity).await? {
            let available = book::stock_of(&mut *tx, book.id).await?.unwrap_or(0);
            return Err(OrderError::InsufficientStock {
                sku: book.sku.clone(),
                requested: *quantity,
                available,
            });
        }
    }

    order::append_status(
        &mut tx,
        order_id,
        OrderStatus::Pending,
        Some(ORDER_CREATED_COMMENT),
        Some(user_id),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        order_id = order_id,
        order_number = %order_number,
        user_id = user_id,
        items = priced.len(),
        total = %totals.total_amount,
        "Order placed"
    );

    Ok(PlacedOrder {
        id: order_id,
        order_number,
        total_amount: totals.total_amount,
        status: OrderStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::testing::{order_count, seed_book, seed_user, stock};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(id: i64, quantity: i64, price: &str) -> CartLine {
        CartLine {
            id,
            quantity,
            price: dec(price),
        }
    }

    fn request(cart: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Kavya Raman".into(),
            customer_email: "kavya@example.com".into(),
            customer_phone: Some("9840012345".into()),
            shipping_address: "12 Anna Salai".into(),
            city: "Chennai".into(),
            state: "Tamil Nadu".into(),
            postal_code: "600002".into(),
            cart,
            notes: None,
            locale: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_computes_totals_and_decrements_stock() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "kavya@example.com", false).await;
        let book = seed_book(&pool, "TB-001", 10_000, 5).await;

        let placed = place_order(&pool, &Pricing::default(), user, request(vec![line(book, 2, "100.00")]))
            .await
            .unwrap();

        assert_eq!(placed.order_number, "ORD-000001");
        assert_eq!(placed.total_amount, dec("210.00"));
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(stock(&pool, book).await, 3);

        let detail = order::find_detail(&pool, placed.id).await.unwrap().unwrap();
        assert_eq!(detail.order.subtotal, dec("200.00"));
        assert_eq!(detail.order.tax_amount, dec("10.00"));
        assert_eq!(detail.order.shipping_cost, Decimal::ZERO);
        assert_eq!(detail.order.user_id, Some(user));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].total_price, dec("200.00"));
        assert_eq!(detail.items[0].book_sku, "TB-001");
        assert_eq!(detail.status_history.len(), 1);
        assert_eq!(detail.status_history[0].status, OrderStatus::Pending);
        assert_eq!(detail.status_history[0].comment.as_deref(), Some("Order created"));
    }

    #[tokio::test]
    async fn test_multi_book_order_decrements_each_stock() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let kural = seed_book(&pool, "TB-001", 10_000, 10).await;
        let naladiyar = seed_book(&pool, "TB-002", 4_500, 4).await;
        let kuruntokai = seed_book(&pool, "TB-003", 7_550, 3).await;
        let untouched = seed_book(&pool, "TB-004", 2_000, 6).await;

        let lines = vec![
            line(kural, 1, "100.00"),
            line(naladiyar, 4, "45.00"),
            line(kuruntokai, 2, "75.50"),
        ];
        let requested: i64 = lines.iter().map(|l| l.quantity).sum();
        let before = [
            stock(&pool, kural).await,
            stock(&pool, naladiyar).await,
            stock(&pool, kuruntokai).await,
        ];

        let placed = place_order(&pool, &Pricing::default(), user, request(lines))
            .await
            .unwrap();

        let after = [
            stock(&pool, kural).await,
            stock(&pool, naladiyar).await,
            stock(&pool, kuruntokai).await,
        ];
        assert_eq!(after, [9, 0, 1]);
        let delta: i64 = before.iter().zip(&after).map(|(b, a)| a - b).sum();
        assert_eq!(delta, -requested);
        assert_eq!(stock(&pool, untouched).await, 6);

        let detail = order::find_detail(&pool, placed.id).await.unwrap().unwrap();
        assert_eq!(detail.items.len(), 3);
        assert_eq!(detail.items.iter().map(|i| i.quantity).sum::<i64>(), requested);
        // 100.00 + 180.00 + 151.00
        assert_eq!(detail.order.subtotal, dec("431.00"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_whole_order() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let plenty = seed_book(&pool, "TB-100", 5_000, 10).await;
        let scarce = seed_book(&pool, "TB-001", 10_000, 1).await;

        let err = place_order(
            &pool,
            &Pricing::default(),
            user,
            request(vec![line(plenty, 3, "50.00"), line(scarce, 2, "100.00")]),
        )
        .await
        .unwrap_err();

        match err {
            OrderError::InsufficientStock { sku, requested, available } => {
                assert_eq!(sku, "TB-001");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock(&pool, plenty).await, 10);
        assert_eq!(stock(&pool, scarce).await, 1);
        assert_eq!(order_count(&pool).await, 0);

        // The rolled-back checkout did not consume an order number
        let placed = place_order(&pool, &Pricing::default(), user, request(vec![line(scarce, 1, "100.00")]))
            .await
            .unwrap();
        assert_eq!(placed.order_number, "ORD-000001");
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let err = place_order(&pool, &Pricing::default(), user, request(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
        assert_eq!(order_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_books() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let err = place_order(&pool, &Pricing::default(), user, request(vec![line(999, 1, "1.00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::BookNotFound(999)));

        let hidden = seed_book(&pool, "TB-HIDDEN", 100, 4).await;
        book::deactivate(&pool, hidden).await.unwrap();
        let err = place_order(&pool, &Pricing::default(), user, request(vec![line(hidden, 1, "1.00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::BookInactive(ref sku) if sku == "TB-HIDDEN"));
        assert_eq!(stock(&pool, hidden).await, 4);
    }

    #[tokio::test]
    async fn test_stale_client_price_rejected() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let book = seed_book(&pool, "TB-001", 12_000, 5).await;

        let err = place_order(&pool, &Pricing::default(), user, request(vec![line(book, 1, "100.00")]))
            .await
            .unwrap_err();
        match err {
            OrderError::PriceMismatch { sku, current, .. } => {
                assert_eq!(sku, "TB-001");
                assert_eq!(current, dec("120.00"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock(&pool, book).await, 5);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_merged() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let book = seed_book(&pool, "TB-001", 2_550, 10).await;

        let placed = place_order(
            &pool,
            &Pricing::default(),
            user,
            request(vec![line(book, 1, "25.50"), line(book, 2, "25.5")]),
        )
        .await
        .unwrap();

        let detail = order::find_detail(&pool, placed.id).await.unwrap().unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 3);
        assert_eq!(detail.order.subtotal, dec("76.50"));
        // 76.50 * 0.05 = 3.825 rounds away from zero
        assert_eq!(detail.order.tax_amount, dec("3.83"));
        assert_eq!(detail.order.total_amount, dec("80.33"));
        assert_eq!(stock(&pool, book).await, 7);
    }

    #[tokio::test]
    async fn test_title_snapshot_uses_requested_locale() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let translated = seed_book(&pool, "TB-TA", 100, 5).await;
        let english_only = seed_book(&pool, "TB-EN", 100, 5).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            book::upsert_translation(&mut conn, translated, "ta", "பொன்னியின் செல்வன்", None)
                .await
                .unwrap();
        }

        let mut req = request(vec![line(translated, 1, "1.00"), line(english_only, 1, "1.00")]);
        req.locale = Some("ta".into());
        let placed = place_order(&pool, &Pricing::default(), user, req).await.unwrap();

        let detail = order::find_detail(&pool, placed.id).await.unwrap().unwrap();
        assert_eq!(detail.items[0].book_title, "பொன்னியின் செல்வன்");
        assert_eq!(detail.items[1].book_title, "TB-EN title");
    }

    #[tokio::test]
    async fn test_configured_pricing_applies() {
        let pool = memory_pool().await.unwrap();
        let user = seed_user(&pool, "a@example.com", false).await;
        let book = seed_book(&pool, "TB-001", 10_000, 5).await;
        let pricing = Pricing {
            tax_rate: dec("0.18"),
            shipping_cost: dec("40.00"),
        };

        let placed = place_order(&pool, &pricing, user, request(vec![line(book, 1, "100.00")]))
            .await
            .unwrap();
        assert_eq!(placed.total_amount, dec("158.00"));
    }

    #[test]
    fn test_merge_cart_validation() {
        assert!(matches!(merge_cart(&[]), Err(OrderError::EmptyCart)));

        let err = merge_cart(&[line(1, 0, "1.00")]).unwrap_err();
        assert!(matches!(err, OrderError::Invalid(ref e) if e.code == ErrorCode::InvalidQuantity));

        let err = merge_cart(&[line(1, 1, "1.005")]).unwrap_err();
        assert!(matches!(err, OrderError::Invalid(ref e) if e.code == ErrorCode::InvalidPrice));

        let err = merge_cart(&[line(1, 1, "-1.00")]).unwrap_err();
        assert!(matches!(err, OrderError::Invalid(ref e) if e.code == ErrorCode::InvalidPrice));

        let err = merge_cart(&[line(1, 1, "1.00"), line(1, 1, "2.00")]).unwrap_err();
        assert!(matches!(err, OrderError::Invalid(ref e) if e.code == ErrorCode::PriceMismatch));

        let err = merge_cart(&[line(1, 9000, "1.00"), line(1, 1000, "1.00")]).unwrap_err();
        assert!(matches!(err, OrderError::Invalid(ref e) if e.code == ErrorCode::InvalidQuantity));
    }

    #[test]
    fn test_customer_validation() {
        let mut req = request(vec![line(1, 1, "1.00")]);
        req.customer_email = "not-an-email".into();
        assert!(validate(&req).is_err());

        let mut req = request(vec![line(1, 1, "1.00")]);
        req.city = "  ".into();
        let err = validate(&req).unwrap_err();
        match err {
            OrderError::Invalid(e) => assert_eq!(e.details.unwrap()["field"], "city"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
