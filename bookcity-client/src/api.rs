//! Typed BookCity API
//!
//! | Call | Route | Auth |
//! |------|-------|------|
//! | register / login | POST /api/auth/{register,login} | none |
//! | logout | POST /api/auth/logout | token |
//! | profile | GET /api/profile | token |
//! | list_books / get_book | GET /api/books[/{id}] | none |
//! | place_order | POST /api/orders | token |
//! | my_orders / get_order | GET /api/orders/{my-orders,{id}} | token |
//! | list_orders, update_order_status, update_payment, cancel_order | /api/orders/... | admin |
//! | create_book, update_book, delete_book | /api/books/... | admin |

use shared::client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use shared::error::ApiResponse;
use shared::models::{
    BookCreate, BookDetail, BookQuery, BookSummary, BookUpdate, CheckoutRequest, Order,
    OrderDetail, OrderPlacedResponse, OrderQuery, OrderStatus, PaymentUpdateRequest,
    StatusUpdateRequest,
};
use shared::pagination::Paginated;

use crate::http::{HttpClient, NetworkHttpClient};
use crate::{ClientConfig, ClientResult, Credentials};

/// Append `key=value` pairs, skipping absent values
fn with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}={}", key, urlencoding::encode(v))))
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.join("&"))
    }
}

/// BookCity API client over any [`HttpClient`] transport
#[derive(Debug, Clone)]
pub struct BookCityClient<C: HttpClient> {
    http: C,
}

impl BookCityClient<NetworkHttpClient> {
    /// Network client with credentials seeded from `config.token`
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let http = NetworkHttpClient::new(config, config.credentials())?;
        Ok(Self::new(http))
    }
}

impl<C: HttpClient> BookCityClient<C> {
    pub fn new(http: C) -> Self {
        Self { http }
    }

    pub fn credentials(&self) -> &Credentials {
        self.http.credentials()
    }

    pub fn transport(&self) -> &C {
        &self.http
    }

    // ========== Auth API ==========

    /// Create a customer account; the returned token is stored
    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<LoginResponse> {
        let resp: LoginResponse = self.http.post("/api/auth/register", req).await?;
        self.credentials().set(resp.token.clone()).await;
        tracing::info!(user_id = resp.user.id, "Registered");
        Ok(resp)
    }

    /// Login with email and password; the returned token is stored
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self.http.post("/api/auth/login", &req).await?;
        self.credentials().set(resp.token.clone()).await;
        tracing::info!(user_id = resp.user.id, is_admin = resp.user.is_admin, "Logged in");
        Ok(resp)
    }

    /// Logout; the local token is dropped even if the server call fails
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self
            .http
            .post_empty::<ApiResponse<()>>("/api/auth/logout")
            .await;
        self.credentials().clear().await;
        result.map(|_| ())
    }

    pub async fn profile(&self) -> ClientResult<UserInfo> {
        self.http.get("/api/profile").await
    }

    // ========== Catalog API ==========

    pub async fn list_books(&self, query: &BookQuery) -> ClientResult<Paginated<BookSummary>> {
        let path = with_query(
            "/api/books",
            &[
                ("lang", query.lang.clone()),
                ("page", query.page.map(|p| p.to_string())),
                ("per_page", query.per_page.map(|p| p.to_string())),
            ],
        );
        self.http.get(&path).await
    }

    pub async fn get_book(&self, id: i64) -> ClientResult<BookDetail> {
        self.http.get(&format!("/api/books/{}", id)).await
    }

    pub async fn create_book(&self, book: &BookCreate) -> ClientResult<BookDetail> {
        self.http.post("/api/books", book).await
    }

    pub async fn update_book(&self, id: i64, changes: &BookUpdate) -> ClientResult<BookDetail> {
        self.http.put(&format!("/api/books/{}", id), changes).await
    }

    /// Deactivate a book
    pub async fn delete_book(&self, id: i64) -> ClientResult<()> {
        self.http
            .delete::<ApiResponse<()>>(&format!("/api/books/{}", id))
            .await?;
        Ok(())
    }

    // ========== Order API ==========

    pub async fn place_order(&self, req: &CheckoutRequest) -> ClientResult<OrderPlacedResponse> {
        let resp: OrderPlacedResponse = self.http.post("/api/orders", req).await?;
        tracing::info!(order_number = %resp.order.order_number, "Order placed");
        Ok(resp)
    }

    pub async fn my_orders(&self, page: Option<u32>) -> ClientResult<Paginated<OrderDetail>> {
        let path = with_query(
            "/api/orders/my-orders",
            &[("page", page.map(|p| p.to_string()))],
        );
        self.http.get(&path).await
    }

    pub async fn get_order(&self, id: i64) -> ClientResult<OrderDetail> {
        self.http.get(&format!("/api/orders/{}", id)).await
    }

    pub async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Paginated<OrderDetail>> {
        let path = with_query(
            "/api/orders",
            &[
                ("status", query.status.clone()),
                ("page", query.page.map(|p| p.to_string())),
                ("per_page", query.per_page.map(|p| p.to_string())),
            ],
        );
        self.http.get(&path).await
    }

    pub async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
        comment: Option<String>,
    ) -> ClientResult<Order> {
        let req = StatusUpdateRequest {
            status: status.as_str().to_string(),
            comment,
        };
        self.http
            .put(&format!("/api/orders/{}/status", id), &req)
            .await
    }

    pub async fn update_payment(&self, id: i64, req: &PaymentUpdateRequest) -> ClientResult<Order> {
        self.http
            .put(&format!("/api/orders/{}/payment", id), req)
            .await
    }

    /// Cancel an order and restore its stock
    pub async fn cancel_order(&self, id: i64) -> ClientResult<Order> {
        self.http.delete(&format!("/api/orders/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/api/books", &[("lang", None)]), "/api/books");
        assert_eq!(
            with_query(
                "/api/books",
                &[("lang", Some("ta".into())), ("page", None), ("per_page", Some("20".into()))]
            ),
            "/api/books?lang=ta&per_page=20"
        );
    }

    #[test]
    fn test_with_query_encodes_values() {
        assert_eq!(
            with_query("/api/orders", &[("status", Some("a b&c".into()))]),
            "/api/orders?status=a%20b%26c"
        );
        assert_eq!(
            with_query("/api/books", &[("lang", Some("த".into()))]),
            "/api/books?lang=%E0%AE%A4"
        );
    }
}
