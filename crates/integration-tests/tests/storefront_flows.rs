//! End-to-end storefront flows against a fake backend.
//!
//! Covers the cart, OTP login, both checkout paths, order management and the
//! auth guard on account pages.

#![allow(clippy::unwrap_used)]

use shreeaura_integration_tests::{
    TEST_GATEWAY_ORDER_ID, TEST_ORDER_ID, TEST_PHONE, TEST_PRODUCT_ID, TestContext,
    VALID_SIGNATURE, address_form, location,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::new().await;

    let live = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(live.status(), 200);
    assert_eq!(live.text().await.unwrap(), "ok");

    let ready = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(ready.status(), 200);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// =============================================================================
// Catalogue
// =============================================================================

#[tokio::test]
async fn test_product_listing_and_detail() {
    let ctx = TestContext::new().await;

    let listing = ctx.client.get(ctx.url("/products")).send().await.unwrap();
    assert_eq!(listing.status(), 200);
    assert!(listing.text().await.unwrap().contains("Cold Pressed Groundnut Oil"));

    let detail = ctx
        .client
        .get(ctx.url(&format!("/products/{TEST_PRODUCT_ID}")))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), 200);
    let body = detail.text().await.unwrap();
    assert!(body.contains("1 L"));
    assert!(body.contains("17% off"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .get(ctx.url("/products/does-not-exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_and_increment() {
    let ctx = TestContext::new().await;

    let added = ctx.add_to_cart(1).await;
    assert!(added.status().is_redirection());
    assert_eq!(location(&added).as_deref(), Some("/cart"));

    let incremented = ctx
        .client
        .post(ctx.url("/cart/update"))
        .form(&[("product_id", TEST_PRODUCT_ID), ("action", "increment")])
        .send()
        .await
        .unwrap();
    assert!(incremented.status().is_redirection());

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap();
    assert_eq!(cart.status(), 200);
    let body = cart.text().await.unwrap();
    assert!(body.contains("Cold Pressed Groundnut Oil"));
    assert!(body.contains("<span>2</span>"));
    // 2 x 250 crosses the free shipping threshold; handling is 9.
    assert!(body.contains("₹509.00"));
}

#[tokio::test]
async fn test_cart_is_per_session() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(1).await;

    let other = TestContext::new().await;
    let cart = other.client.get(other.url("/cart")).send().await.unwrap();
    let body = cart.text().await.unwrap();
    assert!(!body.contains("Cold Pressed Groundnut Oil"));
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_account_requires_login() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response).as_deref(),
        Some("/auth/login?next=%2Faccount")
    );

    let orders = ctx.client.get(ctx.url("/account/orders")).send().await.unwrap();
    assert_eq!(
        location(&orders).as_deref(),
        Some("/auth/login?next=%2Faccount%2Forders")
    );
}

#[tokio::test]
async fn test_otp_login_flow() {
    let ctx = TestContext::new().await;

    let sent = ctx
        .client
        .post(ctx.url("/auth/otp"))
        .form(&[("phone", "+91 98765 43210")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&sent).as_deref(), Some("/auth/login?step=otp"));
    assert_eq!(ctx.backend.lock().unwrap().otp_requests, vec![TEST_PHONE]);

    let verified = ctx
        .client
        .post(ctx.url("/auth/verify"))
        .form(&[("otp", "123456")])
        .send()
        .await
        .unwrap();
    assert!(verified.status().is_redirection());

    let account = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert_eq!(account.status(), 200);
    assert!(account.text().await.unwrap().contains("Meera Iyer"));
}

#[tokio::test]
async fn test_wrong_otp_stays_logged_out() {
    let ctx = TestContext::new().await;

    ctx.client
        .post(ctx.url("/auth/otp"))
        .form(&[("phone", TEST_PHONE)])
        .send()
        .await
        .unwrap();
    ctx.client
        .post(ctx.url("/auth/verify"))
        .form(&[("otp", "000000")])
        .send()
        .await
        .unwrap();

    let account = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert!(account.status().is_redirection());
}

#[tokio::test]
async fn test_logout_keeps_cart() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;

    let logout = ctx.client.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(location(&logout).as_deref(), Some("/"));

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap();
    assert!(cart.text().await.unwrap().contains("Cold Pressed Groundnut Oil"));

    let account = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert!(account.status().is_redirection());
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_requires_login() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(1).await;

    let response = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response).as_deref(),
        Some("/auth/login?next=%2Fcheckout")
    );
}

#[tokio::test]
async fn test_cash_on_delivery_checkout() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    ctx.add_to_cart(2).await;

    let page = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(page.status(), 200);

    let placed = ctx.checkout("cod").await;
    assert!(placed.status().is_redirection());
    assert_eq!(
        location(&placed).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );

    let order = ctx.backend.lock().unwrap().orders[0].clone();
    assert_eq!(order["paymentMethod"], "cod");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["subtotal"].as_f64(), Some(500.0));
    assert_eq!(order["shippingFee"].as_f64(), Some(0.0));
    assert_eq!(order["handlingFee"].as_f64(), Some(9.0));
    assert_eq!(order["total"].as_f64(), Some(509.0));

    let cart = ctx.client.get(ctx.url("/cart")).send().await.unwrap();
    assert!(!cart.text().await.unwrap().contains("Cold Pressed Groundnut Oil"));

    let detail = ctx
        .client
        .get(ctx.url(&format!("/account/orders/{TEST_ORDER_ID}")))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), 200);
    assert!(detail.text().await.unwrap().contains("12 MG Road"));
}

#[tokio::test]
async fn test_checkout_keeps_earlier_toasts_until_the_order_page() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;

    let placed = ctx.checkout("cod").await;
    assert!(placed.status().is_redirection());

    let body = ctx.page(&format!("/account/orders/{TEST_ORDER_ID}")).await;
    assert!(body.contains("Cold Pressed Groundnut Oil added to cart."));
    assert!(body.contains("placed. Thank you!"));
}

#[tokio::test]
async fn test_checkout_rejects_bad_pincode() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;

    let mut form = address_form();
    form.retain(|(key, _)| *key != "pincode");
    form.push(("pincode", "4110"));
    form.push(("payment_method", "cod"));

    let response = ctx
        .client
        .post(ctx.url("/checkout"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(ctx.backend.lock().unwrap().orders.is_empty());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let ctx = TestContext::new().await;
    ctx.login().await;

    let response = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(location(&response).as_deref(), Some("/cart"));
}

#[tokio::test]
async fn test_online_payment_unavailable_without_gateway_key() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;

    let response = ctx.checkout("online").await;
    assert_eq!(response.status(), 200);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Online payment is unavailable right now")
    );
    assert!(ctx.backend.lock().unwrap().orders.is_empty());
}

// =============================================================================
// Online payment
// =============================================================================

async fn payment_callback(
    ctx: &TestContext,
    gateway_order_id: &str,
    signature: &str,
) -> reqwest::Response {
    ctx.client
        .post(ctx.url("/checkout/payment/callback"))
        .form(&[
            ("gateway_order_id", gateway_order_id),
            ("payment_id", "pay_N1a2b3c4"),
            ("signature", signature),
        ])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_online_payment_success_clears_cart() {
    let ctx = TestContext::with_online_payment().await;
    ctx.login().await;
    ctx.add_to_cart(2).await;

    let widget = ctx.checkout("online").await;
    assert_eq!(widget.status(), 200);
    let body = widget.text().await.unwrap();
    assert!(body.contains(TEST_GATEWAY_ORDER_ID));
    assert!(body.contains("50900"));
    assert!(body.contains("rzp_test_key"));

    // Placed but unpaid: the cart is kept until the backend confirms.
    assert!(ctx.page("/cart").await.contains("Cold Pressed Groundnut Oil"));

    let confirmed = payment_callback(&ctx, TEST_GATEWAY_ORDER_ID, VALID_SIGNATURE).await;
    assert_eq!(
        location(&confirmed).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );

    {
        let backend = ctx.backend.lock().unwrap();
        assert_eq!(backend.orders[0]["paymentMethod"], "online");
        assert_eq!(backend.payment_verifications.len(), 1);
        assert_eq!(backend.payment_verifications[0]["orderId"], TEST_ORDER_ID);
        assert_eq!(backend.payment_verifications[0]["paymentId"], "pay_N1a2b3c4");
    }

    assert!(
        ctx.page(&format!("/account/orders/{TEST_ORDER_ID}"))
            .await
            .contains("Payment received. Thank you!")
    );
    assert!(!ctx.page("/cart").await.contains("Cold Pressed Groundnut Oil"));
}

#[tokio::test]
async fn test_rejected_signature_keeps_cart() {
    let ctx = TestContext::with_online_payment().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;
    ctx.checkout("online").await;

    let rejected = payment_callback(&ctx, TEST_GATEWAY_ORDER_ID, "forged").await;
    assert_eq!(
        location(&rejected).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );
    assert_eq!(ctx.backend.lock().unwrap().payment_verifications.len(), 1);

    let order_page = ctx.page(&format!("/account/orders/{TEST_ORDER_ID}")).await;
    assert!(order_page.contains("confirm your payment"));
    assert!(ctx.page("/cart").await.contains("Cold Pressed Groundnut Oil"));
}

#[tokio::test]
async fn test_callback_for_another_gateway_order_is_not_verified() {
    let ctx = TestContext::with_online_payment().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;
    ctx.checkout("online").await;

    let mismatched = payment_callback(&ctx, "order_SOMEONE_ELSE", VALID_SIGNATURE).await;
    assert_eq!(
        location(&mismatched).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );
    assert!(ctx.backend.lock().unwrap().payment_verifications.is_empty());
    assert!(ctx.page("/cart").await.contains("Cold Pressed Groundnut Oil"));

    // The pending payment was consumed; a replay has nothing to match.
    let replay = payment_callback(&ctx, TEST_GATEWAY_ORDER_ID, VALID_SIGNATURE).await;
    assert_eq!(location(&replay).as_deref(), Some("/account/orders"));
    assert!(ctx.backend.lock().unwrap().payment_verifications.is_empty());
}

#[tokio::test]
async fn test_gateway_failure_after_order_placed() {
    let ctx = TestContext::with_online_payment().await;
    ctx.login().await;
    ctx.add_to_cart(1).await;
    ctx.backend.lock().unwrap().fail_payment_setup = true;

    let response = ctx.checkout("online").await;
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );
    assert_eq!(ctx.backend.lock().unwrap().orders.len(), 1);

    assert!(
        ctx.page(&format!("/account/orders/{TEST_ORDER_ID}"))
            .await
            .contains("Your order was placed but we")
    );
    assert!(!ctx.page("/cart").await.contains("Cold Pressed Groundnut Oil"));
}

// =============================================================================
// Orders
// =============================================================================

async fn place_cod_order(ctx: &TestContext) {
    ctx.login().await;
    ctx.add_to_cart(2).await;
    ctx.checkout("cod").await;
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let ctx = TestContext::new().await;
    place_cod_order(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url(&format!("/account/orders/{TEST_ORDER_ID}/cancel")))
        .send()
        .await
        .unwrap();
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/account/orders/{TEST_ORDER_ID}").as_str())
    );
    assert_eq!(ctx.backend.lock().unwrap().cancelled, vec![TEST_ORDER_ID]);

    let body = ctx.page(&format!("/account/orders/{TEST_ORDER_ID}")).await;
    assert!(body.contains("Your order has been cancelled."));
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled() {
    let ctx = TestContext::new().await;
    place_cod_order(&ctx).await;
    ctx.backend.lock().unwrap().order_status = Some("shipped");

    ctx.client
        .post(ctx.url(&format!("/account/orders/{TEST_ORDER_ID}/cancel")))
        .send()
        .await
        .unwrap();
    assert!(ctx.backend.lock().unwrap().cancelled.is_empty());

    let body = ctx.page(&format!("/account/orders/{TEST_ORDER_ID}")).await;
    assert!(body.contains("can no longer be cancelled"));
}

#[tokio::test]
async fn test_order_invoice() {
    let ctx = TestContext::new().await;
    place_cod_order(&ctx).await;

    let response = ctx
        .client
        .get(ctx.url(&format!("/account/orders/{TEST_ORDER_ID}/invoice")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("INV-"));
    assert!(body.contains("Cold Pressed Groundnut Oil"));
    assert!(body.contains("₹509.00"));
}

// =============================================================================
// Revoked tokens
// =============================================================================

#[tokio::test]
async fn test_revoked_token_logs_customer_out() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    assert!(ctx.page("/cart").await.contains("Hi, Meera Iyer"));

    ctx.backend.lock().unwrap().revoke_tokens = true;

    let orders = ctx.client.get(ctx.url("/account/orders")).send().await.unwrap();
    assert_eq!(orders.status(), 303);
    assert_eq!(
        location(&orders).as_deref(),
        Some("/auth/login?next=%2Faccount%2Forders")
    );

    let cart = ctx.page("/cart").await;
    assert!(!cart.contains("Hi, Meera Iyer"));
    assert!(cart.contains("Your session expired. Please log in again."));

    let account = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert_eq!(
        location(&account).as_deref(),
        Some("/auth/login?next=%2Faccount")
    );
}

#[tokio::test]
async fn test_revoked_token_on_form_post_returns_to_referring_page() {
    let ctx = TestContext::new().await;
    place_cod_order(&ctx).await;
    ctx.backend.lock().unwrap().revoke_tokens = true;

    let order_page = format!("/account/orders/{TEST_ORDER_ID}");
    let response = ctx
        .client
        .post(ctx.url(&format!("{order_page}/cancel")))
        .header("referer", ctx.url(&order_page))
        .send()
        .await
        .unwrap();
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/auth/login?next=%2Faccount%2Forders%2F{TEST_ORDER_ID}").as_str())
    );
    assert!(ctx.backend.lock().unwrap().cancelled.is_empty());
}
