//! Checkout route handlers.
//!
//! `POST /checkout` places the order. Cash on delivery finishes there; online
//! payment renders the gateway widget, whose callback lands on
//! `/checkout/payment/callback`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::{Cart, PaymentMethod};

use crate::api::{ApiError, PaymentVerification};
use crate::cart_store;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{CurrentCustomer, PendingPayment, session_keys};
use crate::routes::cart::{CartLineView, TotalsView};
use crate::services::checkout::{CheckoutError, CheckoutForm, CheckoutOutcome, CheckoutService};
use crate::state::AppState;

/// Address form values for re-display.
#[derive(Debug, Clone, Default)]
pub struct AddressFormView {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub line1: String,
    pub line2: String,
    pub landmark: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub online_selected: bool,
}

impl From<&CheckoutForm> for AddressFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            full_name: form.full_name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone().unwrap_or_default(),
            line1: form.line1.clone(),
            line2: form.line2.clone().unwrap_or_default(),
            landmark: form.landmark.clone().unwrap_or_default(),
            city: form.city.clone(),
            state: form.state.clone(),
            pincode: form.pincode.clone(),
            online_selected: form.payment_method == PaymentMethod::Online,
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineView>,
    pub totals: TotalsView,
    pub form: AddressFormView,
    pub online_enabled: bool,
}

/// Gateway widget parameters, serialised into the page script.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    pub key_id: String,
    pub gateway_order_id: String,
    /// Amount in paise.
    pub amount: u64,
    pub currency: String,
    pub order_number: String,
    pub total: String,
    pub customer_name: String,
    pub customer_phone: String,
}

/// Online payment page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub page: PageContext,
    pub payment: PaymentView,
}

fn checkout_page(
    state: &AppState,
    page: PageContext,
    cart: &Cart,
    form: &CheckoutForm,
) -> CheckoutTemplate {
    let totals = state.config().fees.quote(cart.subtotal());
    CheckoutTemplate {
        page,
        lines: cart.items.iter().map(CartLineView::from).collect(),
        totals: TotalsView::new(&totals, cart),
        form: AddressFormView::from(form),
        online_enabled: state.config().payment.online_enabled(),
    }
}

/// Form pre-filled from the saved profile, or just the login phone.
async fn prefilled_form(state: &AppState, customer: &CurrentCustomer) -> CheckoutForm {
    match state.api().me(&customer.token).await {
        Ok(user) => user.address.as_ref().map_or_else(
            || CheckoutForm {
                full_name: user.name.clone().unwrap_or_default(),
                phone: customer.phone.as_str().to_owned(),
                email: user.email.clone(),
                ..CheckoutForm::default()
            },
            |address| CheckoutForm::from_address(address, user.email.as_deref()),
        ),
        Err(e) => {
            tracing::warn!("Failed to load profile for checkout: {e}");
            CheckoutForm {
                full_name: customer.name.clone().unwrap_or_default(),
                phone: customer.phone.as_str().to_owned(),
                ..CheckoutForm::default()
            }
        }
    }
}

/// Display the checkout page.
#[instrument(skip(state, session, page, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(customer): RequireAuth,
) -> Result<Response, AppError> {
    let cart = cart_store::load(&session).await?;
    if cart.is_empty() {
        flash::push(&session, Toast::info("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = prefilled_form(&state, &customer).await;
    Ok(checkout_page(&state, page, &cart, &form).into_response())
}

/// Place the order.
///
/// The page context is built only on the branches that render, so toasts
/// queued earlier survive the redirects.
#[instrument(skip(state, session, customer, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let cart = cart_store::load(&session).await?;
    let config = state.config();
    let service = CheckoutService::new(state.api(), &config.fees, &config.payment);

    match service.place_order(&customer, &cart, &form).await {
        Ok(CheckoutOutcome::Placed(order)) => {
            cart_store::clear(&session).await?;
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            flash::push(
                &session,
                Toast::success(format!("Order #{} placed. Thank you!", order.display_number())),
            )
            .await;
            Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
        }
        Ok(CheckoutOutcome::AwaitingPayment { order, payment }) => {
            session
                .insert(
                    session_keys::PENDING_PAYMENT,
                    PendingPayment {
                        order_id: order.id.clone(),
                        payment: payment.clone(),
                    },
                )
                .await?;

            let key_id = payment
                .key_id
                .clone()
                .or_else(|| config.payment.key_id.clone())
                .unwrap_or_default();

            let page =
                PageContext::build(&state, Some(&session), Some(&customer), "/checkout").await;
            Ok(PaymentTemplate {
                page,
                payment: PaymentView {
                    key_id,
                    gateway_order_id: payment.gateway_order_id,
                    amount: payment.amount,
                    currency: payment.currency,
                    order_number: order.display_number(),
                    total: order.total_price().display(),
                    customer_name: order.shipping_address.full_name.clone(),
                    customer_phone: order.shipping_address.phone.clone(),
                },
            }
            .into_response())
        }
        Err(CheckoutError::EmptyCart) => {
            flash::push(&session, Toast::info("Your cart is empty.")).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e @ (CheckoutError::InvalidAddress(_) | CheckoutError::PaymentUnavailable)) => {
            let mut page =
                PageContext::build(&state, Some(&session), Some(&customer), "/checkout").await;
            page.toasts.push(Toast::error(e.user_message()));
            Ok(checkout_page(&state, page, &cart, &form).into_response())
        }
        Err(ref e @ CheckoutError::PaymentSetup {
            ref order_id,
            ref source,
        }) => {
            tracing::error!(%order_id, error = %source, "Payment setup failed after order was placed");
            cart_store::clear(&session).await?;
            flash::push(&session, Toast::error(e.user_message())).await;
            Ok(Redirect::to(&format!("/account/orders/{order_id}")).into_response())
        }
        Err(e @ CheckoutError::Api(ApiError::Unauthorized)) => Err(e.into()),
        Err(e) => {
            tracing::error!("Checkout failed: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// Fields posted back by the gateway widget.
#[derive(Debug, Deserialize)]
pub struct PaymentCallbackForm {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Relay the gateway callback for verification.
///
/// The cart is cleared only once the backend accepts the payment.
#[instrument(skip(state, session, customer, form))]
pub async fn payment_callback(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<PaymentCallbackForm>,
) -> Result<Redirect, AppError> {
    let Some(pending) = session
        .remove::<PendingPayment>(session_keys::PENDING_PAYMENT)
        .await?
    else {
        flash::push(&session, Toast::error("No payment is in progress.")).await;
        return Ok(Redirect::to("/account/orders"));
    };

    let order_page = format!("/account/orders/{}", pending.order_id);

    if pending.payment.gateway_order_id != form.gateway_order_id {
        tracing::warn!(
            order_id = %pending.order_id,
            "Payment callback for a different gateway order"
        );
        flash::push(&session, Toast::error("We couldn't match that payment to your order.")).await;
        return Ok(Redirect::to(&order_page));
    }

    let verification = PaymentVerification {
        order_id: pending.order_id,
        gateway_order_id: form.gateway_order_id,
        payment_id: form.payment_id,
        signature: form.signature,
    };

    let config = state.config();
    let service = CheckoutService::new(state.api(), &config.fees, &config.payment);
    match service.confirm_payment(&customer, &verification).await {
        Ok(()) => {
            cart_store::clear(&session).await?;
            flash::push(&session, Toast::success("Payment received. Thank you!")).await;
        }
        Err(e @ CheckoutError::Api(ApiError::Unauthorized)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!("Payment confirmation failed: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to(&order_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_form_view_from_form() {
        let form = CheckoutForm {
            full_name: "Meera Iyer".to_string(),
            email: None,
            line2: Some("Flat 4".to_string()),
            payment_method: PaymentMethod::Online,
            ..CheckoutForm::default()
        };
        let view = AddressFormView::from(&form);
        assert_eq!(view.full_name, "Meera Iyer");
        assert_eq!(view.email, "");
        assert_eq!(view.line2, "Flat 4");
        assert!(view.online_selected);
    }
}
