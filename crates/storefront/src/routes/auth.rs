//! Authentication route handlers.
//!
//! Login is two steps: the shopper enters a phone number and receives an OTP,
//! then submits the code. The phone and the post-login target are held in the
//! session between the steps.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::Phone;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{PageContext, clear_current_customer, safe_next, set_current_customer};
use crate::models::{PendingPayment, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    /// `otp` shows the code entry step.
    pub step: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    /// Masked phone number when waiting for the code.
    pub pending_phone: Option<String>,
}

/// Display the login page.
#[instrument(skip(session, page))]
pub async fn login_page(
    session: Session,
    page: PageContext,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if page.is_logged_in() {
        let target = session
            .get::<String>(session_keys::LOGIN_REDIRECT)
            .await?
            .or(query.next);
        return Ok(Redirect::to(safe_next(target.as_deref())).into_response());
    }

    if let Some(next) = query.next.as_deref() {
        session
            .insert(session_keys::LOGIN_REDIRECT, safe_next(Some(next)))
            .await?;
    }

    let pending_phone = if query.step.as_deref() == Some("otp") {
        session
            .get::<Phone>(session_keys::PENDING_PHONE)
            .await?
            .map(|phone| phone.masked())
    } else {
        None
    };

    Ok(LoginTemplate {
        page,
        pending_phone,
    }
    .into_response())
}

/// Phone entry form data.
#[derive(Debug, Deserialize)]
pub struct SendOtpForm {
    pub phone: String,
}

/// Send an OTP to the submitted phone number.
#[instrument(skip(state, session, form))]
pub async fn send_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SendOtpForm>,
) -> Result<Redirect, AppError> {
    match AuthService::new(state.api()).send_otp(&form.phone).await {
        Ok(phone) => {
            session.insert(session_keys::PENDING_PHONE, &phone).await?;
            flash::push(
                &session,
                Toast::success(format!("We sent a code to {}.", phone.masked())),
            )
            .await;
            Ok(Redirect::to("/auth/login?step=otp"))
        }
        Err(e) => {
            tracing::info!("OTP request rejected: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
            Ok(Redirect::to("/auth/login"))
        }
    }
}

/// OTP entry form data.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpForm {
    pub otp: String,
}

/// Verify the submitted OTP and log the customer in.
#[instrument(skip(state, session, form))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyOtpForm>,
) -> Result<Redirect, AppError> {
    let Some(phone) = session.get::<Phone>(session_keys::PENDING_PHONE).await? else {
        flash::push(&session, Toast::info("Please enter your phone number first.")).await;
        return Ok(Redirect::to("/auth/login"));
    };

    let customer = match AuthService::new(state.api()).verify_otp(&phone, &form.otp).await {
        Ok(customer) => customer,
        Err(e) => {
            tracing::info!("OTP verification failed: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
            return Ok(Redirect::to("/auth/login?step=otp"));
        }
    };

    let next: Option<String> = session.remove(session_keys::LOGIN_REDIRECT).await?;
    session.remove::<Phone>(session_keys::PENDING_PHONE).await?;

    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.user_id, Some(&customer.phone.masked()));

    flash::push(
        &session,
        Toast::success(format!("Welcome, {}!", customer.display_name())),
    )
    .await;

    Ok(Redirect::to(safe_next(next.as_deref())))
}

/// Log out. The cart is kept.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_customer(&session).await?;
    session
        .remove::<PendingPayment>(session_keys::PENDING_PAYMENT)
        .await?;
    clear_sentry_user();

    flash::push(&session, Toast::info("You have been logged out.")).await;
    Ok(Redirect::to("/"))
}
