//! Account route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::{Email, PaymentMethod};

use crate::api::{Address, ProfileUpdate, User};
use crate::error::AppError;
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{PageContext, RequireAuth, set_current_customer};
use crate::routes::checkout::AddressFormView;
use crate::services::checkout::CheckoutForm;
use crate::state::AppState;

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: AddressFormView,
    pub has_address: bool,
}

impl AccountTemplate {
    fn new(page: PageContext, user: &User) -> Self {
        let address = user.address.as_ref().map_or_else(AddressFormView::default, |a| {
            AddressFormView::from(&CheckoutForm::from_address(a, None))
        });
        Self {
            page,
            name: user.name.clone().unwrap_or_default(),
            phone: user.phone.clone(),
            email: user.email.clone().unwrap_or_default(),
            has_address: user.address.is_some(),
            address,
        }
    }
}

/// Display the account page.
#[instrument(skip(state, page, customer))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let user = state.api().me(&customer.token).await?;
    Ok(AccountTemplate::new(page, &user))
}

/// Profile form data. Address fields are optional as a group.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

impl ProfileForm {
    /// Validate into a profile update.
    ///
    /// The address is saved only when a first line is given, and is then
    /// checked the same way as at checkout.
    fn to_update(&self, phone: &str) -> Result<ProfileUpdate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.".to_string());
        }

        let email = Email::parse_optional(self.email.as_deref())
            .map_err(|_| "Please enter a valid email address.".to_string())?;

        let address = match self.line1.as_deref().map(str::trim) {
            Some(line1) if !line1.is_empty() => Some(self.address(name, phone)?),
            _ => None,
        };

        Ok(ProfileUpdate {
            name: name.to_owned(),
            email: email.map(|e| e.as_str().to_owned()),
            address,
        })
    }

    fn address(&self, name: &str, phone: &str) -> Result<Address, String> {
        let form = CheckoutForm {
            full_name: name.to_owned(),
            phone: phone.to_owned(),
            email: None,
            line1: self.line1.clone().unwrap_or_default(),
            line2: self.line2.clone(),
            landmark: self.landmark.clone(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            pincode: self.pincode.clone().unwrap_or_default(),
            payment_method: PaymentMethod::default(),
        };
        form.validate()
            .map(|valid| valid.address)
            .map_err(|e| e.user_message())
    }
}

/// Update the customer's profile.
#[instrument(skip(state, session, customer, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(mut customer): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    let update = match form.to_update(customer.phone.as_str()) {
        Ok(update) => update,
        Err(message) => {
            flash::push(&session, Toast::error(message)).await;
            return Ok(Redirect::to("/account"));
        }
    };

    match state.api().update_profile(&customer.token, &update).await {
        Ok(user) => {
            customer.name = user.name;
            set_current_customer(&session, &customer).await?;
            flash::push(&session, Toast::success("Profile updated.")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!("Profile update failed: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/account"))
}
