//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use glowhaus_api::{ApiError, FieldErrors};
use glowhaus_core::OrderId;
use glowhaus_core::models::{PaymentMethod, User};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::forms::{PasswordForm, ProfileForm};
use crate::middleware::{RequireAuth, SessionTokenStore, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::{OrderDetail, OrderSummary, PageContext, Pagination};

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 3;

/// Orders per history page (the API's default page size).
const ORDERS_PAGE_SIZE: u32 = 10;

/// Query flag set after a successful save.
#[derive(Debug, Default, Deserialize)]
pub struct SavedQuery {
    #[serde(default)]
    pub saved: Option<String>,
}

impl SavedQuery {
    fn is_saved(&self) -> bool {
        self.saved.is_some()
    }
}

/// Page query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub page: PageContext,
    pub user: User,
    /// The most recent few orders.
    pub orders: Vec<OrderSummary>,
}

/// Profile edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub form: ProfileForm,
    pub errors: FieldErrors,
    pub saved: bool,
}

/// Change password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/password.html")]
pub struct PasswordTemplate {
    pub page: PageContext,
    pub errors: FieldErrors,
    pub saved: bool,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderSummary>,
    pub pagination: Pagination,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: OrderDetail,
    /// Prefill for the retry-payment form.
    pub phone: String,
    pub methods: [PaymentMethod; 2],
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Display account overview page.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let api = state.api();
    let (profile, orders) = tokio::join!(api.profile(&store), api.my_orders(&store, None));
    let user = profile?;

    let orders = match orders {
        Ok(orders) => orders
            .iter()
            .take(RECENT_ORDERS)
            .map(|o| OrderSummary::new(o, page.currency))
            .collect(),
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load recent orders");
            Vec::new()
        }
    };

    Ok(AccountIndexTemplate {
        page,
        user,
        orders,
    })
}

/// Display profile form.
#[instrument(skip_all)]
pub async fn profile_page(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Query(query): Query<SavedQuery>,
) -> Result<impl IntoResponse> {
    let user = state.api().profile(&store).await?;

    Ok(ProfileTemplate {
        page,
        form: ProfileForm::from(&user),
        errors: FieldErrors::new(),
        saved: query.is_saved(),
    })
}

/// Handle profile form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => return Ok(render_profile(page, form, errors)),
    };

    let updated = match state.api().update_profile(&store, &update).await {
        Ok(updated) => updated,
        Err(ApiError::Validation(mut errors)) => {
            errors.rename("phone_number", "phone");
            return Ok(render_profile(page, form, errors));
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(store.session(), &CurrentUser::from(&updated)).await?;
    tracing::info!("Profile updated");

    Ok(Redirect::to("/account/profile?saved=1").into_response())
}

fn render_profile(page: PageContext, form: ProfileForm, errors: FieldErrors) -> Response {
    ProfileTemplate {
        page,
        form,
        errors,
        saved: false,
    }
    .into_response()
}

/// Display change password form.
#[instrument(skip_all)]
pub async fn password_page(
    _user: RequireAuth,
    page: PageContext,
    Query(query): Query<SavedQuery>,
) -> impl IntoResponse {
    PasswordTemplate {
        page,
        errors: FieldErrors::new(),
        saved: query.is_saved(),
    }
}

/// Handle change password form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    if let Err(errors) = form.validate() {
        return Ok(render_password(page, errors));
    }

    let current = SecretString::from(form.current_password);
    let new = SecretString::from(form.new_password);
    match state.api().change_password(&store, &current, &new).await {
        Ok(()) => {}
        Err(ApiError::Validation(mut errors)) => {
            errors.rename("old_password", "current_password");
            return Ok(render_password(page, errors));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("Password changed");

    Ok(Redirect::to("/account/password?saved=1").into_response())
}

fn render_password(page: PageContext, errors: FieldErrors) -> Response {
    PasswordTemplate {
        page,
        errors,
        saved: false,
    }
    .into_response()
}

/// Display order history.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page_number = query.page.unwrap_or(1).max(1);
    let results = state.api().my_orders(&store, Some(page_number)).await?;

    Ok(OrdersTemplate {
        orders: results
            .iter()
            .map(|o| OrderSummary::new(o, page.currency))
            .collect(),
        pagination: Pagination::new(&results, page_number, ORDERS_PAGE_SIZE, "/account/orders"),
        page,
    })
}

/// Display a single order.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state.api().order(&store, id).await?;
    let phone = order
        .shipping_address
        .as_ref()
        .map(|a| a.phone.clone())
        .unwrap_or_default();

    Ok(OrderTemplate {
        order: OrderDetail::new(&order, page.currency),
        page,
        phone,
        methods: PaymentMethod::ALL,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_from_user() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 9,
            "email": "amina@example.com",
            "first_name": "Amina",
            "last_name": "Otieno",
            "phone": "+254712345678",
        }))
        .unwrap();
        let form = ProfileForm::from(&user);
        assert_eq!(form.first_name, "Amina");
        assert_eq!(form.phone.as_deref(), Some("+254712345678"));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_saved_flag() {
        assert!(SavedQuery { saved: Some("1".to_string()) }.is_saved());
        assert!(!SavedQuery::default().is_saved());
    }
}
