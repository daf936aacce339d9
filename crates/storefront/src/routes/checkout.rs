//! Checkout and payment route handlers.
//!
//! Checkout creates the order through the API and starts a payment, then
//! sends the shopper to a page that polls the payment status every few
//! seconds via HTMX. The poll deadline is anchored to when the payment
//! started (kept in the session), so reloading the page does not extend
//! it. A settled payment stays recorded in the session: revisiting its
//! page shows the outcome without polling, and the cart is emptied only
//! the first time a success is seen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use glowhaus_api::{ApiError, FieldErrors};
use glowhaus_core::models::{NewOrder, PaymentInitiated, PaymentMethod, PaymentRequest};
use glowhaus_core::{OrderId, PaymentStatus, PollDecision, PollPolicy};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::{CheckoutForm, normalize_phone};
use crate::middleware::{RequireAuth, SessionTokenStore, load_cart, save_cart};
use crate::models::{PaymentWatch, session_keys};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub selected_method: PaymentMethod,
    pub methods: [PaymentMethod; 2],
    pub errors: FieldErrors,
}

/// Retry payment form data.
#[derive(Debug, Deserialize)]
pub struct RetryPaymentForm {
    pub phone: String,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Payment waiting page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentPageTemplate {
    pub page: PageContext,
    pub payment: PaymentView,
}

/// Payment status fragment template (for HTMX polling).
#[derive(Template, WebTemplate)]
#[template(path = "partials/payment_status.html")]
pub struct PaymentStatusTemplate {
    pub payment: PaymentView,
}

/// Where a payment stands, from the shopper's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Waiting,
    Succeeded,
    Failed,
    /// No terminal status before the deadline.
    StillProcessing,
}

impl PaymentState {
    /// CSS modifier for the status panel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::StillProcessing => "still-processing",
        }
    }
}

/// Display data for the payment status panel.
#[derive(Debug, Clone)]
pub struct PaymentView {
    pub reference: String,
    pub state: PaymentState,
    pub message: String,
    pub order_id: Option<i64>,
    /// Seconds between status checks while waiting.
    pub poll_seconds: u64,
}

impl PaymentView {
    /// Interpret a poll decision for display.
    #[must_use]
    pub fn new(
        watch: &PaymentWatch,
        policy: &PollPolicy,
        decision: PollDecision,
        last_status: Option<PaymentStatus>,
        api_message: Option<String>,
    ) -> Self {
        let (state, default_message) = match decision {
            PollDecision::Finished(status) if status.is_success() => {
                (PaymentState::Succeeded, status.message())
            }
            PollDecision::Finished(status) => (PaymentState::Failed, status.message()),
            PollDecision::TimedOut => (
                PaymentState::StillProcessing,
                "We haven't heard back about your payment yet. We'll update your order as soon as it comes through.",
            ),
            PollDecision::Continue => (
                PaymentState::Waiting,
                last_status.unwrap_or_default().message(),
            ),
        };
        let message = match state {
            PaymentState::StillProcessing => default_message.to_string(),
            _ => api_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_message.to_string()),
        };

        Self {
            reference: watch.reference.clone(),
            state,
            message,
            order_id: watch.order_id.map(|id| id.as_i64()),
            poll_seconds: policy.interval.as_secs().max(1),
        }
    }

    /// Whether the fragment should keep polling.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.state == PaymentState::Waiting
    }
}

async fn load_watch(session: &Session) -> Option<PaymentWatch> {
    session
        .get::<PaymentWatch>(session_keys::PAYMENT_WATCH)
        .await
        .ok()
        .flatten()
}

/// The session's watch for `reference`, starting one if the session is
/// watching something else.
async fn watch_for(session: &Session, reference: &str) -> Result<PaymentWatch> {
    if let Some(watch) = load_watch(session).await.filter(|w| w.reference == reference) {
        return Ok(watch);
    }
    let watch = PaymentWatch::start(reference, None);
    session.insert(session_keys::PAYMENT_WATCH, &watch).await?;
    Ok(watch)
}

/// Where the watch stands at `now`. A settled watch keeps its outcome
/// whatever the API or the clock says.
fn decide(
    watch: &PaymentWatch,
    policy: &PollPolicy,
    now: DateTime<Utc>,
    status: Option<PaymentStatus>,
) -> PollDecision {
    match watch.finished {
        Some(finished) => PollDecision::Finished(finished),
        None => PollDecision::evaluate(policy, watch.started_at, now, status),
    }
}

/// Record the payment's final status in the session.
///
/// Only the first terminal status counts; a success empties the cart.
async fn settle(session: &Session, watch: &mut PaymentWatch, status: PaymentStatus) -> Result<()> {
    if watch.finished.is_some() {
        return Ok(());
    }
    watch.finished = Some(status);
    session.insert(session_keys::PAYMENT_WATCH, &*watch).await?;

    if status.is_success() {
        let mut cart = load_cart(session).await;
        cart.clear();
        save_cart(session, &cart).await?;
        tracing::info!(reference = %watch.reference, "Payment succeeded");
        add_breadcrumb("payment", "Payment succeeded", &[("reference", &watch.reference)]);
    } else {
        tracing::info!(reference = %watch.reference, status = %status, "Payment ended unsuccessfully");
    }
    Ok(())
}

async fn render_form(
    state: &AppState,
    session: &Session,
    page: PageContext,
    form: CheckoutForm,
    errors: FieldErrors,
) -> Response {
    let cart = load_cart(session).await;
    let settings = state.site_settings().await;
    let selected_method = form
        .payment_method
        .as_deref()
        .and_then(|m| m.parse().ok())
        .unwrap_or_default();

    CheckoutTemplate {
        cart: CartView::new(&cart, &settings, page.currency),
        page,
        form,
        selected_method,
        methods: PaymentMethod::ALL,
        errors,
    }
    .into_response()
}

/// Remember the payment in the session and send the shopper where it
/// continues: the provider's page for card payments, the polling page
/// otherwise.
async fn follow_payment(
    session: &Session,
    initiated: PaymentInitiated,
    order_id: OrderId,
) -> Result<Response> {
    let watch = PaymentWatch::start(&initiated.reference, Some(order_id));
    session.insert(session_keys::PAYMENT_WATCH, &watch).await?;
    tracing::info!(reference = %initiated.reference, order_id = %order_id, "Payment initiated");

    if let Some(url) = initiated.redirect_url.filter(|u| u.starts_with("https://")) {
        return Ok(Redirect::to(&url).into_response());
    }
    Ok(Redirect::to(&format!(
        "/checkout/payment/{}",
        urlencoding::encode(&initiated.reference)
    ))
    .into_response())
}

/// Display the checkout form, prefilled from the shopper's profile.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
) -> Result<Response> {
    let cart = load_cart(store.session()).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut form = CheckoutForm {
        full_name: format!("{} {}", user.first_name, user.last_name).trim().to_string(),
        ..CheckoutForm::default()
    };
    match state.api().profile(&store).await {
        Ok(profile) => form.phone = profile.phone.unwrap_or_default(),
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => tracing::warn!(error = %e, "Failed to load profile for checkout"),
    }

    Ok(render_form(&state, store.session(), page, form, FieldErrors::new()).await)
}

/// Place the order and start payment.
///
/// Validation and API field errors re-render the form. Card payments go
/// to the provider's page; mobile money goes to the polling page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    store: SessionTokenStore,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let session = store.session().clone();
    let cart = load_cart(&session).await;

    let valid = match form.validate(&cart) {
        Ok(valid) => valid,
        Err(errors) => return Ok(render_form(&state, &session, page, form, errors).await),
    };

    let new_order = NewOrder::from_cart(&cart, valid.shipping_address, valid.notes);
    let order = match state.api().create_order(&store, &new_order).await {
        Ok(order) => order,
        Err(ApiError::Validation(mut errors)) => {
            for field in ["full_name", "phone", "address", "city", "postal_code"] {
                errors.rename(&format!("shipping_address.{field}"), field);
            }
            return Ok(render_form(&state, &session, page, form, errors).await);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(order_id = %order.id, total = %order.total, "Order created");
    add_breadcrumb("checkout", "Order created", &[("order_id", &order.id.to_string())]);

    let request = PaymentRequest {
        order_id: order.id,
        phone_number: valid.phone,
        method: valid.payment_method,
    };
    let initiated = match state.api().initiate_payment(&store, &request).await {
        Ok(initiated) => initiated,
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            // The order exists; the shopper can retry payment from it.
            tracing::warn!(error = %e, order_id = %order.id, "Payment initiation failed");
            return Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response());
        }
    };

    follow_payment(&session, initiated, order.id).await
}

/// Retry payment for an order that is still awaiting it.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn retry(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    Path(id): Path<OrderId>,
    Form(form): Form<RetryPaymentForm>,
) -> Result<Response> {
    let order = state.api().order(&store, id).await?;
    if !order.awaiting_payment() {
        return Ok(Redirect::to(&format!("/account/orders/{id}")).into_response());
    }

    let phone = normalize_phone(&form.phone).ok_or_else(|| {
        AppError::BadRequest("Enter a phone number with 9 to 15 digits.".to_string())
    })?;
    let request = PaymentRequest {
        order_id: order.id,
        phone_number: phone,
        method: form.payment_method.as_deref().and_then(|m| m.parse().ok()).unwrap_or_default(),
    };
    let initiated = state.api().initiate_payment(&store, &request).await?;

    follow_payment(store.session(), initiated, order.id).await
}

/// Payment waiting page. The status panel polls itself.
#[instrument(skip_all, fields(reference = %reference))]
pub async fn payment_page(
    _user: RequireAuth,
    session: Session,
    page: PageContext,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    let watch = watch_for(&session, &reference).await?;
    let policy = PollPolicy::default();
    let decision = decide(&watch, &policy, Utc::now(), None);

    Ok(PaymentPageTemplate {
        page,
        payment: PaymentView::new(&watch, &policy, decision, None, None),
    })
}

/// Payment status fragment (HTMX polling target).
///
/// Checks the API once and decides: keep polling, finished, or timed out.
/// A settled payment is rendered from the session without another check.
/// A failed status check counts as "no news" and polling continues until
/// the deadline.
#[instrument(skip_all, fields(reference = %reference))]
pub async fn payment_status(
    State(state): State<AppState>,
    _user: RequireAuth,
    store: SessionTokenStore,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    let session = store.session().clone();
    let mut watch = watch_for(&session, &reference).await?;
    let policy = PollPolicy::default();

    if let Some(finished) = watch.finished {
        return Ok(PaymentStatusTemplate {
            payment: PaymentView::new(&watch, &policy, PollDecision::Finished(finished), Some(finished), None),
        });
    }

    let (status, api_message) = match state.api().payment_status(&store, &reference).await {
        Ok(report) => (Some(report.status), report.message),
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Payment status check failed");
            (None, None)
        }
    };
    let decision = decide(&watch, &policy, Utc::now(), status);

    match decision {
        PollDecision::Finished(status) => settle(&session, &mut watch, status).await?,
        // The watch stays, so a reload still sees the passed deadline.
        PollDecision::TimedOut => tracing::info!(reference = %reference, "Payment polling timed out"),
        PollDecision::Continue => {}
    }

    Ok(PaymentStatusTemplate {
        payment: PaymentView::new(&watch, &policy, decision, status, api_message),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;
    use glowhaus_core::{CartLine, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn watch() -> PaymentWatch {
        PaymentWatch::start("GH-123", Some(OrderId::new(42)))
    }

    fn line(id: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            variant_id: None,
            slug: format!("serum-{id}"),
            name: "Vitamin C Serum".to_string(),
            variant_label: None,
            unit_price: Decimal::new(2_450, 0),
            quantity: 1,
            image_url: None,
        }
    }

    /// A session holding a one-line cart and the watch for "GH-123".
    async fn session_with_watch(watch: &PaymentWatch) -> Session {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = load_cart(&session).await;
        cart.add(line(1));
        save_cart(&session, &cart).await.unwrap();
        session.insert(session_keys::PAYMENT_WATCH, watch).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_success_empties_cart_once() {
        let session = session_with_watch(&watch()).await;

        let mut current = watch_for(&session, "GH-123").await.unwrap();
        settle(&session, &mut current, PaymentStatus::Success).await.unwrap();
        assert!(load_cart(&session).await.is_empty());

        // Shopping resumes, then the old payment page is revisited.
        let mut cart = load_cart(&session).await;
        cart.add(line(2));
        save_cart(&session, &cart).await.unwrap();

        let mut revisited = watch_for(&session, "GH-123").await.unwrap();
        assert_eq!(revisited.finished, Some(PaymentStatus::Success));
        settle(&session, &mut revisited, PaymentStatus::Success).await.unwrap();
        assert_eq!(load_cart(&session).await.item_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_cart() {
        let session = session_with_watch(&watch()).await;

        let mut current = watch_for(&session, "GH-123").await.unwrap();
        settle(&session, &mut current, PaymentStatus::Cancelled).await.unwrap();

        assert_eq!(load_cart(&session).await.item_count(), 1);
        let stored = watch_for(&session, "GH-123").await.unwrap();
        assert_eq!(stored.finished, Some(PaymentStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_settled_watch_ignores_later_status() {
        let session = session_with_watch(&watch()).await;
        let mut current = watch_for(&session, "GH-123").await.unwrap();
        settle(&session, &mut current, PaymentStatus::Failed).await.unwrap();

        let revisited = watch_for(&session, "GH-123").await.unwrap();
        let later = revisited.started_at + TimeDelta::hours(2);
        assert_eq!(
            decide(&revisited, &PollPolicy::default(), later, Some(PaymentStatus::Success)),
            PollDecision::Finished(PaymentStatus::Failed)
        );
        assert_eq!(load_cart(&session).await.item_count(), 1);
    }

    #[tokio::test]
    async fn test_reload_keeps_deadline() {
        let mut stale = watch();
        stale.started_at = Utc::now() - TimeDelta::seconds(120);
        let session = session_with_watch(&stale).await;

        let reloaded = watch_for(&session, "GH-123").await.unwrap();
        assert_eq!(reloaded.started_at, stale.started_at);
        assert_eq!(
            decide(&reloaded, &PollPolicy::default(), Utc::now(), None),
            PollDecision::TimedOut
        );
    }

    #[tokio::test]
    async fn test_other_reference_starts_new_watch() {
        let session = session_with_watch(&watch()).await;

        let other = watch_for(&session, "GH-999").await.unwrap();
        assert_eq!(other.reference, "GH-999");
        assert_eq!(other.finished, None);
        assert_eq!(other.order_id, None);
    }

    #[test]
    fn test_waiting_view_polls() {
        let view = PaymentView::new(
            &watch(),
            &PollPolicy::default(),
            PollDecision::Continue,
            Some(PaymentStatus::Pending),
            None,
        );
        assert_eq!(view.state, PaymentState::Waiting);
        assert!(view.is_polling());
        assert_eq!(view.poll_seconds, 3);
        assert_eq!(view.message, PaymentStatus::Pending.message());
        assert_eq!(view.order_id, Some(42));
    }

    #[test]
    fn test_success_stops_polling() {
        let view = PaymentView::new(
            &watch(),
            &PollPolicy::default(),
            PollDecision::Finished(PaymentStatus::Success),
            Some(PaymentStatus::Success),
            Some("Paid via M-Pesa".to_string()),
        );
        assert_eq!(view.state, PaymentState::Succeeded);
        assert!(!view.is_polling());
        assert_eq!(view.message, "Paid via M-Pesa");
    }

    #[test]
    fn test_failure_states() {
        for status in [PaymentStatus::Failed, PaymentStatus::Cancelled, PaymentStatus::Expired] {
            let view = PaymentView::new(
                &watch(),
                &PollPolicy::default(),
                PollDecision::Finished(status),
                Some(status),
                None,
            );
            assert_eq!(view.state, PaymentState::Failed);
            assert_eq!(view.message, status.message());
        }
    }

    #[test]
    fn test_timeout_shows_still_processing() {
        let view = PaymentView::new(
            &watch(),
            &PollPolicy::default(),
            PollDecision::TimedOut,
            Some(PaymentStatus::Processing),
            Some("Processing".to_string()),
        );
        assert_eq!(view.state, PaymentState::StillProcessing);
        assert!(!view.is_polling());
        assert!(view.message.contains("haven't heard back"));
    }

    #[test]
    fn test_blank_api_message_falls_back() {
        let view = PaymentView::new(
            &watch(),
            &PollPolicy::default(),
            PollDecision::Continue,
            None,
            Some("  ".to_string()),
        );
        assert_eq!(view.message, PaymentStatus::Pending.message());
    }
}
