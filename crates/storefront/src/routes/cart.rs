//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Cart operations use HTMX for
//! dynamic updates; each mutation sends `HX-Trigger: cart-updated` so the
//! header badge refreshes. Without HTMX the forms fall back to a redirect
//! to `/cart`.
//!
//! Each mutation loads the cart, changes it and saves it back with no
//! locking. Two requests racing on the same session (say, two tabs) are
//! last-write-wins, and one of the changes can be lost.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use glowhaus_core::models::Product;
use glowhaus_core::{CartLine, CartLineKey, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::is_htmx;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{load_cart, save_cart};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

/// Event HTMX listens for to refresh cart widgets.
pub const CART_UPDATED: &str = "cart-updated";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    /// Empty when the product has no variants.
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub key: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub key: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Build a cart line from the product as the API currently prices it.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the variant is unknown or inactive,
/// if the product has variants and none was chosen, or if it is out of
/// stock.
pub fn line_for(product: &Product, variant_id: Option<VariantId>, quantity: u32) -> Result<CartLine> {
    let variant = match variant_id {
        Some(id) => Some(
            product
                .variant(id)
                .filter(|v| v.is_active)
                .ok_or_else(|| AppError::BadRequest("That option is no longer available.".to_string()))?,
        ),
        None if product.active_variants().next().is_some() => {
            return Err(AppError::BadRequest("Choose an option first.".to_string()));
        }
        None => None,
    };

    let in_stock = variant.map_or(product.in_stock, |v| v.in_stock);
    if !product.is_active || !in_stock {
        return Err(AppError::BadRequest(format!("{} is out of stock.", product.name)));
    }

    Ok(CartLine {
        product_id: product.id,
        variant_id: variant.map(|v| v.id),
        slug: product.slug.clone(),
        name: product.name.clone(),
        variant_label: variant.map(|v| v.name.clone()),
        unit_price: product.price_for(variant),
        quantity: quantity.max(1),
        image_url: product.primary_image().map(str::to_string),
    })
}

fn parse_variant(raw: Option<&str>) -> Result<Option<VariantId>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid product option.".to_string())),
        None => Ok(None),
    }
}

async fn cart_view(state: &AppState, session: &Session) -> CartView {
    let cart = load_cart(session).await;
    let settings = state.site_settings().await;
    CartView::new(&cart, &settings, state.config().store.currency)
}

/// Respond to a cart mutation: the items fragment for HTMX, a redirect
/// to the cart page otherwise.
async fn items_or_redirect(state: &AppState, session: &Session, headers: &HeaderMap) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartItemsTemplate {
                cart: cart_view(state, session).await,
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> impl IntoResponse {
    CartShowTemplate {
        cart: cart_view(&state, &session).await,
        page,
    }
}

/// Add item to cart.
///
/// Prices come from an uncached API read, never from the form or the
/// catalog cache. HTMX requests get the updated count badge.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let variant_id = parse_variant(form.variant_id.as_deref())?;
    let product = state.api().product_fresh(&form.slug).await?;
    let line = line_for(&product, variant_id, form.quantity.unwrap_or(1))?;

    let mut cart = load_cart(&session).await;
    let key = cart.add(line);
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", &[("line", &key.to_string())]);
    tracing::info!(line = %key, items = cart.item_count(), "Added to cart");

    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Update cart line quantity. Zero removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let key: CartLineKey = form.key.parse()?;

    let mut cart = load_cart(&session).await;
    cart.set_quantity(key, form.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(items_or_redirect(&state, &session, &headers).await)
}

/// Remove a line from the cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let key: CartLineKey = form.key.parse()?;

    let mut cart = load_cart(&session).await;
    cart.remove(key)?;
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Removed from cart", &[("line", &form.key)]);
    Ok(items_or_redirect(&state, &session, &headers).await)
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(items_or_redirect(&state, &session, &headers).await)
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}
