//! Payment initiation and status.

use tracing::instrument;

use glowhaus_core::models::{PaymentInitiated, PaymentRequest, PaymentStatusReport};

use super::segment;
use crate::auth::TokenStore;
use crate::client::{ApiClient, ApiRequest};
use crate::ApiError;

impl ApiClient {
    /// Start a payment for an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API rejects the phone number
    /// or the order cannot be paid.
    #[instrument(skip(self, store, request), fields(order_id = %request.order_id, method = ?request.method))]
    pub async fn initiate_payment<S: TokenStore>(
        &self,
        store: &S,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiated, ApiError> {
        let request = ApiRequest::post("/api/payments/initiate/").json(request)?;
        self.send_authed(store, request).await
    }

    /// Current status of a payment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown references.
    pub async fn payment_status<S: TokenStore>(
        &self,
        store: &S,
        reference: &str,
    ) -> Result<PaymentStatusReport, ApiError> {
        let path = format!("/api/payments/status/{}/", segment(reference)?);
        let mut report: PaymentStatusReport = self.send_authed(store, ApiRequest::get(path)).await?;
        if report.reference.is_empty() {
            reference.clone_into(&mut report.reference);
        }
        Ok(report)
    }
}
