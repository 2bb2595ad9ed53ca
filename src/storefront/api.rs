use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    gateway::{RedirectResult, payin::PaymentOrder},
    orders::NewOrder,
    state::AppState,
    storefront::{ErrorResponse, interaction_log::InteractionSpan},
};

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub data: InitiatePaymentData,
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentData {
    pub customer_details: CustomerDetails,
    /// Major currency units, JSON number or string
    #[serde(deserialize_with = "exact_decimal")]
    pub amount: Decimal,
    pub success_return_url: String,
}

/// Parse the amount from its literal JSON text, without a float round trip.
fn exact_decimal<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let raw = Box::<serde_json::value::RawValue>::deserialize(deserializer)?;
    let literal =
        serde_json::from_str::<String>(raw.get()).unwrap_or_else(|_| raw.get().to_string());
    Decimal::from_str_exact(literal.trim()).map_err(|_| {
        serde::de::Error::custom(format!("amount {literal} is not an exact decimal number"))
    })
}

#[derive(Debug, Deserialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    success: bool,
    redirect_url: String,
}

impl IntoResponse for RedirectResult {
    fn into_response(self) -> Response {
        match self {
            RedirectResult::Redirect { url } => axum::Json(InitiatePaymentResponse {
                success: true,
                redirect_url: url,
            })
            .into_response(),
            RedirectResult::Rejected { message } => {
                ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[instrument(skip_all)]
pub async fn initiate_payment(
    State(AppState { gate, orders, .. }): State<AppState>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Response {
    let order = match PaymentOrder::try_from(request) {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("Rejected payment initiation: {e}");
            return e.into_response();
        }
    };
    let transaction_id = order.transaction_id.as_str();
    tracing::debug!(%transaction_id, amount = order.amount, "Initiating payment");

    let mut span = InteractionSpan::enter();
    let new_order = NewOrder::from(&order);
    let record_order = orders.record_initiated(&new_order);
    let pay = gate.initiate_payment(&order, &mut span);

    let (record_order, pay) = tokio::join!(record_order, pay);
    span.finish("pay");
    if let Err(e) = record_order {
        tracing::error!(%transaction_id, "Failed to record initiated order: {e}");
    }

    match pay {
        Ok(result) => {
            match &result {
                RedirectResult::Redirect { .. } => {
                    tracing::info!(%transaction_id, "Payment initiated")
                }
                RedirectResult::Rejected { message } => {
                    tracing::warn!(%transaction_id, %message, "Processor rejected payment")
                }
            }
            result.into_response()
        }
        Err(e) => {
            tracing::error!(%transaction_id, "Failed to initiate payment: {e}");
            e.into_response()
        }
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/initiate-payment", post(initiate_payment))
        .route("/initiate-phonepe-payment", post(initiate_payment))
}

/// `Json` extractor wrapper that answers with the uniform error body on rejection
pub struct Json<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for Json<T>
where
    T: serde::de::DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let rejection = match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => return Ok(Self(value)),
            Err(e) => e.body_text(),
        };
        Err(ErrorResponse::new(
            StatusCode::BAD_REQUEST,
            format!("malformed request: {rejection}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(amount: &str) -> serde_json::Result<InitiatePaymentRequest> {
        serde_json::from_str(&format!(
            r#"{{"data":{{"customer_details":{{"customer_id":"buyer-7","customer_phone":"9999999999"}},"amount":{amount},"success_return_url":"https://dfordeal.shop/success"}}}}"#
        ))
    }

    #[test]
    fn amount_keeps_every_digit() {
        assert_eq!(parse("199.99").unwrap().data.amount, dec!(199.99));
        assert_eq!(parse(r#""199.00""#).unwrap().data.amount, dec!(199.00));
        assert_eq!(
            parse("199.999999999999999").unwrap().data.amount,
            dec!(199.999999999999999)
        );
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        assert!(parse("null").is_err());
        assert!(parse(r#""ten""#).is_err());
        assert!(parse("true").is_err());
    }
}
