use url::Url;

use crate::{
    gateway::{
        PhonePeGateway,
        callback::PaymentCode,
        payin::{self, PaymentInstrument, PaymentOrder, PaymentRequest, RedirectMode},
    },
    orders::{NewOrder, OrderStatus},
    storefront::{InitiateError, api::InitiatePaymentRequest},
};

impl TryFrom<InitiatePaymentRequest> for PaymentOrder {
    type Error = InitiateError;

    fn try_from(InitiatePaymentRequest { data }: InitiatePaymentRequest) -> Result<Self, Self::Error> {
        let buyer_id = data.customer_details.customer_id.trim().to_string();
        if buyer_id.is_empty() {
            return Err(InitiateError::MalformedRequest("customer_id is required"));
        }
        let phone = data.customer_details.customer_phone.trim().to_string();
        if phone.is_empty() {
            return Err(InitiateError::MalformedRequest("customer_phone is required"));
        }
        let redirect_url = match Url::parse(data.success_return_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
            _ => {
                return Err(InitiateError::MalformedRequest(
                    "success_return_url must be an absolute http(s) url",
                ));
            }
        };
        let amount = payin::to_minor_units(data.amount)
            .ok_or(InitiateError::InvalidAmount(data.amount))?;

        Ok(Self {
            transaction_id: payin::new_transaction_id(),
            buyer_id,
            phone,
            amount,
            redirect_url,
        })
    }
}

impl From<&PaymentOrder> for NewOrder {
    fn from(order: &PaymentOrder) -> Self {
        Self {
            transaction_id: order.transaction_id.clone(),
            buyer_id: order.buyer_id.clone(),
            amount: order.amount,
        }
    }
}

impl PhonePeGateway {
    pub(super) fn payment_request<'a>(&'a self, order: &'a PaymentOrder) -> PaymentRequest<'a> {
        PaymentRequest {
            merchant_id: &self.config.merchant_id,
            merchant_transaction_id: &order.transaction_id,
            merchant_user_id: &order.buyer_id,
            amount: order.amount,
            redirect_url: &order.redirect_url,
            redirect_mode: RedirectMode::Post,
            callback_url: &self.callback_url,
            mobile_number: &order.phone,
            payment_instrument: PaymentInstrument::PayPage,
        }
    }
}

impl From<&PaymentCode> for OrderStatus {
    fn from(value: &PaymentCode) -> Self {
        match value {
            PaymentCode::PaymentSuccess => Self::Paid,
            PaymentCode::PaymentError => Self::Failed,
            PaymentCode::Other(_) => Self::PendingUnknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::storefront::api::{CustomerDetails, InitiatePaymentData};

    fn request(amount: rust_decimal::Decimal) -> InitiatePaymentRequest {
        InitiatePaymentRequest {
            data: InitiatePaymentData {
                customer_details: CustomerDetails {
                    customer_id: "buyer-7".into(),
                    customer_phone: "9999999999".into(),
                },
                amount,
                success_return_url: "https://dfordeal.shop/success".into(),
            },
        }
    }

    #[test]
    fn valid_request_becomes_order() {
        let order = PaymentOrder::try_from(request(dec!(199.00))).unwrap();
        assert_eq!(order.amount, 19900);
        assert_eq!(order.buyer_id, "buyer-7");
        assert_eq!(order.phone, "9999999999");
        assert_eq!(order.redirect_url, "https://dfordeal.shop/success");
        assert!(order.transaction_id.starts_with("MUID-"));
    }

    #[test]
    fn each_attempt_gets_its_own_transaction_id() {
        let first = PaymentOrder::try_from(request(dec!(10))).unwrap();
        let second = PaymentOrder::try_from(request(dec!(10))).unwrap();
        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[test]
    fn invalid_amounts() {
        for amount in [dec!(0), dec!(-1), dec!(12.345)] {
            assert!(matches!(
                PaymentOrder::try_from(request(amount)),
                Err(InitiateError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn missing_fields_and_bad_urls() {
        let mut blank_id = request(dec!(1));
        blank_id.data.customer_details.customer_id = "  ".into();
        assert!(matches!(
            PaymentOrder::try_from(blank_id),
            Err(InitiateError::MalformedRequest(_))
        ));

        let mut blank_phone = request(dec!(1));
        blank_phone.data.customer_details.customer_phone = String::new();
        assert!(matches!(
            PaymentOrder::try_from(blank_phone),
            Err(InitiateError::MalformedRequest(_))
        ));

        for url in ["not a url", "/success", "ftp://dfordeal.shop/success"] {
            let mut bad_url = request(dec!(1));
            bad_url.data.success_return_url = url.into();
            assert!(matches!(
                PaymentOrder::try_from(bad_url),
                Err(InitiateError::MalformedRequest(_))
            ));
        }
    }
}
