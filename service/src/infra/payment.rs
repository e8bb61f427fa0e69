//! [`PaymentGateway`] definitions.

use common::operations::{By, Perform, Select};
use derive_more::{Display, Error as StdError, From};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracerr::Traced;

use crate::domain::payment;

/// Payment gateway operation.
pub use common::Handler as PaymentGateway;

/// Payment as reported by a [`PaymentGateway`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: payment::Id,

    /// Current [`payment::Status`] of this [`Payment`].
    pub status: payment::Status,

    /// Paid amount, in minor currency units.
    pub amount: u64,
}

/// Request to refund a [`Payment`].
#[derive(Clone, Debug)]
pub struct Refund {
    /// ID of the [`Payment`] to refund.
    pub payment_id: payment::Id,

    /// Amount to refund, in minor currency units.
    pub amount: u64,

    /// [`payment::RefundSpeed`] to request.
    pub speed: payment::RefundSpeed,
}

/// [Razorpay]-compatible [`PaymentGateway`] REST client.
///
/// [Razorpay]: https://razorpay.com/docs/api
#[derive(Clone, Debug)]
pub struct Razorpay {
    /// HTTP client to perform requests with.
    client: Client,

    /// Base URL of the API, like `https://api.razorpay.com/v1`.
    base_url: String,

    /// Key ID to authenticate with.
    key_id: String,

    /// Key secret to authenticate with.
    key_secret: SecretString,
}

impl Razorpay {
    /// Default base URL of the API.
    pub const DEFAULT_URL: &'static str = "https://api.razorpay.com/v1";

    /// Creates a new [`Razorpay`] client.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: SecretString,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            key_id: key_id.into(),
            key_secret,
        }
    }

    /// Returns the full URL of the provided API `path`.
    fn url(&self, path: impl AsRef<str>) -> String {
        format!("{}/{}", self.base_url, path.as_ref())
    }

    /// Decodes the provided [`Response`] body, turning gateway error bodies
    /// into [`Error::Rejected`].
    async fn decode<T: DeserializeOwned>(
        resp: Response,
    ) -> Result<T, Traced<Error>> {
        /// Error body of the gateway.
        #[derive(Deserialize)]
        struct Failure {
            /// Error details.
            error: Details,
        }

        /// Error details of the gateway.
        #[derive(Deserialize)]
        struct Details {
            /// Human-readable description.
            description: String,
        }

        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(tracerr::from_and_wrap!(=> Error));
        }

        let text = resp.text().await.unwrap_or_default();
        let msg = serde_json::from_str::<Failure>(&text).map_or_else(
            |_| format!("payment gateway responded with {status}"),
            |f| f.error.description,
        );
        Err(tracerr::new!(Error::Rejected(msg)))
    }
}

impl PaymentGateway<Select<By<Payment, payment::Id>>> for Razorpay {
    type Ok = Payment;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Payment body of the gateway.
        #[derive(Deserialize)]
        struct Body {
            /// Status of the payment.
            status: String,

            /// Paid amount, in minor currency units.
            amount: u64,
        }

        let id = by.into_inner();
        let resp = self
            .client
            .get(self.url(format!("payments/{id}")))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let body: Body = Self::decode(resp).await.map_err(tracerr::wrap!())?;

        Ok(Payment {
            id,
            status: body.status.into(),
            amount: body.amount,
        })
    }
}

impl PaymentGateway<Perform<Refund>> for Razorpay {
    type Ok = payment::RefundId;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(refund): Perform<Refund>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Refund request body of the gateway.
        #[derive(Serialize)]
        struct Request {
            /// Amount to refund, in minor currency units.
            amount: u64,

            /// Processing speed.
            speed: String,
        }

        /// Refund body of the gateway.
        #[derive(Deserialize)]
        struct Body {
            /// ID of the refund.
            id: String,
        }

        let Refund {
            payment_id,
            amount,
            speed,
        } = refund;
        let resp = self
            .client
            .post(self.url(format!("payments/{payment_id}/refund")))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&Request {
                amount,
                speed: speed.to_string(),
            })
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let body: Body = Self::decode(resp).await.map_err(tracerr::wrap!())?;

        Ok(body.id.into())
    }
}

/// [`PaymentGateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Gateway cannot be reached, or responded with garbage.
    #[display("Payment gateway request failed: {_0}")]
    Http(reqwest::Error),

    /// Gateway refused the operation.
    #[display("{_0}")]
    #[from(ignore)]
    Rejected(#[error(not(source))] String),
}
