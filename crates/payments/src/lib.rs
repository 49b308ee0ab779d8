//! Payment processor integration for the Coding Sprout portal.
//!
//! The processor is an external collaborator reached over HTTP: the portal
//! asks it for hosted checkout sessions and later receives asynchronous
//! "checkout session completed" notifications on a webhook, authenticated
//! by a shared-secret signature.

pub mod checkout;
pub mod webhook;

pub use checkout::{CheckoutProvider, CheckoutRequest, CheckoutSession, HttpCheckoutClient, LineItem};
pub use webhook::{WebhookEvent, SIGNATURE_HEADER};
