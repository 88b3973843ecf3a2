//! Command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;

use casemandu_storefront::AppError;
use casemandu_storefront::cart::RemovalError;
use casemandu_storefront::checkout::CheckoutError;
use casemandu_storefront::designs::ComposeError;
use casemandu_storefront::storage::StorageError;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Storefront operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// A name given on the command line matched nothing in the catalog.
    #[error("Unknown {kind}: {query}")]
    NotFound { kind: &'static str, query: String },
}

impl CliError {
    pub const fn not_found(kind: &'static str, query: String) -> Self {
        Self::NotFound { kind, query }
    }

    /// Message for the terminal.
    pub fn user_message(&self) -> String {
        match self {
            Self::App(err) => err.user_message(),
            Self::NotFound { .. } => self.to_string(),
        }
    }

    /// Send operator-relevant failures to Sentry.
    pub fn report(&self) {
        if let Self::App(err) = self {
            err.report();
        }
    }
}

macro_rules! via_app_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(err: $ty) -> Self {
                    Self::App(AppError::from(err))
                }
            }
        )*
    };
}

via_app_error!(
    ComposeError,
    RemovalError,
    CheckoutError,
    StorageError,
    std::io::Error,
);
