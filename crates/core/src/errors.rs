use std::fmt;

use thiserror::Error;

/// External data provider a gateway call was addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    GoogleMaps,
    OpenMeteo,
    Usda,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoogleMaps => "google_maps",
            Self::OpenMeteo => "open_meteo",
            Self::Usda => "usda",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayErrorKind {
    NotFound,
    Transport,
    InvalidResponse,
    Configuration,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{provider} {kind:?}: {message}")]
pub struct GatewayError {
    pub provider: Provider,
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(provider: Provider, kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self { provider, kind, message: message.into() }
    }

    pub fn not_found(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, GatewayErrorKind::NotFound, message)
    }

    pub fn transport(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, GatewayErrorKind::Transport, message)
    }

    pub fn invalid_response(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, GatewayErrorKind::InvalidResponse, message)
    }

    pub fn configuration(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, GatewayErrorKind::Configuration, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == GatewayErrorKind::NotFound
    }
}

/// Failures that reach a chat handler after its own fallbacks ran out.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("chat transport failure: {0}")]
    Transport(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::StorageUnavailable { .. } => "抱歉，資料暫時無法儲存，請稍後再試。",
            Self::ServiceUnavailable { .. } => "抱歉，外部服務暫時無法使用，請稍後再試。",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::StorageUnavailable { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Persistence(message) => InterfaceError::StorageUnavailable { message, correlation_id },
            Self::Transport(message) => InterfaceError::ServiceUnavailable { message, correlation_id },
        }
    }
}
