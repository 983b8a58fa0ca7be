use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl NotifyError {
    /// Whether a later run could plausibly succeed without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Smtp(e) => e.is_transient() || e.is_timeout(),
            Self::Address(_) | Self::Message(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_errors_are_permanent() {
        let err: NotifyError = "not an address"
            .parse::<lettre::message::Mailbox>()
            .unwrap_err()
            .into();
        assert!(!err.is_transient());
        assert!(err.to_string().starts_with("Invalid email address"));
    }
}
