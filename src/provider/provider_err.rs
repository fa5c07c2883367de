use aws_sdk_ec2::error::SdkError;
use std::error::Error as StdError;
use std::fmt;

/// The single error kind the provider surfaces. Network, permission,
/// invalid-state and throttling faults all collapse into the
/// provider-supplied message.
#[derive(Debug)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        ProviderError {
            message: message.into(),
        }
    }

    pub fn from_err<E: fmt::Display>(message: &str, err: E) -> Self {
        ProviderError {
            message: format!("{}: {}", message, err),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ProviderError {}

impl<E> From<SdkError<E>> for ProviderError {
    fn from(err: SdkError<E>) -> Self {
        ProviderError::new(format!("AWS SDK error: {}", err))
    }
}
