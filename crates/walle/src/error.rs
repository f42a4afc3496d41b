use esf::{HsmError, KernelError, TimeEventError};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error(transparent)]
    Hsm(#[from] HsmError),
    #[error(transparent)]
    Time(#[from] TimeEventError),
    #[error("{service} failed to start")]
    Startup {
        service: &'static str,
        #[source]
        cause: KernelError,
    },
}

impl BotError {
    /// Splits a kernel start failure into the service that failed and why.
    pub(crate) fn from_start(err: KernelError) -> Self {
        match err {
            KernelError::StartFailed { name, cause } => Self::Startup {
                service: name,
                cause: *cause,
            },
            other => Self::Kernel(other),
        }
    }
}
