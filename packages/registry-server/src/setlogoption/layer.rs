use registry_core::LogFields;
use tower::Layer;

use super::SetLogOption;

/// Tower layer that wraps a registry in [`SetLogOption`].
///
/// Lets the element take part in `tower::ServiceBuilder` compositions alongside
/// other registry layers.
#[derive(Debug, Clone, Default)]
pub struct SetLogOptionLayer {
    options: LogFields,
}

impl SetLogOptionLayer {
    pub fn new(options: impl Into<LogFields>) -> Self {
        Self {
            options: options.into(),
        }
    }
}

impl<S> Layer<S> for SetLogOptionLayer {
    type Service = SetLogOption<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SetLogOption::new(self.options.clone(), inner)
    }
}
