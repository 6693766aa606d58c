pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Slot count or kind drifted between renders of one instance.
    /// Fatal for the instance; the nearest boundary captures it.
    #[error("hook contract violation in `{component}`: {detail}")]
    HookContractViolation { component: String, detail: String },

    /// A render function failed
    #[error("render of `{component}` failed: {message}")]
    RenderThrew { component: String, message: String },

    /// `component_type` is not present in the component registry
    #[error("unknown component type `{0}`")]
    UnknownComponentType(String),

    /// A boundary's fallback failed while rendering.
    /// There is nothing left to substitute; this is a fatal diagnostic.
    #[error("error boundary fallback failed: {message}")]
    FallbackFailed { message: String },
}

impl Error {
    /// A render failure raised from inside a component.
    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RenderThrew {
            component: component.into(),
            message: message.into(),
        }
    }

    pub(crate) fn hooks(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::HookContractViolation {
            component: component.into(),
            detail: detail.into(),
        }
    }
}
