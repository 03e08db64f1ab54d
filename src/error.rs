//! Error handling for the particle field engine

use thiserror::Error;

/// Errors that can occur while configuring or driving a particle field
#[derive(Debug, Error)]
pub enum FieldError {
    /// The configured drawing surface does not exist in the host document
    #[error("Surface not found: {0}")]
    SurfaceNotFound(String),

    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A color string could not be parsed
    #[error("Invalid color: '{0}'")]
    InvalidColor(String),

    /// Options could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host environment rejected a drawing or scheduling call
    #[error("Host error: {0}")]
    Host(String),
}

/// Type alias for Results from particle field operations
pub type Result<T> = std::result::Result<T, FieldError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for FieldError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::JSON::stringify(&value)
                    .ok()
                    .and_then(|s| s.as_string())
            })
            .unwrap_or_else(|| "unknown JavaScript exception".to_string());
        FieldError::Host(message)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<FieldError> for wasm_bindgen::JsValue {
    fn from(error: FieldError) -> Self {
        js_sys::Error::new(&error.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = FieldError::SurfaceNotFound("#particles-js".to_string());
        assert_eq!(format!("{}", error), "Surface not found: #particles-js");

        let error = FieldError::InvalidColor("#zz".to_string());
        assert_eq!(format!("{}", error), "Invalid color: '#zz'");
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: FieldError = err.into();
        assert!(matches!(error, FieldError::Json(_)));
    }
}
