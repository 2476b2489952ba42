use thiserror::Error;

/// Failure to pull required metrics out of uploaded report text
#[derive(Error, Debug, PartialEq)]
pub enum ExtractionError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Malformed value for {field}: {value}")]
    MalformedValue { field: &'static str, value: String },
}

/// Failure to compose or encode the summary image
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(String),
}

/// Failure to deliver the rendered report to the chat endpoint
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("sendPhoto failed ({photo}); sendDocument fallback failed ({fallback})")]
    Exhausted { photo: String, fallback: String },

    #[error("Telegram API error: {0}")]
    Api(String),
}
