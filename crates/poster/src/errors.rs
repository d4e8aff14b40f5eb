use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("GPX parsing error: {0}")]
    GpxParsing(String),

    #[error("Render error: {0}")]
    Render(String),
}
