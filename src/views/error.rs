use thiserror::Error;
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("sample rate must be a finite value greater than zero")]
    InvalidSampleRate,
    #[error("recording has no channels")]
    EmptyRecording,
    #[error("channel id must not be empty")]
    EmptyChannelId,
    #[error("duplicate channel id: {0}")]
    DuplicateChannel(String),
    #[error("failed to decode json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ViewerError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ViewerError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ViewerError {
    fn from(value: image::ImageError) -> Self {
        ViewerError::Plot(value.to_string())
    }
}
