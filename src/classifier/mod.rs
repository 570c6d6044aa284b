pub mod labels;
pub mod postprocess;
pub mod preprocess;
pub mod tract;

use crate::acquire::ImageHandle;
use crate::error::ClassifyError;
use crate::models::Prediction;

pub use tract::TractClassifier;

/// A pretrained model that ranks labels for a decoded image.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait Classifier: Send + Sync {
    /// Predictions ordered by descending probability.
    fn classify(&self, image: &ImageHandle) -> Result<Vec<Prediction>, ClassifyError>;

    fn label_count(&self) -> usize;
}
