//! Per-document records and batch outcomes

use crate::assembler::AssembledText;
use crate::error::{FailureKind, PipelineError};
use crate::pii::PiiEntity;
use serde::Serialize;

/// Minimum score an entity needs to be kept in a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidencePolicy {
    pub min_score: f32,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self { min_score: 0.0 }
    }
}

impl ConfidencePolicy {
    pub fn new(min_score: f32) -> Self {
        Self {
            min_score: min_score.clamp(0.0, 1.0),
        }
    }

    pub fn accepts(&self, entity: &PiiEntity) -> bool {
        entity.score >= self.min_score
    }
}

/// Final result for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub image_name: String,
    pub detected_text: String,
    pub entities: Vec<PiiEntity>,
}

impl DocumentRecord {
    pub fn has_pii(&self) -> bool {
        !self.entities.is_empty()
    }

    /// The matched substring for each entity
    pub fn entity_values(&self) -> impl Iterator<Item = (&PiiEntity, &str)> {
        self.entities.iter().filter_map(move |e| {
            self.detected_text
                .get(e.start..e.end)
                .map(|value| (e, value))
        })
    }
}

/// Build the record for one image. A record is produced even when no
/// entity survives the policy.
pub fn aggregate(
    image_name: &str,
    text: &AssembledText,
    entities: Vec<PiiEntity>,
    policy: &ConfidencePolicy,
) -> DocumentRecord {
    let text_len = text.len();
    let body = text.as_str();
    let entities = entities
        .into_iter()
        .filter(|entity| {
            let in_bounds = entity.fits(text_len)
                && body.is_char_boundary(entity.start)
                && body.is_char_boundary(entity.end);
            if !in_bounds {
                tracing::warn!(
                    "Dropping {} span {}..{} outside text of {} bytes in {}",
                    entity.entity_type,
                    entity.start,
                    entity.end,
                    text_len,
                    image_name
                );
                return false;
            }
            policy.accepts(entity)
        })
        .collect();

    DocumentRecord {
        image_name: image_name.to_string(),
        detected_text: text.text.clone(),
        entities,
    }
}

/// An image that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFailure {
    pub image_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ImageFailure {
    pub fn from_error(image_name: &str, error: &PipelineError) -> Self {
        Self {
            image_name: image_name.to_string(),
            kind: error.failure_kind(),
            message: error.to_string(),
        }
    }
}

/// Records and failures of a batch, both in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<DocumentRecord>,
    pub errors: Vec<ImageFailure>,
}

impl BatchOutcome {
    pub fn push(&mut self, image_name: &str, result: Result<DocumentRecord, PipelineError>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", image_name, e);
                self.errors.push(ImageFailure::from_error(image_name, &e));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.records.len() + self.errors.len()
    }
}
