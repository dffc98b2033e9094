//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline for one document:
//! extraction → understanding → standardization → validation → confidence.
//!
//! Uses trait-based DI for the external services (ExtractionService,
//! LanguageService) so the orchestrator remains fully testable with mock
//! implementations. The engines themselves are stateless; only the run
//! record mutates, and the orchestrator owns it exclusively for the
//! duration of the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{
    ConfidenceScore, ConfidenceWeights, DocumentStatus, DocumentType, NormalizedDocument,
    ValidationResult,
};
use crate::pipeline::confidence::ConfidenceCalculator;
use crate::pipeline::extraction::{ExtractionService, RawExtraction, RemoteIcrClient};
use crate::pipeline::standardize::{DataNormalizer, SchemaRegistry, SchemaValidator};
use crate::pipeline::understanding::{LanguageService, RemoteNlpClient};
use crate::pipeline::validation::{AccumulationChecker, AmountEngine, PaymentConditionEngine};
use crate::pipeline::ProcessingError;

// ---------------------------------------------------------------------------
// Run record
// ---------------------------------------------------------------------------

/// One timestamped entry of the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct StageLogEntry {
    pub stage: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Mutable processing record for one document run.
///
/// The orchestrator assumes exclusive ownership of this record while the
/// run executes; concurrent runs for the same document must be serialized
/// by the surrounding system. The stage log is append-only: entries are
/// never edited or removed.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRun {
    pub run_id: Uuid,
    pub file_reference: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_extraction: Option<RawExtraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    stage_log: Vec<StageLogEntry>,
}

impl DocumentRun {
    pub fn new(file_reference: &str, document_type: DocumentType) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            file_reference: file_reference.to_string(),
            document_type,
            status: DocumentStatus::Uploaded,
            uploaded_at: Utc::now(),
            processed_at: None,
            raw_extraction: None,
            normalized: None,
            validation: None,
            confidence: None,
            error_message: None,
            stage_log: Vec::new(),
        }
    }

    fn log(&mut self, stage: &str, message: &str, details: Option<Value>) {
        tracing::info!(run_id = %self.run_id, stage, message);
        self.stage_log.push(StageLogEntry {
            stage: stage.to_string(),
            message: message.to_string(),
            details,
            created_at: Utc::now(),
        });
    }

    /// The ordered audit trail.
    pub fn stage_log(&self) -> &[StageLogEntry] {
        &self.stage_log
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates one document's pipeline run.
///
/// Pure sequencing and failure policy; no I/O of its own beyond the two
/// injected services, and no retries — a failed run is handed back to the
/// execution layer, which owns retry policy.
pub struct DocumentProcessor {
    extraction: Box<dyn ExtractionService + Send + Sync>,
    language: Arc<dyn LanguageService + Send + Sync>,
    registry: SchemaRegistry,
    normalizer: DataNormalizer,
    schema_validator: SchemaValidator,
    amount_engine: AmountEngine,
    accumulation_checker: AccumulationChecker,
    payment_engine: PaymentConditionEngine,
    confidence_calculator: ConfidenceCalculator,
    weights: ConfidenceWeights,
}

impl DocumentProcessor {
    pub fn new(
        extraction: Box<dyn ExtractionService + Send + Sync>,
        language: Arc<dyn LanguageService + Send + Sync>,
    ) -> Self {
        let payment_engine = PaymentConditionEngine::with_language_service(Arc::clone(&language));
        Self {
            extraction,
            language,
            registry: SchemaRegistry::builtin(),
            normalizer: DataNormalizer::new(),
            schema_validator: SchemaValidator::new(),
            amount_engine: AmountEngine::new(),
            accumulation_checker: AccumulationChecker::new(),
            payment_engine,
            confidence_calculator: ConfidenceCalculator::new(),
            weights: ConfidenceWeights::default(),
        }
    }

    /// Override the confidence weights.
    pub fn with_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Run the full pipeline for one document, mutating its run record.
    ///
    /// On failure the run is marked failed with the error stored and a
    /// final audit entry appended, then the error propagates so the
    /// invoking execution layer can apply its own retry policy.
    pub fn process(
        &self,
        run: &mut DocumentRun,
        previous_periods: Option<&[NormalizedDocument]>,
    ) -> Result<(), ProcessingError> {
        run.status = DocumentStatus::Processing;
        run.log("started", "document processing started", None);

        match self.run_stages(run, previous_periods) {
            Ok(()) => {
                run.status = DocumentStatus::Completed;
                run.processed_at = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                tracing::error!(run_id = %run.run_id, error = %e, "document processing failed");
                run.status = DocumentStatus::Failed;
                run.error_message = Some(e.to_string());
                run.log("error", &format!("processing failed: {e}"), None);
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        run: &mut DocumentRun,
        previous_periods: Option<&[NormalizedDocument]>,
    ) -> Result<(), ProcessingError> {
        // Stage 1: extraction
        run.log("extraction", "running ICR extraction", None);
        let extraction = self.extraction.analyze(&run.file_reference)?;
        run.log(
            "extraction_completed",
            &format!("extracted {} page(s)", extraction.pages.len()),
            None,
        );

        // Stage 2: understanding (field mapping)
        run.log(
            "understanding",
            "mapping extracted fields to the target schema",
            None,
        );
        let schema = self.registry.get(run.document_type);
        let mapped = self.language.map_fields(&extraction, schema)?;
        if !mapped.is_object() {
            return Err(ProcessingError::InvalidMapping(
                "language service did not return an object".to_string(),
            ));
        }
        run.log("understanding_completed", "field mapping completed", None);

        // Stage 3: standardization
        run.log("standardization", "normalizing mapped data", None);
        let outcome = self.normalizer.normalize_document(&mapped, run.document_type);
        if !outcome.warnings.is_empty() {
            run.log(
                "standardization_warning",
                &format!(
                    "{} value(s) defaulted during normalization",
                    outcome.warnings.len()
                ),
                Some(json!({"warnings": outcome.warnings})),
            );
        }
        let document = outcome.document;

        let document_value = serde_json::to_value(&document)
            .map_err(|e| ProcessingError::Serialization(e.to_string()))?;
        let report = self.schema_validator.validate(&document_value, schema);
        if !report.is_valid {
            // Schema problems are recorded but do not stop the run; the
            // validation stage still produces an auditable result.
            run.log(
                "standardization_warning",
                &format!("schema validation found {} problem(s)", report.errors.len()),
                Some(json!({"errors": report.errors})),
            );
        }
        run.log(
            "standardization_completed",
            "data standardization completed",
            None,
        );

        // Stage 4: validation engines
        run.log("validation", "running automated validation", None);
        let amount = self.amount_engine.validate_all(&document);

        let contract_value = document
            .contract_info
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ProcessingError::Serialization(e.to_string()))?;
        let accumulation = self.accumulation_checker.validate_all(
            &document,
            previous_periods,
            contract_value.as_ref(),
        );

        let conditions = self.payment_engine.extract_conditions_from_document(&document);
        let validation = ValidationResult::new(amount, accumulation, conditions);
        run.log(
            "validation_completed",
            "automated validation completed",
            Some(json!({"overall_status": validation.overall_status.as_str()})),
        );

        // Stage 5: confidence
        run.log("confidence", "computing confidence score", None);
        let icr = self.confidence_calculator.icr_confidence(&extraction);
        let mapping = self
            .confidence_calculator
            .field_mapping_confidence(&mapped, &schema.required);
        let validation_confidence = self.confidence_calculator.validation_confidence(&validation);
        let logic = self
            .confidence_calculator
            .logic_confidence(&validation.payment_conditions);
        let overall = self.confidence_calculator.overall_confidence(
            icr,
            mapping,
            validation_confidence,
            &self.weights,
        );
        let confidence = ConfidenceScore {
            overall,
            icr_accuracy: icr,
            field_mapping: mapping,
            logic_understanding: logic,
            validation_confidence,
        };
        run.log(
            "confidence_completed",
            &format!("overall confidence {overall:.2}"),
            Some(json!({
                "icr_accuracy": icr,
                "field_mapping": mapping,
                "logic_understanding": logic,
                "validation_confidence": validation_confidence,
                "overall": overall,
            })),
        );

        run.raw_extraction = Some(extraction);
        run.normalized = Some(document);
        run.validation = Some(validation);
        run.confidence = Some(confidence);

        run.log("completed", "document processing completed", None);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a processor against the remote services at their default
/// endpoints.
pub fn build_default_processor() -> DocumentProcessor {
    let extraction = Box::new(RemoteIcrClient::default_local());
    let language: Arc<dyn LanguageService + Send + Sync> =
        Arc::new(RemoteNlpClient::default_local());
    DocumentProcessor::new(extraction, language)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
