//! Multi-pass extraction orchestrator

use crate::consistency::{apply_cross_field_rules, attach_consistency_report, is_dangerous, recompute_consistency};
use crate::normalize::normalize_oracle_response;
use crate::patterns::{generic_rules, FieldRule, PatternExtractor};
use crate::profiles::ProfileRegistry;
use crate::store::InMemoryExtractionStore;
use crate::types::{add_note, meta, ProcessedDocument};
use crate::{ExtractorConfig, ExtractorError};
use sds_chemdb::{GuardedChemicalDb, InMemoryChemicalDb};
use sds_composition::{parse_declared_codes, HazardRuleEngine, IngredientParser};
use sds_domain::traits::{
    ChemicalDatabase, DomainCompletionService, ExtractionStore, IdentifierHint, OracleExtractor, OracleResponse,
};
use sds_domain::{
    fields, CasNumber, ConfidenceScorer, ConsistencyReport, DocumentId, DocumentText, ExtractionSource,
    FieldExtraction, FieldFailure, Ingredient, ScoreRequest, ScoringConfig, ValidationStatus,
};
use sds_gatekeeper::{FieldValidator, NOT_FOUND};
use sds_indexer::IndexerPool;
use sds_oracle::is_not_found;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

type Extractions = BTreeMap<String, FieldExtraction>;

/// The SdsExtractor reconciles pattern, oracle and completion signals into
/// one scored record per field
///
/// Passes run in a fixed order: pattern, escalation, normalization,
/// cross-field consistency, external validation, scoring, and conditional
/// domain completion. A failure inside one field is recorded and the
/// document continues; anything else fails the whole document.
///
/// The instance holds no per-document state, so one extractor can process
/// many documents concurrently.
pub struct SdsExtractor<O, C, D = InMemoryChemicalDb, S = InMemoryExtractionStore> {
    oracle: Arc<O>,
    completion: Arc<C>,
    chemical_db: Option<GuardedChemicalDb<D>>,
    store: Option<Arc<Mutex<S>>>,
    indexer: Option<Arc<IndexerPool>>,
    profiles: Arc<ProfileRegistry>,
    hazard_engine: HazardRuleEngine,
    parser: IngredientParser,
    patterns: PatternExtractor,
    validator: FieldValidator,
    scorer: ConfidenceScorer,
    config: ExtractorConfig,
}

impl<O, C> SdsExtractor<O, C> {
    /// Create an extractor without chemical database, store or indexer
    pub fn new(oracle: O, completion: C, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let validator = FieldValidator::new(config.validation.clone());
        let scorer = ConfidenceScorer::new(ScoringConfig {
            default_threshold: config.validation.default_threshold,
            identifier_threshold: config.validation.identifier_threshold,
            cross_validation_boost: config.cross_validation_boost,
            ..ScoringConfig::default()
        });

        Ok(Self {
            oracle: Arc::new(oracle),
            completion: Arc::new(completion),
            chemical_db: None,
            store: None,
            indexer: None,
            profiles: Arc::new(ProfileRegistry::default()),
            hazard_engine: HazardRuleEngine::default(),
            parser: IngredientParser::new(config.parser.clone()),
            patterns: PatternExtractor::new(validator.clone(), config.context_chars),
            validator,
            scorer,
            config,
        })
    }
}

impl<O, C, D, S> SdsExtractor<O, C, D, S> {
    /// Validate identifiers against a chemical database
    pub fn with_chemical_db<D2>(self, chemical_db: GuardedChemicalDb<D2>) -> SdsExtractor<O, C, D2, S> {
        SdsExtractor {
            oracle: self.oracle,
            completion: self.completion,
            chemical_db: Some(chemical_db),
            store: self.store,
            indexer: self.indexer,
            profiles: self.profiles,
            hazard_engine: self.hazard_engine,
            parser: self.parser,
            patterns: self.patterns,
            validator: self.validator,
            scorer: self.scorer,
            config: self.config,
        }
    }

    /// Persist results into a store
    pub fn with_store<S2>(self, store: Arc<Mutex<S2>>) -> SdsExtractor<O, C, D, S2> {
        SdsExtractor {
            oracle: self.oracle,
            completion: self.completion,
            chemical_db: self.chemical_db,
            store: Some(store),
            indexer: self.indexer,
            profiles: self.profiles,
            hazard_engine: self.hazard_engine,
            parser: self.parser,
            patterns: self.patterns,
            validator: self.validator,
            scorer: self.scorer,
            config: self.config,
        }
    }

    /// Hand processed documents to a background indexer
    pub fn with_indexer(mut self, indexer: Arc<IndexerPool>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Use manufacturer profiles for the pattern pass
    pub fn with_profiles(mut self, profiles: ProfileRegistry) -> Self {
        self.profiles = Arc::new(profiles);
        self
    }

    /// Use a custom hazard rule table
    pub fn with_hazard_engine(mut self, engine: HazardRuleEngine) -> Self {
        self.hazard_engine = engine;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }
}

impl<O, C, D, S> SdsExtractor<O, C, D, S>
where
    O: OracleExtractor + Send + Sync + 'static,
    O::Error: Display,
    C: DomainCompletionService + Send + Sync + 'static,
    C::Error: Display,
    D: ChemicalDatabase + Send + Sync + 'static,
    D::Error: Display,
    S: ExtractionStore,
    S::Error: Display,
{
    /// Process one document
    ///
    /// Returns every extraction, the parsed ingredients and the document
    /// confidence. On a document-level failure the store is told the
    /// document failed and no extractions are returned.
    #[instrument(skip_all, fields(document = %document_id))]
    pub async fn process(
        &self,
        document_id: DocumentId,
        text: &str,
        sections: &BTreeMap<u32, String>,
    ) -> Result<ProcessedDocument, ExtractorError> {
        match self.run(document_id, text, sections).await {
            Ok(document) => Ok(document),
            Err(e) => {
                error!("Document {} failed: {}", document_id, e);
                self.mark_failed(document_id, &e.to_string());
                Err(e)
            }
        }
    }

    /// Process text delivered by a [`DocumentTextProvider`](sds_domain::traits::DocumentTextProvider)
    pub async fn process_document(
        &self,
        document_id: DocumentId,
        document: &DocumentText,
    ) -> Result<ProcessedDocument, ExtractorError> {
        self.process(document_id, &document.text, &document.sections).await
    }

    async fn run(
        &self,
        document_id: DocumentId,
        text: &str,
        sections: &BTreeMap<u32, String>,
    ) -> Result<ProcessedDocument, ExtractorError> {
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }
        if text.trim().is_empty() {
            info!("Document {} has no text", document_id);
            return Ok(ProcessedDocument::empty(document_id));
        }

        info!("Processing document {} ({} chars, {} sections)", document_id, length, sections.len());
        let mut failures = Vec::new();

        let ingredients = self.parser.extract(text, sections);
        debug!("Parsed {} ingredients", ingredients.len());

        let mut extractions = self.pattern_pass(text, sections, &mut failures);
        self.escalation_pass(text, &mut extractions, &mut failures).await;

        let extracted = extractions.clone();
        let mut consistency_report = self.reconcile(&ingredients, &mut extractions).await;
        let confidence = self.scorer.aggregate(extractions.values(), &self.config.required_fields);
        let dangerous = is_dangerous(&extractions);

        let completion_applied = dangerous || confidence.completeness < self.config.completion_trigger;
        if completion_applied {
            info!(
                "Running domain completion (dangerous: {}, completeness {:.2})",
                dangerous, confidence.completeness
            );
            let accepted = self
                .completion_pass(&ingredients, &mut extractions, &mut failures)
                .await;
            if accepted > 0 {
                extractions = with_completed_fields(extracted, &extractions);
                consistency_report = self.reconcile(&ingredients, &mut extractions).await;
            }
        }

        self.add_missing_placeholders(&mut extractions);
        let document_confidence = self.scorer.aggregate(extractions.values(), &self.config.required_fields);

        let document = ProcessedDocument {
            document_id,
            extractions,
            ingredients,
            document_confidence,
            consistency_report,
            failures,
            dangerous,
            completion_applied,
        };

        self.persist(&document)?;

        if let Some(indexer) = &self.indexer {
            indexer.dispatch(document.to_index_document(text));
        }

        info!(
            "Document {} complete: {} fields, overall {:.2} ({}), {} failures",
            document_id,
            document.extractions.len(),
            document.document_confidence.overall_confidence,
            document.document_confidence.quality_tier.as_str(),
            document.failures.len()
        );
        Ok(document)
    }

    fn pattern_pass(
        &self,
        text: &str,
        sections: &BTreeMap<u32, String>,
        failures: &mut Vec<FieldFailure>,
    ) -> Extractions {
        let profile = self.profiles.identify(text);
        debug!("Pattern pass using profile '{}'", profile.name());

        let mut extractions = Extractions::new();
        for field in fields::ALL_FIELDS {
            let rules: Vec<&FieldRule> = match self.profiles.patterns_for(profile, field) {
                Ok(rules) => rules,
                Err(reason) => {
                    warn!("Profile rules for {} unusable: {}", field, reason);
                    failures.push(FieldFailure {
                        field: field.to_string(),
                        stage: "pattern".to_string(),
                        reason,
                    });
                    generic_rules(field).iter().collect()
                }
            };

            if let Some(found) = self.patterns.extract_field(field, text, sections, &rules) {
                let mut extraction = found.into_extraction();
                if !profile.is_generic() {
                    extraction
                        .metadata
                        .insert(meta::PROFILE.to_string(), profile.name().to_string());
                }
                extractions.insert(field.to_string(), extraction);
            }
        }

        info!("Pattern pass found {} of {} fields", extractions.len(), fields::ALL_FIELDS.len());
        extractions
    }

    async fn escalation_pass(&self, text: &str, extractions: &mut Extractions, failures: &mut Vec<FieldFailure>) {
        let uncertain: BTreeSet<String> = extractions
            .iter()
            .filter(|(name, e)| !fields::is_pseudo_field(name) && e.confidence() < self.config.escalation_threshold)
            .map(|(name, _)| name.clone())
            .collect();
        let missing: BTreeSet<String> = self
            .config
            .required_fields
            .iter()
            .filter(|f| extractions.get(*f).map_or(true, FieldExtraction::is_empty))
            .cloned()
            .collect();

        if uncertain.is_empty() && missing.is_empty() {
            debug!("No fields to escalate");
            return;
        }
        info!("Escalating {} uncertain and {} missing fields", uncertain.len(), missing.len());

        let targets: Vec<String> = uncertain.union(&missing).cloned().collect();
        let answers = self.ask_oracle(text, targets, failures).await;

        for (field, response) in answers {
            self.merge_oracle_answer(&field, &response, extractions, failures);
        }
    }

    /// One batched call; per-field calls if the batch fails
    async fn ask_oracle(
        &self,
        text: &str,
        targets: Vec<String>,
        failures: &mut Vec<FieldFailure>,
    ) -> BTreeMap<String, OracleResponse> {
        let text: Arc<str> = Arc::from(text);
        let timeout = self.config.oracle_timeout();

        let oracle = Arc::clone(&self.oracle);
        let batch = targets.clone();
        let batch_text = Arc::clone(&text);
        match call_blocking(timeout, move || {
            oracle.extract_many(&batch, &batch_text).map_err(|e| e.to_string())
        })
        .await
        {
            Ok(answers) => {
                return answers
                    .into_iter()
                    .filter(|(field, _)| targets.contains(field))
                    .collect();
            }
            Err(e) => warn!("Batched oracle call failed, falling back to single fields: {}", e),
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let mut tasks = JoinSet::new();
        for field in targets {
            let oracle = Arc::clone(&self.oracle);
            let text = Arc::clone(&text);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let call_field = field.clone();
                let result = call_blocking(timeout, move || {
                    oracle.extract(&call_field, &text).map_err(|e| e.to_string())
                })
                .await;
                (field, result)
            });
        }

        let mut answers = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((field, Ok(response))) => {
                    answers.insert(field, response);
                }
                Ok((field, Err(ExtractorError::Join(reason)))) => {
                    warn!("Oracle call for {} aborted: {}", field, reason);
                    failures.push(FieldFailure {
                        field,
                        stage: "escalation".to_string(),
                        reason,
                    });
                }
                Ok((field, Err(e))) => warn!("Oracle unavailable for {}: {}", field, e),
                Err(e) => warn!("Oracle task failed: {}", e),
            }
        }
        answers
    }

    fn merge_oracle_answer(
        &self,
        field: &str,
        response: &OracleResponse,
        extractions: &mut Extractions,
        failures: &mut Vec<FieldFailure>,
    ) {
        let Some(finding) = normalize_oracle_response(field, response, self.config.default_oracle_confidence) else {
            debug!("Oracle has no answer for {}", field);
            return;
        };

        if !self.validator.is_structurally_valid(field, &finding.value) {
            warn!("Oracle value for {} rejected: '{}'", field, finding.value);
            failures.push(FieldFailure {
                field: field.to_string(),
                stage: "normalization".to_string(),
                reason: format!("oracle value '{}' failed structural validation", finding.value),
            });
            return;
        }

        let raw = finding.value.trim().to_string();
        let canonical = self.validator.normalize(field, &raw).unwrap_or_else(|| raw.clone());
        let source = if canonical != raw {
            ExtractionSource::Normalized
        } else {
            ExtractionSource::Oracle
        };
        let mut candidate = FieldExtraction::new(field, canonical, finding.confidence, source, finding.context);
        candidate.metadata.insert(meta::RAW_VALUE.to_string(), raw);

        match extractions.get(field) {
            Some(prior) if !prior.is_empty() => {
                // Uncertain fields need a strictly better answer
                if candidate.confidence() > prior.confidence() {
                    info!(
                        "Oracle replaces {} ({:.2} -> {:.2})",
                        field,
                        prior.confidence(),
                        candidate.confidence()
                    );
                    extractions.insert(field.to_string(), candidate);
                } else {
                    debug!("Keeping pattern value for {}", field);
                }
            }
            _ => {
                info!("Oracle fills missing {} ({:.2})", field, candidate.confidence());
                extractions.insert(field.to_string(), candidate);
            }
        }
    }

    /// Cross-field rules, hazard consistency, database validation and scoring
    ///
    /// Expects unscored extractions; every pass reads the values it is given.
    async fn reconcile(&self, ingredients: &[Ingredient], extractions: &mut Extractions) -> Option<ConsistencyReport> {
        apply_cross_field_rules(extractions, self.config.cross_field_penalty);
        let report = self.check_hazards(ingredients, extractions);

        if self.chemical_db.is_some() {
            self.external_validation(extractions).await;
        }

        self.rescore(extractions);
        report
    }

    fn check_hazards(
        &self,
        ingredients: &[Ingredient],
        extractions: &mut Extractions,
    ) -> Option<ConsistencyReport> {
        if ingredients.is_empty() {
            extractions.remove(fields::HAZARD_CONSISTENCY);
            return None;
        }
        let report = recompute_consistency(&self.hazard_engine, ingredients, extractions);
        if report.is_inconsistent() {
            warn!("Declared hazards miss {}", report.missing_codes());
        }
        attach_consistency_report(extractions, &report);
        Some(report)
    }

    async fn external_validation(&self, extractions: &mut Extractions) {
        let Some(db) = &self.chemical_db else {
            return;
        };
        let timeout = self.config.lookup_timeout();

        let cas = extractions
            .get(fields::CAS_NUMBER)
            .and_then(|e| CasNumber::parse(&e.value).ok());

        if let Some(cas) = &cas {
            match tokio::time::timeout(timeout, db.by_registry_number(cas)).await {
                Ok(Ok(Some(record))) => {
                    if let Some(e) = extractions.get_mut(fields::CAS_NUMBER) {
                        self.record_match(e, record.cid, &record.name);
                    }
                    match tokio::time::timeout(timeout, db.hazard_codes(&record)).await {
                        Ok(Ok(codes)) => self.corroborate_hazards(extractions, &codes),
                        Ok(Err(e)) => warn!("Hazard lookup for {} failed: {}", cas, e),
                        Err(_) => warn!("Hazard lookup for {} timed out after {:?}", cas, timeout),
                    }
                }
                Ok(Ok(None)) => debug!("No database record for {}", cas),
                Ok(Err(e)) => warn!("Database lookup for {} failed: {}", cas, e),
                Err(_) => warn!("Database lookup for {} timed out after {:?}", cas, timeout),
            }
        }

        let name = extractions
            .get(fields::PRODUCT_NAME)
            .filter(|e| !e.is_empty())
            .map(|e| e.value.clone());

        if let Some(name) = name {
            match tokio::time::timeout(timeout, db.by_name(&name)).await {
                Ok(Ok(Some(record))) => {
                    let Some(e) = extractions.get_mut(fields::PRODUCT_NAME) else {
                        return;
                    };
                    let conflict = cas
                        .as_ref()
                        .filter(|cas| !record.cas_numbers.is_empty() && !record.has_cas(cas.as_str()));
                    match conflict {
                        Some(cas) => {
                            let note = format!(
                                "chemical database lists {} for '{}', document states {}",
                                record.cas_numbers.join(", "),
                                name,
                                cas
                            );
                            warn!("Identifier conflict: {}", note);
                            e.metadata.insert(meta::DB_CONFLICT.to_string(), record.cas_numbers.join(", "));
                            add_note(e, &note);
                        }
                        None => self.record_match(e, record.cid, &record.name),
                    }
                }
                Ok(Ok(None)) => debug!("No database record named '{}'", name),
                Ok(Err(e)) => warn!("Database lookup for '{}' failed: {}", name, e),
                Err(_) => warn!("Database lookup for '{}' timed out after {:?}", name, timeout),
            }
        }
    }

    fn record_match(&self, extraction: &mut FieldExtraction, cid: Option<u64>, name: &str) {
        extraction.metadata.insert(meta::DB_MATCH.to_string(), "true".to_string());
        extraction.metadata.insert(meta::DB_NAME.to_string(), name.to_string());
        if let Some(cid) = cid {
            extraction.metadata.insert(meta::DB_CID.to_string(), cid.to_string());
        }
        extraction.metadata.insert(
            meta::EXTERNAL_BOOST.to_string(),
            self.config.external_match_boost.to_string(),
        );
        debug!("{} matched database record '{}'", extraction.field_name, name);
    }

    fn corroborate_hazards(&self, extractions: &mut Extractions, codes: &[String]) {
        let Some(h) = extractions.get_mut(fields::H_STATEMENTS) else {
            return;
        };
        let declared = parse_declared_codes(&h.value);
        let reference = parse_declared_codes(&codes.join(", "));
        if declared.intersection(&reference).next().is_some() {
            debug!("Declared hazards corroborated by database record");
            h.metadata.insert(meta::CROSS_VALIDATED.to_string(), "true".to_string());
        }
    }

    /// Score every real field from its recorded evidence
    ///
    /// The pre-scoring confidence is kept in metadata, so calling this
    /// again gives the same result.
    pub fn rescore(&self, extractions: &mut BTreeMap<String, FieldExtraction>) {
        for (name, extraction) in extractions.iter_mut() {
            if !fields::is_pseudo_field(name) {
                self.score_field(extraction);
            }
        }
    }

    fn score_field(&self, extraction: &mut FieldExtraction) {
        let read = |key: &str| extraction.metadata.get(key).and_then(|v| v.parse::<f64>().ok());

        let base = read(meta::BASE_CONFIDENCE).unwrap_or_else(|| extraction.confidence());
        let pattern_quality = read(meta::PATTERN_QUALITY).unwrap_or(1.0);
        let validation_boost = read(meta::EXTERNAL_BOOST);
        let cross_validated = extraction
            .metadata
            .get(meta::CROSS_VALIDATED)
            .is_some_and(|v| v == "true");

        let confidence = if extraction.is_empty() {
            0.0
        } else {
            let indicators: Vec<String> = if extraction.context.trim().is_empty() {
                Vec::new()
            } else {
                vec![extraction.context.clone()]
            };
            self.scorer
                .score(&ScoreRequest {
                    field: &extraction.field_name,
                    value: &extraction.value,
                    source: extraction.source,
                    base_confidence: base,
                    validation_boost,
                    cross_validated,
                    pattern_quality,
                    context_indicators: &indicators,
                })
                .confidence
        };

        extraction
            .metadata
            .insert(meta::BASE_CONFIDENCE.to_string(), base.to_string());
        extraction.set_confidence(confidence);

        let verdict = self
            .validator
            .validate(&extraction.field_name, &extraction.value, extraction.confidence());
        let mut status = verdict.status;
        if status == ValidationStatus::Valid && extraction.metadata.contains_key(meta::DB_CONFLICT) {
            status = ValidationStatus::Warning;
        }

        extraction.validation_status = status;
        extraction.message = extraction
            .metadata
            .get(meta::NOTES)
            .filter(|n| !n.is_empty())
            .cloned();
        if let Some(message) = verdict.message {
            extraction.push_message(message);
        }
    }

    /// Best identifier for completion queries and the field it came from
    fn identifier_hint(&self, ingredients: &[Ingredient], extractions: &Extractions) -> Option<(IdentifierHint, &'static str)> {
        let value = |field: &str| {
            extractions
                .get(field)
                .filter(|e| !e.is_empty())
                .map(|e| e.value.trim().to_string())
        };

        if let Some(cas) = value(fields::CAS_NUMBER).and_then(|v| CasNumber::parse(&v).ok()) {
            return Some((IdentifierHint::Registry(cas), fields::CAS_NUMBER));
        }
        if let Some(cas) = ingredients.iter().find_map(|i| i.cas_number.clone()) {
            return Some((IdentifierHint::Registry(cas), fields::CAS_NUMBER));
        }
        if let Some(name) = value(fields::PRODUCT_NAME) {
            return Some((IdentifierHint::Name(name), fields::PRODUCT_NAME));
        }
        value(fields::UN_NUMBER).map(|un| (IdentifierHint::TransportNumber(un), fields::UN_NUMBER))
    }

    /// Returns how many answers were accepted
    async fn completion_pass(
        &self,
        ingredients: &[Ingredient],
        extractions: &mut Extractions,
        failures: &mut Vec<FieldFailure>,
    ) -> usize {
        let Some((hint, hint_field)) = self.identifier_hint(ingredients, extractions) else {
            info!("No identifier available for domain completion");
            return 0;
        };

        let targets: Vec<String> = fields::ALL_FIELDS
            .iter()
            .filter(|f| **f != hint_field)
            .filter(|f| {
                extractions.get(**f).map_or(true, |e| {
                    e.is_empty() || e.confidence() < self.scorer.threshold_for(f)
                })
            })
            .map(|f| f.to_string())
            .collect();

        if targets.is_empty() {
            return 0;
        }
        debug!(
            "Completing {} fields via {} '{}'",
            targets.len(),
            hint.kind(),
            hint.as_str()
        );

        let timeout = self.config.completion_timeout();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let hint = Arc::new(hint);
        let mut tasks = JoinSet::new();
        for field in targets {
            let completion = Arc::clone(&self.completion);
            let semaphore = Arc::clone(&semaphore);
            let hint = Arc::clone(&hint);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let call_field = field.clone();
                let result = call_blocking(timeout, move || {
                    completion.complete(&hint, &call_field).map_err(|e| e.to_string())
                })
                .await;
                (field, result)
            });
        }

        let mut accepted = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((field, Ok(Some(value)))) => {
                    if self.merge_completion(&field, &value, &hint, extractions) {
                        accepted += 1;
                    }
                }
                Ok((field, Ok(None))) => debug!("Completion has nothing for {}", field),
                Ok((field, Err(ExtractorError::Join(reason)))) => {
                    warn!("Completion call for {} aborted: {}", field, reason);
                    failures.push(FieldFailure {
                        field,
                        stage: "completion".to_string(),
                        reason,
                    });
                }
                Ok((field, Err(e))) => warn!("Completion unavailable for {}: {}", field, e),
                Err(e) => warn!("Completion task failed: {}", e),
            }
        }

        info!("Domain completion accepted {} values", accepted);
        accepted
    }

    fn merge_completion(&self, field: &str, value: &str, hint: &IdentifierHint, extractions: &mut Extractions) -> bool {
        let value = value.trim();
        if value.is_empty() || is_not_found(value) {
            return false;
        }
        if !self.validator.is_structurally_valid(field, value) {
            debug!("Completion value for {} rejected: '{}'", field, value);
            return false;
        }

        let canonical = self.validator.normalize(field, value).unwrap_or_else(|| value.to_string());
        let mut candidate = FieldExtraction::new(
            field,
            canonical,
            self.config.default_oracle_confidence,
            ExtractionSource::DomainCompletion,
            format!("{} {}", hint.kind(), hint.as_str()),
        );
        candidate.metadata.insert(meta::RAW_VALUE.to_string(), value.to_string());
        self.score_field(&mut candidate);

        let prior = extractions
            .get(field)
            .filter(|e| !e.is_empty())
            .map_or(0.0, FieldExtraction::confidence);
        if candidate.confidence() > prior {
            info!("Completion sets {} ({:.2} -> {:.2})", field, prior, candidate.confidence());
            extractions.insert(field.to_string(), candidate);
            true
        } else {
            false
        }
    }

    fn add_missing_placeholders(&self, extractions: &mut Extractions) {
        for field in &self.config.required_fields {
            if extractions.contains_key(field) {
                continue;
            }
            let mut placeholder = FieldExtraction::new(field, "", 0.0, ExtractionSource::Pattern, "");
            placeholder.validation_status = ValidationStatus::Invalid;
            placeholder.message = Some(NOT_FOUND.to_string());
            extractions.insert(field.clone(), placeholder);
        }
    }

    fn persist(&self, document: &ProcessedDocument) -> Result<(), ExtractorError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);

        for extraction in document.extractions.values() {
            store
                .replace_field(document.document_id, extraction)
                .map_err(|e| ExtractorError::Store(e.to_string()))?;
        }
        // Fields an earlier run produced but this one did not, such as a
        // consistency report that no longer applies
        let current: BTreeSet<String> = document.extractions.keys().cloned().collect();
        store
            .retain_fields(document.document_id, &current)
            .map_err(|e| ExtractorError::Store(e.to_string()))?;
        store
            .replace_ingredients(document.document_id, &document.ingredients)
            .map_err(|e| ExtractorError::Store(e.to_string()))?;

        debug!("Persisted {} fields", document.extractions.len());
        Ok(())
    }

    fn mark_failed(&self, document_id: DocumentId, message: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store.mark_failed(document_id, message) {
            error!("Could not record failure of {}: {}", document_id, e);
        }
    }
}

/// Overlay accepted completion values on the unscored extractions
///
/// Completion values go back to their base confidence so the next
/// reconcile scores them like everything else.
fn with_completed_fields(mut extracted: Extractions, completed: &Extractions) -> Extractions {
    for (name, extraction) in completed {
        if extraction.source != ExtractionSource::DomainCompletion {
            continue;
        }
        let mut fresh = extraction.clone();
        if let Some(base) = fresh
            .metadata
            .remove(meta::BASE_CONFIDENCE)
            .and_then(|b| b.parse::<f64>().ok())
        {
            fresh.set_confidence(base);
        }
        extracted.insert(name.clone(), fresh);
    }
    extracted
}

/// Run a blocking collaborator call off the executor under a timeout
async fn call_blocking<T, F>(limit: Duration, f: F) -> Result<T, ExtractorError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => Err(ExtractorError::Collaborator(e)),
        Ok(Err(e)) => Err(ExtractorError::Join(e.to_string())),
        Err(_) => Err(ExtractorError::Timeout(limit)),
    }
}
