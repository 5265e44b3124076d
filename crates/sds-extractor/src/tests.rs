//! Integration tests for the SdsExtractor

#[cfg(test)]
mod tests {
    use crate::{
        meta, split_sections, ExtractorConfig, ExtractorError, InMemoryExtractionStore, ProfileRegistry, SdsExtractor,
    };
    use sds_chemdb::{ChemDbConfig, GuardedChemicalDb, InMemoryChemicalDb};
    use sds_domain::traits::ChemicalRecord;
    use sds_domain::{fields, DocumentId, DocumentText, ExtractionSource, ValidationStatus};
    use sds_indexer::{IndexerConfig, IndexerPool, RecordingIndex};
    use sds_oracle::MockOracle;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    const ACETONE_SHEET: &str = "SAFETY DATA SHEET\n\
        SECTION 1: Identification\n\
        Product name: Acetone\n\
        Manufacturer: ACME Chemicals Ltd\n\
        Emergency telephone: +44 1865 407333\n\
        SECTION 2: Hazards identification\n\
        Signal word: Danger\n\
        Hazard statements: H225 Highly flammable liquid and vapour. H319 Causes serious eye irritation. H336 May cause drowsiness.\n\
        SECTION 3: Composition\n\
        Acetone CAS 67-64-1 >90%\n\
        SECTION 9: Physical and chemical properties\n\
        Flash point: -20 °C\n\
        SECTION 14: Transport information\n\
        UN number: UN1090\n\
        Transport hazard class: 3\n\
        Packing group: II\n\
        Revision date: 03.02.2021\n";

    /// Sparse sheet whose only CAS number is unlabelled
    const LOOSE_CAS_SHEET: &str = "Product name: Solvent Blend\nContains 64-17-5\n";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn extractor(oracle: &MockOracle) -> SdsExtractor<MockOracle, MockOracle> {
        SdsExtractor::new(oracle.clone(), oracle.clone(), ExtractorConfig::default()).unwrap()
    }

    fn no_sections() -> BTreeMap<u32, String> {
        BTreeMap::new()
    }

    fn acetone_record() -> ChemicalRecord {
        ChemicalRecord {
            cid: Some(180),
            name: "Acetone".to_string(),
            synonyms: vec!["propan-2-one".to_string()],
            cas_numbers: vec!["67-64-1".to_string()],
            molecular_formula: Some("C3H6O".to_string()),
        }
    }

    #[tokio::test]
    async fn test_full_sheet_extraction() {
        init_tracing();
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);
        let sections = split_sections(ACETONE_SHEET);
        assert!(sections.contains_key(&14));

        let document = extractor
            .process(DocumentId::new(), ACETONE_SHEET, &sections)
            .await
            .unwrap();

        assert_eq!(document.value(fields::PRODUCT_NAME), Some("Acetone"));
        assert_eq!(document.value(fields::MANUFACTURER), Some("ACME Chemicals Ltd"));
        assert_eq!(document.value(fields::CAS_NUMBER), Some("67-64-1"));
        assert_eq!(document.value(fields::UN_NUMBER), Some("UN1090"));
        assert_eq!(document.value(fields::TRANSPORT_CLASS), Some("3"));
        assert_eq!(document.value(fields::PACKING_GROUP), Some("II"));
        assert_eq!(document.value(fields::H_STATEMENTS), Some("H225, H319, H336"));
        assert_eq!(document.value(fields::SIGNAL_WORD), Some("Danger"));
        assert_eq!(document.value(fields::REVISION_DATE), Some("2021-02-03"));
        assert!(document.value(fields::FLASH_POINT).is_some());
        assert!(document.value(fields::EMERGENCY_PHONE).is_some());

        let product = document.field(fields::PRODUCT_NAME).unwrap();
        assert_eq!(product.source, ExtractionSource::Pattern);
        assert_eq!(product.validation_status, ValidationStatus::Valid);

        // Class 3 and H225 corroborate each other
        let class = document.field(fields::TRANSPORT_CLASS).unwrap();
        assert_eq!(class.metadata.get(meta::CROSS_VALIDATED).map(String::as_str), Some("true"));

        // Declared codes cover everything acetone implies
        let report = document.consistency_report.as_ref().unwrap();
        assert!(!report.is_inconsistent());
        assert!(document.field(fields::HAZARD_CONSISTENCY).is_none());

        assert!(document.dangerous);
        assert!(document.completion_applied);
        assert!(document.failures.is_empty());
        assert_eq!(document.document_confidence.total_fields, fields::ALL_FIELDS.len());
        assert!((document.document_confidence.completeness - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_document() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let document = extractor.process(DocumentId::new(), "   \n", &no_sections()).await.unwrap();

        assert!(document.extractions.is_empty());
        assert_eq!(document.document_confidence.overall_confidence, 0.0);
        assert_eq!(oracle.batch_call_count(), 0);
        assert_eq!(oracle.completion_call_count(), 0);
    }

    #[tokio::test]
    async fn test_confident_oracle_replaces_loose_pattern() {
        let oracle = MockOracle::new();
        oracle.add_answer(fields::CAS_NUMBER, "67-64-1", 0.9);
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        let cas = document.field(fields::CAS_NUMBER).unwrap();
        assert_eq!(cas.value, "67-64-1");
        assert_eq!(cas.source, ExtractionSource::Oracle);
        assert_eq!(oracle.batch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_weaker_oracle_keeps_pattern_value() {
        let oracle = MockOracle::new();
        oracle.add_answer(fields::CAS_NUMBER, "67-64-1", 0.3);
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        let cas = document.field(fields::CAS_NUMBER).unwrap();
        assert_eq!(cas.value, "64-17-5");
        assert_eq!(cas.source, ExtractionSource::Pattern);
    }

    #[tokio::test]
    async fn test_oracle_fills_missing_required_field() {
        let oracle = MockOracle::new();
        oracle.add_text(fields::MANUFACTURER, "Solvents Inc.");
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        let manufacturer = document.field(fields::MANUFACTURER).unwrap();
        assert_eq!(manufacturer.value, "Solvents Inc.");
        assert_eq!(manufacturer.source, ExtractionSource::Oracle);
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_single_fields() {
        let oracle = MockOracle::new();
        oracle.add_answer(fields::CAS_NUMBER, "67-64-1", 0.9);
        oracle.add_error(fields::SIGNAL_WORD);
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        // One uncertain field plus three missing required fields
        assert_eq!(oracle.batch_call_count(), 1);
        assert_eq!(oracle.call_count(), 4);
        assert_eq!(document.value(fields::CAS_NUMBER), Some("67-64-1"));

        // An unavailable oracle is not a field failure; the field stays missing
        assert!(document.failures.is_empty());
        let signal = document.field(fields::SIGNAL_WORD).unwrap();
        assert!(signal.is_empty());
        assert_eq!(signal.validation_status, ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn test_scripted_batch_failure() {
        let oracle = MockOracle::new();
        oracle.fail_batches();
        oracle.add_text(fields::SIGNAL_WORD, "warning");
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        assert!(oracle.call_count() > 0);
        let signal = document.field(fields::SIGNAL_WORD).unwrap();
        assert_eq!(signal.value, "Warning");
        assert_eq!(signal.source, ExtractionSource::Normalized);
    }

    #[tokio::test]
    async fn test_invalid_oracle_value_is_recorded() {
        let oracle = MockOracle::new();
        oracle.add_answer(fields::SIGNAL_WORD, "Maybe", 0.9);
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        assert!(document
            .failures
            .iter()
            .any(|f| f.field == fields::SIGNAL_WORD && f.stage == "normalization"));
        assert!(document.field(fields::SIGNAL_WORD).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_fields_get_placeholders() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let document = extractor
            .process(DocumentId::new(), LOOSE_CAS_SHEET, &no_sections())
            .await
            .unwrap();

        for field in [fields::MANUFACTURER, fields::H_STATEMENTS, fields::SIGNAL_WORD] {
            let placeholder = document.field(field).unwrap();
            assert!(placeholder.is_empty());
            assert_eq!(placeholder.confidence(), 0.0);
            assert_eq!(placeholder.validation_status, ValidationStatus::Invalid);
        }
        assert!(document.value(fields::FLASH_POINT).is_none());
        assert!(document.document_confidence.completeness < 0.5);
    }

    #[tokio::test]
    async fn test_completion_fills_dangerous_goods_fields() {
        let oracle = MockOracle::new();
        oracle.add_completion("67-64-1", fields::UN_NUMBER, "UN 1090");
        oracle.add_completion("67-64-1", fields::SIGNAL_WORD, "Danger");
        let extractor = extractor(&oracle);

        let text = "Product name: Acetone\nCAS No.: 67-64-1\nHazard statements: H225\n";
        let document = extractor.process(DocumentId::new(), text, &no_sections()).await.unwrap();

        assert!(document.dangerous);
        assert!(document.completion_applied);
        assert!(oracle.completion_call_count() > 0);

        let un = document.field(fields::UN_NUMBER).unwrap();
        assert_eq!(un.value, "UN1090");
        assert_eq!(un.source, ExtractionSource::DomainCompletion);
        assert_eq!(un.context, "registry 67-64-1");
        assert_eq!(document.value(fields::SIGNAL_WORD), Some("Danger"));
    }

    #[tokio::test]
    async fn test_completion_clears_packing_group_penalty() {
        let oracle = MockOracle::new();
        oracle.add_completion("67-64-1", fields::UN_NUMBER, "UN 1090");
        let extractor = extractor(&oracle);

        let text = "Product name: Acetone\nCAS No.: 67-64-1\nHazard statements: H225\nPacking group: II\n";
        let document = extractor.process(DocumentId::new(), text, &no_sections()).await.unwrap();

        assert_eq!(document.value(fields::UN_NUMBER), Some("UN1090"));
        let packing = document.field(fields::PACKING_GROUP).unwrap();
        assert_eq!(packing.value, "II");
        assert!(!packing
            .metadata
            .get(meta::NOTES)
            .is_some_and(|n| n.contains("without a UN number")));
        assert!(!packing
            .message
            .as_deref()
            .unwrap_or_default()
            .contains("without a UN number"));
    }

    #[tokio::test]
    async fn test_completion_skipped_for_complete_safe_sheet() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let text = "Product name: Glycerol\n\
            Manufacturer: ACME Chemicals Ltd\n\
            CAS No.: 56-81-5\n\
            Signal word: Warning\n\
            Hazard statements: EUH210\n";
        let document = extractor.process(DocumentId::new(), text, &no_sections()).await.unwrap();

        assert!(!document.dangerous);
        assert!(!document.completion_applied);
        assert_eq!(oracle.completion_call_count(), 0);
    }

    #[tokio::test]
    async fn test_undeclared_corrosive_hazard() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let text = "SECTION 2: Hazards identification\n\
            Hazard statements: H315 Causes skin irritation.\n\
            SECTION 3: Composition\n\
            Sulfuric acid 7664-93-9 10-15%\n";
        let sections = split_sections(text);
        let document = extractor.process(DocumentId::new(), text, &sections).await.unwrap();

        let report = document.consistency_report.as_ref().unwrap();
        assert!(report.is_inconsistent());
        assert_eq!(report.missing_codes(), "H314");

        let pseudo = document.field(fields::HAZARD_CONSISTENCY).unwrap();
        assert_eq!(pseudo.value, "H314");
        assert_eq!(pseudo.validation_status, ValidationStatus::Warning);

        // The pseudo-field does not count as a real field
        assert!(document
            .document_confidence
            .total_fields
            < document.extractions.len());
    }

    #[tokio::test]
    async fn test_cross_field_mismatch_penalizes_weaker_field() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let text = "Product name: Drain Cleaner\n\
            Hazard statements: H225\n\
            UN number: UN1090\n\
            Transport hazard class: 8\n";
        let document = extractor.process(DocumentId::new(), text, &no_sections()).await.unwrap();

        let h = document.field(fields::H_STATEMENTS).unwrap();
        assert_eq!(h.value, "H225");
        assert!(h.metadata[meta::NOTES].contains("transport class 8"));
        assert!(h.message.as_deref().unwrap_or_default().contains("transport class 8"));

        let base: f64 = h.metadata[meta::BASE_CONFIDENCE].parse().unwrap();
        assert!((base - 0.65 * 0.9 * 0.7).abs() < 1e-9);

        let class = document.field(fields::TRANSPORT_CLASS).unwrap();
        assert!(!class.metadata.contains_key(meta::NOTES));
    }

    #[tokio::test]
    async fn test_chemical_database_match() {
        let oracle = MockOracle::new();
        let db = InMemoryChemicalDb::new().with_record(acetone_record(), &["H225", "H319"]);
        let extractor = extractor(&oracle).with_chemical_db(GuardedChemicalDb::new(db, &ChemDbConfig::default()));

        let sections = split_sections(ACETONE_SHEET);
        let document = extractor
            .process(DocumentId::new(), ACETONE_SHEET, &sections)
            .await
            .unwrap();

        let cas = document.field(fields::CAS_NUMBER).unwrap();
        assert_eq!(cas.metadata.get(meta::DB_MATCH).map(String::as_str), Some("true"));
        assert_eq!(cas.metadata.get(meta::DB_CID).map(String::as_str), Some("180"));
        assert!(cas.metadata.contains_key(meta::EXTERNAL_BOOST));

        let product = document.field(fields::PRODUCT_NAME).unwrap();
        assert_eq!(product.metadata.get(meta::DB_NAME).map(String::as_str), Some("Acetone"));

        let h = document.field(fields::H_STATEMENTS).unwrap();
        assert_eq!(h.metadata.get(meta::CROSS_VALIDATED).map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_chemical_database_conflict() {
        let oracle = MockOracle::new();
        let db = InMemoryChemicalDb::new().with_record(acetone_record(), &["H225"]);
        let extractor = extractor(&oracle).with_chemical_db(GuardedChemicalDb::new(db, &ChemDbConfig::default()));

        let text = "SECTION 1: Identification\n\
            Product name: Acetone\n\
            SECTION 3: Composition\n\
            Ethanol CAS 64-17-5 50-60%\n";
        let sections = split_sections(text);
        let document = extractor.process(DocumentId::new(), text, &sections).await.unwrap();

        let product = document.field(fields::PRODUCT_NAME).unwrap();
        assert_eq!(product.value, "Acetone");
        assert!(product.metadata.contains_key(meta::DB_CONFLICT));
        assert!(!product.metadata.contains_key(meta::DB_MATCH));
        assert_ne!(product.validation_status, ValidationStatus::Valid);
        assert!(product.message.as_deref().unwrap_or_default().contains("chemical database lists"));

        let cas = document.field(fields::CAS_NUMBER).unwrap();
        assert!(!cas.metadata.contains_key(meta::DB_MATCH));
    }

    #[tokio::test]
    async fn test_failing_chemical_database_is_not_fatal() {
        let oracle = MockOracle::new();
        let db = InMemoryChemicalDb::new().with_record(acetone_record(), &["H225"]);
        db.set_failing(true);
        let extractor = extractor(&oracle).with_chemical_db(GuardedChemicalDb::new(db, &ChemDbConfig::default()));

        let sections = split_sections(ACETONE_SHEET);
        let document = extractor
            .process(DocumentId::new(), ACETONE_SHEET, &sections)
            .await
            .unwrap();

        let cas = document.field(fields::CAS_NUMBER).unwrap();
        assert_eq!(cas.value, "67-64-1");
        assert!(!cas.metadata.contains_key(meta::DB_MATCH));
    }

    #[tokio::test]
    async fn test_results_are_persisted() {
        let oracle = MockOracle::new();
        let store = Arc::new(Mutex::new(InMemoryExtractionStore::new()));
        let extractor = extractor(&oracle).with_store(Arc::clone(&store));

        let id = DocumentId::new();
        let sections = split_sections(ACETONE_SHEET);
        let document = extractor.process(id, ACETONE_SHEET, &sections).await.unwrap();

        let store = store.lock().unwrap();
        assert_eq!(store.fields_for(id).len(), document.extractions.len());
        assert_eq!(store.field(id, fields::SIGNAL_WORD).unwrap().value, "Danger");
        assert_eq!(store.ingredients(id).map(<[_]>::len), Some(document.ingredients.len()));
        assert!(store.failure(id).is_none());
    }

    #[tokio::test]
    async fn test_reprocessing_converges() {
        let oracle = MockOracle::new();
        let store = Arc::new(Mutex::new(InMemoryExtractionStore::new()));
        let extractor = extractor(&oracle).with_store(Arc::clone(&store));

        let id = DocumentId::new();
        let first = extractor.process(id, LOOSE_CAS_SHEET, &no_sections()).await.unwrap();
        let second = extractor.process(id, LOOSE_CAS_SHEET, &no_sections()).await.unwrap();

        assert_eq!(first.extractions, second.extractions);
        assert_eq!(store.lock().unwrap().fields_for(id).len(), second.extractions.len());
    }

    #[tokio::test]
    async fn test_reprocessing_clears_resolved_consistency_report() {
        let oracle = MockOracle::new();
        let store = Arc::new(Mutex::new(InMemoryExtractionStore::new()));
        let extractor = extractor(&oracle).with_store(Arc::clone(&store));
        let id = DocumentId::new();

        let draft = "SECTION 2: Hazards identification\n\
            Hazard statements: H315 Causes skin irritation.\n\
            SECTION 3: Composition\n\
            Sulfuric acid 7664-93-9 10-15%\n";
        let first = extractor.process(id, draft, &split_sections(draft)).await.unwrap();
        assert!(first.field(fields::HAZARD_CONSISTENCY).is_some());
        assert!(store.lock().unwrap().field(id, fields::HAZARD_CONSISTENCY).is_some());

        let corrected = "SECTION 2: Hazards identification\n\
            Hazard statements: H314 H315\n\
            SECTION 3: Composition\n\
            Sulfuric acid 7664-93-9 10-15%\n";
        let second = extractor.process(id, corrected, &split_sections(corrected)).await.unwrap();
        assert!(!second.consistency_report.as_ref().unwrap().is_inconsistent());
        assert!(second.field(fields::HAZARD_CONSISTENCY).is_none());

        let store = store.lock().unwrap();
        assert!(store.field(id, fields::HAZARD_CONSISTENCY).is_none());
        assert_eq!(store.fields_for(id).len(), second.extractions.len());
    }

    #[tokio::test]
    async fn test_text_too_long_fails_document() {
        let oracle = MockOracle::new();
        let store = Arc::new(Mutex::new(InMemoryExtractionStore::new()));
        let config = ExtractorConfig {
            max_text_length: 20,
            ..ExtractorConfig::default()
        };
        let extractor = SdsExtractor::new(oracle.clone(), oracle.clone(), config)
            .unwrap()
            .with_store(Arc::clone(&store));

        let id = DocumentId::new();
        let result = extractor.process(id, ACETONE_SHEET, &no_sections()).await;

        assert!(matches!(result, Err(ExtractorError::TextTooLong(_, 20))));
        assert!(store.lock().unwrap().failure(id).is_some());
        assert_eq!(oracle.batch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_fails_document() {
        let oracle = MockOracle::new();
        let store = Arc::new(Mutex::new(InMemoryExtractionStore::new()));
        store.lock().unwrap().set_failing(true);
        let extractor = extractor(&oracle).with_store(Arc::clone(&store));

        let id = DocumentId::new();
        let result = extractor.process(id, LOOSE_CAS_SHEET, &no_sections()).await;

        assert!(matches!(result, Err(ExtractorError::Store(_))));
        let store = store.lock().unwrap();
        assert!(store.failure(id).unwrap().contains("store unavailable"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_processed_document_is_indexed() {
        let oracle = MockOracle::new();
        let index = RecordingIndex::new();
        let pool = Arc::new(IndexerPool::start(index.clone(), IndexerConfig::default()).unwrap());
        let extractor = extractor(&oracle).with_indexer(Arc::clone(&pool));

        let id = DocumentId::new();
        let sections = split_sections(ACETONE_SHEET);
        extractor.process(id, ACETONE_SHEET, &sections).await.unwrap();

        pool.shutdown().await.unwrap();
        let indexed = index.documents();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].document_id, id);
        assert_eq!(indexed[0].fields.get(fields::PRODUCT_NAME).map(String::as_str), Some("Acetone"));
        assert_eq!(indexed[0].cas_numbers, vec!["67-64-1"]);
        assert_eq!(pool.metrics().snapshot().indexed, 1);
    }

    #[tokio::test]
    async fn test_broken_profile_falls_back_to_generic_rules() {
        let profiles = ProfileRegistry::from_toml(
            r#"
            version = 1

            [[profiles]]
            name = "broken"
            identifiers = ["Broken Corp"]

            [[profiles.patterns.un_number]]
            regex = '(unclosed'
            "#,
        )
        .unwrap();
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle).with_profiles(profiles);

        let text = "Broken Corp safety data sheet\n\
            Product name: Paint Thinner\n\
            UN number: UN1263\n";
        let document = extractor.process(DocumentId::new(), text, &no_sections()).await.unwrap();

        assert!(document
            .failures
            .iter()
            .any(|f| f.field == fields::UN_NUMBER && f.stage == "pattern"));
        assert_eq!(document.value(fields::UN_NUMBER), Some("UN1263"));

        let product = document.field(fields::PRODUCT_NAME).unwrap();
        assert_eq!(product.metadata.get(meta::PROFILE).map(String::as_str), Some("broken"));
    }

    #[tokio::test]
    async fn test_rescore_is_idempotent() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let sections = split_sections(ACETONE_SHEET);
        let document = extractor
            .process(DocumentId::new(), ACETONE_SHEET, &sections)
            .await
            .unwrap();

        let mut rescored = document.extractions.clone();
        extractor.rescore(&mut rescored);
        extractor.rescore(&mut rescored);

        for (name, original) in &document.extractions {
            let again = &rescored[name];
            assert!(
                (again.confidence() - original.confidence()).abs() < 1e-12,
                "{} drifted from {} to {}",
                name,
                original.confidence(),
                again.confidence()
            );
            assert_eq!(again.validation_status, original.validation_status);
        }
    }

    #[tokio::test]
    async fn test_concurrent_documents() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);
        let sections = split_sections(ACETONE_SHEET);
        let empty = no_sections();

        let (a, b) = tokio::join!(
            extractor.process(DocumentId::from_value(1), ACETONE_SHEET, &sections),
            extractor.process(DocumentId::from_value(2), LOOSE_CAS_SHEET, &empty),
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.value(fields::CAS_NUMBER), Some("67-64-1"));
        assert_eq!(b.value(fields::CAS_NUMBER), Some("64-17-5"));
        assert_ne!(a.document_id, b.document_id);
    }

    #[tokio::test]
    async fn test_process_document_text() {
        let oracle = MockOracle::new();
        let extractor = extractor(&oracle);

        let document = DocumentText {
            text: ACETONE_SHEET.to_string(),
            sections: split_sections(ACETONE_SHEET),
        };
        let processed = extractor.process_document(DocumentId::new(), &document).await.unwrap();
        assert_eq!(processed.value(fields::FLASH_POINT), Some("-20 °C"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let oracle = MockOracle::new();
        let config = ExtractorConfig {
            escalation_threshold: 1.5,
            ..ExtractorConfig::default()
        };
        let result = SdsExtractor::new(oracle.clone(), oracle, config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }
}
