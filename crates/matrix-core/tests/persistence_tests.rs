use matrix_core::{
    CancellationToken, EngineConfig, PersistedAnalysis, PersistedCompetitor, PersistedSubTab, PersistenceMode,
};
use matrix_model::{ProjectId, RecordId, TabId};
use matrix_test_utils::{scored, setup_engine, structured, tab, ScriptedGenerator};
use pretty_assertions::assert_eq;

fn project() -> ProjectId {
    ProjectId::new("p1")
}

fn stored(id: &str, name: &str, tab_id: Option<&str>, attributes_data: &str) -> PersistedCompetitor {
    PersistedCompetitor {
        id: RecordId::new(id),
        name: name.to_string(),
        tab_id: tab_id.map(TabId::new),
        attributes_data: attributes_data.to_string(),
        source: None,
        tags: Vec::new(),
        creator_profile: None,
    }
}

#[tokio::test]
async fn test_queued_saves_follow_mutation_order() {
    let config = EngineConfig::default().with_persistence(PersistenceMode::Queued);
    let (engine, _generator, sink) = setup_engine(config, ScriptedGenerator::new());
    let mut receipts = engine.take_receipts().unwrap();

    for name in ["A", "B", "C"] {
        engine.add_attribute(&project(), None, name).await.unwrap();
    }

    for expected in 0..3u64 {
        let receipt = receipts.recv().await.unwrap();
        assert_eq!(receipt.sequence, expected);
        assert!(receipt.is_ok());
        assert_eq!(receipt.project_id, project());
    }

    let schemas: Vec<usize> = sink.saved().iter().map(|s| s.sub_tabs[0].attributes.len()).collect();
    assert_eq!(schemas, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_queued_failure_reported_on_receipt() {
    let config = EngineConfig::default().with_persistence(PersistenceMode::Queued);
    let (engine, _generator, sink) = setup_engine(config, ScriptedGenerator::new());
    let mut receipts = engine.take_receipts().unwrap();
    sink.set_failing(true);

    // queued dispatch never surfaces the sink error to the caller
    engine.add_attribute(&project(), None, "Funding").await.unwrap();

    let receipt = receipts.recv().await.unwrap();
    assert!(!receipt.is_ok());
    assert!(engine.tabs(&project()).await[0].schema.contains("Funding"));
}

#[tokio::test]
async fn test_inline_mode_has_no_receipts() {
    let (engine, _generator, _sink) = setup_engine(EngineConfig::default(), ScriptedGenerator::new());
    assert!(engine.take_receipts().is_none());
}

#[tokio::test]
async fn test_legacy_snapshot_loads_into_default_tab() {
    let (engine, _generator, _sink) = setup_engine(EngineConfig::default(), ScriptedGenerator::new());
    let legacy = PersistedAnalysis {
        project_id: project(),
        attributes: vec!["Focus".into(), "Seats".into()],
        analysis_summary: "legacy".into(),
        sub_tabs: Vec::new(),
        competitors: vec![
            stored("1", "Acme", None, r#"{"Focus":"B2B","Seats":40}"#),
            stored("2", "Globex", None, "not json"),
        ],
        updated_at: 0,
    };

    engine.load_project(&legacy).await;

    let tabs = engine.tabs(&project()).await;
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].id.as_str(), "tab_general");
    assert_eq!(tabs[0].name, "General");
    assert_eq!(tabs[0].schema.to_vec(), vec!["Focus", "Seats"]);
    assert_eq!(tabs[0].competitors[0].get("Seats"), Some("40"));
    assert!(tabs[0].competitors[1].attributes.is_empty());
    assert_eq!(engine.analysis_summary(&project()).await, "legacy");
}

#[tokio::test]
async fn test_empty_project_materializes_defaults() {
    let (engine, _generator, _sink) = setup_engine(EngineConfig::default(), ScriptedGenerator::new());
    engine.load_project(&PersistedAnalysis::empty("p1")).await;

    let snapshot = engine.snapshot(&project()).await;
    assert_eq!(
        snapshot.sub_tabs,
        vec![PersistedSubTab {
            id: TabId::new("tab_general"),
            name: "General".into(),
            attributes: vec!["Price".into(), "Features".into()],
        }]
    );
    assert_eq!(snapshot.attributes, vec!["Price", "Features"]);
    assert!(snapshot.updated_at > 0);
}

#[tokio::test]
async fn test_saved_snapshot_reloads_identically() {
    let generator = ScriptedGenerator::new().with_full(Ok(structured(
        "two tabs",
        vec![
            tab("tab_competitors", "Competitors", &["Focus"], vec![scored("a", "Acme", "x", "40%").with_attribute("Focus", "SMB")]),
            tab("tab_adjacent", "Adjacent", &["Region"], vec![scored("b", "Hooli", "x", "70%")]),
        ],
    )));
    let (engine, _generator, sink) = setup_engine(EngineConfig::default(), generator);
    engine.generate(&project(), None, CancellationToken::new()).await.unwrap();

    let saved = sink.last().unwrap();
    // legacy attribute list follows the competitors tab
    assert_eq!(saved.attributes, vec!["Focus"]);
    let json = serde_json::to_string(&saved).unwrap();
    let decoded: PersistedAnalysis = serde_json::from_str(&json).unwrap();

    let (reloaded, _generator, _sink) = setup_engine(EngineConfig::default(), ScriptedGenerator::new());
    reloaded.load_project(&decoded).await;
    assert_eq!(reloaded.tabs(&project()).await, engine.tabs(&project()).await);
}
