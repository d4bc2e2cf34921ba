//! Integration tests for rumormill-service
//!
//! These run the service end to end over an in-memory SQLite store and a mock
//! text generator.

use rumormill_domain::{
    EventDispatcher, Rumor, RumorCategory, RumorEvent, RumorEventKind, RumorId, RumorQuery,
    RumorSeverity, RumorStatus, RumorStore,
};
use rumormill_llm::MockGenerator;
use rumormill_service::{
    ChannelDispatcher, ContextQuery, CreateRumor, MutationContext, NoopDispatcher, RumorService,
    ServiceConfig, ServiceError, SpreadRequest,
};
use rumormill_store::{SqliteStore, StoreError};
use rumormill_transformer::{content_similarity, ContentTransformer, MutationKind, MutationMode, TransformerConfig};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const EPSILON: f64 = 1e-9;

fn transformer(generator: MockGenerator) -> ContentTransformer<MockGenerator> {
    ContentTransformer::new(generator, TransformerConfig::default()).with_seed(7)
}

fn service_with(
    generator: MockGenerator,
    config: ServiceConfig,
) -> (RumorService<SqliteStore, MockGenerator, ChannelDispatcher>, UnboundedReceiver<RumorEvent>) {
    let (dispatcher, events) = ChannelDispatcher::new();
    let service = RumorService::new(SqliteStore::in_memory().unwrap(), transformer(generator), dispatcher, config)
        .unwrap()
        .with_rng_seed(11);
    (service, events)
}

fn service() -> (RumorService<SqliteStore, MockGenerator, ChannelDispatcher>, UnboundedReceiver<RumorEvent>) {
    service_with(MockGenerator::default(), ServiceConfig::default())
}

fn drain(events: &mut UnboundedReceiver<RumorEvent>) -> Vec<RumorEventKind> {
    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    kinds
}

async fn king_rumor(service: &RumorService<SqliteStore, MockGenerator, ChannelDispatcher>) -> RumorId {
    service
        .create_rumor(
            CreateRumor::new("npc_1", "The king is ill")
                .categories(["political"])
                .severity("major")
                .truth_value(0.8),
        )
        .await
        .unwrap()
}

async fn load(service: &RumorService<SqliteStore, MockGenerator, ChannelDispatcher>, id: RumorId) -> Rumor {
    service.get_rumor(id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_create_and_entity_context() {
    let (service, mut events) = service();
    let id = king_rumor(&service).await;

    let rumor = load(&service, id).await;
    assert_eq!(rumor.believability_for_entity("npc_1"), Some(1.0));
    assert_eq!(rumor.categories(), &[RumorCategory::Political]);
    assert_eq!(rumor.severity, RumorSeverity::Major);
    assert!((rumor.truth_value() - 0.8).abs() < EPSILON);
    assert_eq!(rumor.version, 1);

    let context = service
        .get_rumor_context(&ContextQuery::for_entity("npc_1").limit(5).min_believability(0.0))
        .await
        .unwrap();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].content, "The king is ill");
    assert_eq!(context[0].rumor_id, id);

    assert_eq!(drain(&mut events), vec![RumorEventKind::Created]);
}

#[tokio::test]
async fn test_create_coerces_unknown_names() {
    let (service, _events) = service();
    let id = service
        .create_rumor(
            CreateRumor::new("npc_1", "Strange lights over the marsh")
                .categories(["weather", "gossip", "GOSSIP"])
                .severity("apocalyptic")
                .truth_value(3.0),
        )
        .await
        .unwrap();

    let rumor = load(&service, id).await;
    assert_eq!(rumor.categories(), &[RumorCategory::Other, RumorCategory::Gossip]);
    assert_eq!(rumor.severity, RumorSeverity::Minor);
    assert_eq!(rumor.truth_value(), 1.0);

    let defaults = service
        .create_rumor(CreateRumor::new("npc_1", "The well is dry"))
        .await
        .unwrap();
    let rumor = load(&service, defaults).await;
    assert_eq!(rumor.categories(), &[RumorCategory::Other]);
    assert!((rumor.truth_value() - 0.5).abs() < EPSILON);
}

#[tokio::test]
async fn test_create_rejects_empty_arguments() {
    let (service, mut events) = service();
    let err = service.create_rumor(CreateRumor::new("", "text")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    let err = service.create_rumor(CreateRumor::new("npc_1", "   ")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_spread_sets_starting_belief() {
    let (service, mut events) = service();
    let id = king_rumor(&service).await;

    assert!(service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap());

    let rumor = load(&service, id).await;
    assert!(rumor.entity_knows_rumor("npc_2"));
    let belief = rumor.believability_for_entity("npc_2").unwrap();
    assert!((0.3..=0.7).contains(&belief));
    assert!((belief - 0.62).abs() < EPSILON);

    let record = rumor.spread_for_entity("npc_2").unwrap();
    assert_eq!(record.heard_from_entity_id.as_deref(), Some("npc_1"));
    assert_eq!(record.variant_id, rumor.variants()[0].id);
    assert_eq!(rumor.variants().len(), 1);

    assert_eq!(drain(&mut events), vec![RumorEventKind::Created, RumorEventKind::Spread]);
}

#[tokio::test]
async fn test_repeated_spread_reinforces() {
    let (service, mut events) = service();
    let id = king_rumor(&service).await;

    service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap();
    let first = load(&service, id).await;
    let first_belief = first.believability_for_entity("npc_2").unwrap();
    assert_eq!(first.spread_records().filter(|s| s.entity_id == "npc_2").count(), 1);

    service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap();
    let second = load(&service, id).await;
    let second_belief = second.believability_for_entity("npc_2").unwrap();
    assert!(second_belief > first_belief);
    assert!((second_belief - (0.62 + 0.2 + 0.1 * 0.62)).abs() < EPSILON);
    assert_eq!(second.spread_records().filter(|s| s.entity_id == "npc_2").count(), 1);
    assert_eq!(second.spread_count(), 2);

    assert_eq!(
        drain(&mut events),
        vec![RumorEventKind::Created, RumorEventKind::Spread, RumorEventKind::Reinforced]
    );
}

#[tokio::test]
async fn test_spread_modifiers_are_clamped() {
    let (service, _events) = service();
    let id = king_rumor(&service).await;

    service
        .spread_rumor(SpreadRequest::new(id, "npc_1", "friend").modifiers(0.5, 0.5))
        .await
        .unwrap();
    service
        .spread_rumor(SpreadRequest::new(id, "npc_1", "rival").modifiers(-1.0, -0.5))
        .await
        .unwrap();

    let rumor = load(&service, id).await;
    assert_eq!(rumor.believability_for_entity("friend"), Some(1.0));
    assert_eq!(rumor.believability_for_entity("rival"), Some(0.0));
}

#[tokio::test]
async fn test_spread_failures_return_false() {
    let (service, mut events) = service();
    let id = king_rumor(&service).await;
    drain(&mut events);

    let unknown_rumor = SpreadRequest::new(RumorId::new(), "npc_1", "npc_2");
    assert!(!service.spread_rumor(unknown_rumor).await.unwrap());

    let stranger = SpreadRequest::new(id, "npc_9", "npc_2");
    assert!(!service.spread_rumor(stranger).await.unwrap());

    let bad_variant = SpreadRequest::new(id, "npc_1", "npc_2").variant(rumormill_domain::VariantId::new());
    assert!(!service.spread_rumor(bad_variant).await.unwrap());

    let to_self = SpreadRequest::new(id, "npc_1", "npc_1");
    assert!(!service.spread_rumor(to_self).await.unwrap());

    let err = service.spread_rumor(SpreadRequest::new(id, "", "npc_2")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let rumor = load(&service, id).await;
    assert_eq!(rumor.spread_count(), 1);
    assert_eq!(rumor.version, 1);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_mutating_spread_appends_variant() {
    let generator = MockGenerator::new("The king is dead");
    let (service, mut events) = service_with(generator.clone(), ServiceConfig::default());
    let id = king_rumor(&service).await;

    let request = SpreadRequest::new(id, "npc_1", "npc_2")
        .mutate(1.0)
        .mutation_context(MutationContext {
            traits: vec!["dramatic".to_string()],
            distortion_level: Some(0.6),
            direction: None,
            ..MutationContext::default()
        });
    assert!(service.spread_rumor(request).await.unwrap());
    assert_eq!(generator.call_count(), 1);

    let rumor = load(&service, id).await;
    assert_eq!(rumor.variants().len(), 2);
    let original = &rumor.variants()[0];
    let mutated = &rumor.variants()[1];
    assert_eq!(mutated.content, "The king is dead");
    assert_eq!(mutated.parent_variant_id, Some(original.id));
    assert_eq!(mutated.entity_id, "npc_2");
    assert_eq!(mutated.mutation_metadata.get("teller").map(String::as_str), Some("npc_1"));
    assert_eq!(mutated.mutation_metadata.get("distortion_level").map(String::as_str), Some("0.60"));
    assert_eq!(mutated.mutation_metadata.get("source").map(String::as_str), Some("generated"));
    assert!(mutated.mutation_metadata.contains_key("estimated_truth"));
    assert!(!mutated.mutation_metadata.contains_key("mutation_types"));

    assert_eq!(rumor.current_content_for_entity("npc_2"), Some("The king is dead"));
    assert_eq!(rumor.current_content_for_entity("npc_1"), Some("The king is ill"));
    assert!((rumor.truth_value() - 0.8).abs() < EPSILON);

    assert_eq!(
        drain(&mut events),
        vec![RumorEventKind::Created, RumorEventKind::Mutated, RumorEventKind::Spread]
    );
}

#[tokio::test]
async fn test_mutation_falls_back_when_generator_fails() {
    let (service, _events) = service_with(MockGenerator::failing(), ServiceConfig::default());
    let id = king_rumor(&service).await;

    assert!(service
        .spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2").mutate(1.0))
        .await
        .unwrap());

    let rumor = load(&service, id).await;
    assert_eq!(rumor.variants().len(), 2);
    assert_ne!(rumor.variants()[1].content, "The king is ill");
    assert_eq!(
        rumor.variants()[1].mutation_metadata.get("source").map(String::as_str),
        Some("fallback")
    );
}

#[tokio::test]
async fn test_zero_mutation_probability_never_mutates() {
    let generator = MockGenerator::new("The king is dead");
    let (service, _events) = service_with(generator.clone(), ServiceConfig::default());
    let id = king_rumor(&service).await;

    for listener in ["a", "b", "c", "d"] {
        service
            .spread_rumor(SpreadRequest::new(id, "npc_1", listener).mutate(0.0))
            .await
            .unwrap();
    }
    assert_eq!(generator.call_count(), 0);
    assert_eq!(load(&service, id).await.variants().len(), 1);
}

#[tokio::test]
async fn test_default_mutation_probability_applies_unscaled() {
    let generator = MockGenerator::new("The king is dead");
    let config = ServiceConfig {
        default_mutation_probability: 1.0,
        ..ServiceConfig::default()
    };
    let (service, _events) = service_with(generator.clone(), config);
    let id = service
        .create_rumor(CreateRumor::new("npc_1", "The king is ill").severity("critical"))
        .await
        .unwrap();

    // Scaled, a critical rumor would mutate well below every time
    for listener in ["a", "b", "c", "d", "e"] {
        assert!(service
            .spread_rumor(SpreadRequest::new(id, "npc_1", listener).may_mutate())
            .await
            .unwrap());
    }
    assert_eq!(generator.call_count(), 5);
    assert_eq!(load(&service, id).await.variants().len(), 6);
}

#[tokio::test]
async fn test_mutate_rumor() {
    let (service, mut events) = service_with(MockGenerator::new("The king is poisoned"), ServiceConfig::default());
    let id = king_rumor(&service).await;
    let root = load(&service, id).await.variants()[0].id;
    drain(&mut events);

    let variant = service
        .mutate_rumor(id, "npc_5", root, Some(MutationContext::with_distortion(0.8)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.content, "The king is poisoned");
    assert_eq!(variant.parent_variant_id, Some(root));
    assert_eq!(variant.entity_id, "npc_5");

    let rumor = load(&service, id).await;
    assert_eq!(rumor.variant_depth(variant.id), Some(1));
    assert_eq!(drain(&mut events), vec![RumorEventKind::Mutated]);

    assert!(service
        .mutate_rumor(RumorId::new(), "npc_5", root, None)
        .await
        .unwrap()
        .is_none());
    assert!(service
        .mutate_rumor(id, "npc_5", rumormill_domain::VariantId::new(), None)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_mutation_chain_analysis() {
    let config = TransformerConfig {
        mutation_mode: MutationMode::Strategies,
        ..TransformerConfig::default()
    };
    let (dispatcher, _events) = ChannelDispatcher::new();
    let service = RumorService::new(
        SqliteStore::in_memory().unwrap(),
        ContentTransformer::new(MockGenerator::new("The king is surely dead"), config).with_seed(7),
        dispatcher,
        ServiceConfig::default(),
    )
    .unwrap();
    let id = king_rumor(&service).await;
    let root = load(&service, id).await.variants()[0].id;

    let angry = MutationContext {
        traits: vec!["dramatic".to_string()],
        emotional_state: Some("angry".to_string()),
        social_pressure: Some(0.9),
        ..MutationContext::with_distortion(0.8)
    };
    let first = service.mutate_rumor(id, "npc_2", root, Some(angry)).await.unwrap().unwrap();
    let second = service
        .mutate_rumor(id, "npc_3", first.id, Some(MutationContext::with_distortion(0.8)))
        .await
        .unwrap()
        .unwrap();
    let recorded = second.mutation_metadata.get("mutation_types").unwrap();
    assert!(MutationKind::parse(recorded).is_some());

    let report = service.analyze_mutation_chain(id, second.id).await.unwrap().unwrap();
    assert_eq!(report.depth, 2);
    assert_eq!(report.content, "The king is surely dead");
    assert_eq!(report.analysis.total_mutations, 2);
    assert_eq!(report.analysis.mutation_types.values().sum::<usize>(), 2);
    let expected = content_similarity("The king is ill", "The king is surely dead");
    assert!((report.similarity_to_original - expected).abs() < EPSILON);

    let original = service.analyze_mutation_chain(id, root).await.unwrap().unwrap();
    assert_eq!(original.depth, 0);
    assert_eq!(original.analysis.total_mutations, 0);

    assert!(service
        .analyze_mutation_chain(id, rumormill_domain::VariantId::new())
        .await
        .unwrap()
        .is_none());
    assert!(service.analyze_mutation_chain(RumorId::new(), root).await.unwrap().is_none());
}

#[tokio::test]
async fn test_decay_lowers_belief_by_severity() {
    let (service, _events) = service();
    let minor = service
        .create_rumor(CreateRumor::new("npc_1", "The miller cheats").severity("minor"))
        .await
        .unwrap();
    let critical = service
        .create_rumor(CreateRumor::new("npc_1", "The dam will break").severity("critical"))
        .await
        .unwrap();

    let summary = service.decay_all_rumors(10.0).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.decayed, 2);
    assert_eq!(summary.expired, 0);
    assert_eq!(summary.errors, 0);

    let minor_belief = load(&service, minor).await.believability_for_entity("npc_1").unwrap();
    let critical_belief = load(&service, critical).await.believability_for_entity("npc_1").unwrap();
    assert!(minor_belief < critical_belief);
    assert!(critical_belief < 1.0);

    let idle = service.decay_all_rumors(0.0).await.unwrap();
    assert_eq!(idle.processed, 2);
    assert_eq!(idle.decayed, 0);
}

#[tokio::test]
async fn test_decay_expires_and_spread_reactivates() {
    let config = ServiceConfig {
        base_decay: 1.0,
        ..ServiceConfig::default()
    };
    let (service, _events) = service_with(MockGenerator::default(), config);
    let id = service
        .create_rumor(CreateRumor::new("npc_1", "A goat ate the mayor's hat").severity("trivial"))
        .await
        .unwrap();

    let preview = service.preview_decay(9.0).await.unwrap();
    assert_eq!(preview.expired, 1);
    assert_eq!(load(&service, id).await.status, RumorStatus::Active);

    let summary = service.decay_all_rumors(9.0).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.expired, 1);

    let rumor = load(&service, id).await;
    assert_eq!(rumor.status, RumorStatus::Expired);
    assert_eq!(rumor.believability_for_entity("npc_1"), Some(0.0));

    let again = service.decay_all_rumors(9.0).await.unwrap();
    assert_eq!(again.processed, 0);

    let general = service.get_rumor_context(&ContextQuery::general()).await.unwrap();
    assert!(general.is_empty());

    assert!(service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_3")).await.unwrap());
    assert_eq!(load(&service, id).await.status, RumorStatus::Active);
}

#[tokio::test]
async fn test_general_context_orders_by_severity() {
    let (service, _events) = service();
    for (content, severity) in [
        ("The baker's cat is missing", "minor"),
        ("The northern army is marching", "critical"),
        ("The harbour master was bribed", "major"),
    ] {
        service
            .create_rumor(CreateRumor::new("npc_1", content).severity(severity).categories(["military"]))
            .await
            .unwrap();
    }

    let context = service.get_rumor_context(&ContextQuery::general().limit(2)).await.unwrap();
    let contents: Vec<&str> = context.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["The northern army is marching", "The harbour master was bribed"]
    );

    let query = ContextQuery {
        min_severity: Some(RumorSeverity::Critical),
        ..ContextQuery::general()
    };
    assert_eq!(service.get_rumor_context(&query).await.unwrap().len(), 1);

    let query = ContextQuery {
        categories: vec![RumorCategory::Religious],
        ..ContextQuery::general()
    };
    assert!(service.get_rumor_context(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_entity_context_orders_by_belief() {
    let (service, _events) = service();
    let doubted = service
        .create_rumor(CreateRumor::new("npc_1", "The well is cursed").truth_value(0.5))
        .await
        .unwrap();
    let trusted = service
        .create_rumor(CreateRumor::new("npc_1", "The mill burned").truth_value(0.5))
        .await
        .unwrap();
    service
        .spread_rumor(SpreadRequest::new(doubted, "npc_1", "npc_2").modifiers(0.0, -0.1))
        .await
        .unwrap();
    service
        .spread_rumor(SpreadRequest::new(trusted, "npc_1", "npc_2").modifiers(0.25, 0.0))
        .await
        .unwrap();

    let context = service.get_rumor_context(&ContextQuery::for_entity("npc_2")).await.unwrap();
    assert_eq!(context.len(), 2);
    assert_eq!(context[0].rumor_id, trusted);
    assert!((context[0].believability - 0.75).abs() < EPSILON);
    assert!((context[1].believability - 0.4).abs() < EPSILON);
    assert_eq!(context[1].rumor_id, doubted);

    let strict = ContextQuery::for_entity("npc_2").min_believability(0.6);
    assert_eq!(service.get_rumor_context(&strict).await.unwrap().len(), 1);

    let text = service.rumor_context_text(&ContextQuery::for_entity("npc_2")).await.unwrap();
    assert_eq!(
        text,
        "1. npc_2 believes that The mill burned\n2. npc_2 is somewhat skeptical of that The well is cursed"
    );

    assert!(service
        .get_rumor_context(&ContextQuery::for_entity("npc_404"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_find_similar_rumors() {
    let (service, _events) = service();
    let king = king_rumor(&service).await;
    let very = service
        .create_rumor(CreateRumor::new("npc_2", "The king is very ill"))
        .await
        .unwrap();
    service
        .create_rumor(CreateRumor::new("npc_3", "Dragons burned the harbour"))
        .await
        .unwrap();

    let similar = service.find_similar_rumors(king, 0.3).await.unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].rumor_id, very);
    assert!((similar[0].similarity - 0.5).abs() < EPSILON);

    assert_eq!(service.find_similar_rumors(king, 0.0).await.unwrap().len(), 2);
    assert!(service.find_similar_rumors(RumorId::new(), 0.0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_believability() {
    let (service, _events) = service();
    let id = king_rumor(&service).await;

    assert!(service.update_believability(id, "npc_1", -0.3).await.unwrap());
    let belief = load(&service, id).await.believability_for_entity("npc_1").unwrap();
    assert!((belief - 0.7).abs() < EPSILON);

    assert!(!service.update_believability(id, "npc_9", 0.1).await.unwrap());
    assert!(!service.update_believability(RumorId::new(), "npc_1", 0.1).await.unwrap());
    assert!(matches!(
        service.update_believability(id, "npc_1", f64::NAN).await,
        Err(ServiceError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_delete_rumor() {
    let (service, mut events) = service();
    let id = king_rumor(&service).await;
    drain(&mut events);

    assert!(service.delete_rumor(id).await.unwrap());
    assert!(service.get_rumor(id).await.unwrap().is_none());
    assert!(!service.delete_rumor(id).await.unwrap());
    assert_eq!(drain(&mut events), vec![RumorEventKind::Deleted]);
}

#[tokio::test]
async fn test_queries_and_statistics() {
    let (service, _events) = service();
    let king = king_rumor(&service).await;
    service
        .create_rumor(CreateRumor::new("npc_3", "The harvest failed").categories(["economic"]))
        .await
        .unwrap();
    service.spread_rumor(SpreadRequest::new(king, "npc_1", "npc_2")).await.unwrap();

    let known = service.rumors_for_entity("npc_2", &[], None, None).await.unwrap();
    assert_eq!(known.len(), 1);
    assert_eq!(known[0].id(), king);

    let text = RumorQuery {
        text: Some("HARVEST".to_string()),
        ..RumorQuery::default()
    };
    assert_eq!(service.query_rumors(&text).await.unwrap().len(), 1);

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.total_rumors, 2);
    assert_eq!(stats.active_rumors, 2);
    assert_eq!(stats.expired_rumors, 0);
    assert_eq!(stats.total_variants, 2);
    assert_eq!(stats.total_spread_records, 3);
    assert_eq!(stats.category_distribution.get("political"), Some(&1));
    assert_eq!(stats.category_distribution.get("economic"), Some(&1));
    assert_eq!(stats.severity_distribution.get("major"), Some(&1));
    assert_eq!(stats.severity_distribution.get("minor"), Some(&1));
    assert!((stats.average_spread - 1.5).abs() < EPSILON);
    assert!((stats.average_truth_value - 0.65).abs() < EPSILON);
}

#[tokio::test]
async fn test_will_pass_on_and_reach() {
    let (service, _events) = service();
    let id = service
        .create_rumor(CreateRumor::new("npc_1", "The bridge is out").truth_value(0.5))
        .await
        .unwrap();
    service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap();

    // Minor: threshold 0.5 * 0.9 = 0.45; npc_2 believes at 0.5
    assert_eq!(service.will_pass_on(id, "npc_2", 0.0, 0.5).await.unwrap(), Some(true));
    // A hostile listener raises the bar to 0.65
    assert_eq!(service.will_pass_on(id, "npc_2", -1.0, 0.5).await.unwrap(), Some(false));
    assert_eq!(service.will_pass_on(id, "npc_9", 0.0, 0.5).await.unwrap(), None);
    assert_eq!(service.will_pass_on(RumorId::new(), "npc_1", 0.0, 0.5).await.unwrap(), None);

    let reach = service.estimated_reach(id, 10.0).await.unwrap().unwrap();
    assert!(reach >= 8);
    assert_eq!(service.estimated_reach(RumorId::new(), 10.0).await.unwrap(), None);
}

#[tokio::test]
async fn test_bulk_operations_skip_undecodable_rumor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rumors.db");
    let service = RumorService::new(
        SqliteStore::new(&path).unwrap(),
        transformer(MockGenerator::default()),
        NoopDispatcher,
        ServiceConfig::default(),
    )
    .unwrap();

    let healthy = service
        .create_rumor(CreateRumor::new("npc_1", "The mill burned"))
        .await
        .unwrap();
    let broken = service
        .create_rumor(CreateRumor::new("npc_1", "The mill is haunted"))
        .await
        .unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE variants SET mutation_metadata = 'not json' WHERE rumor_id = ?1",
        rusqlite::params![&broken.to_bytes()[..]],
    )
    .unwrap();
    drop(conn);

    let summary = service.decay_all_rumors(9.0).await.unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.decayed, 1);
    let belief = service
        .get_rumor(healthy)
        .await
        .unwrap()
        .unwrap()
        .believability_for_entity("npc_1")
        .unwrap();
    assert!(belief < 1.0);

    let general = service.get_rumor_context(&ContextQuery::general()).await.unwrap();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].rumor_id, healthy);

    let entity = service
        .get_rumor_context(&ContextQuery::for_entity("npc_1").min_believability(0.0))
        .await
        .unwrap();
    assert_eq!(entity.len(), 1);
    assert_eq!(entity[0].rumor_id, healthy);

    assert_eq!(service.statistics().await.unwrap().total_rumors, 1);
    assert!(matches!(service.get_rumor(broken).await, Err(ServiceError::Store(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_spreads_keep_every_listener() {
    let (service, _events) = service();
    let id = king_rumor(&service).await;
    let service = Arc::new(service);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .spread_rumor(SpreadRequest::new(id, "npc_1", format!("listener_{}", i)))
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let rumor = service.get_rumor(id).await.unwrap().unwrap();
    assert_eq!(rumor.spread_count(), 11);
    assert_eq!(rumor.version, 11);
}

/// Store that reports a version conflict on the next `conflicts` updates
struct ContendedStore {
    inner: SqliteStore,
    conflicts: usize,
}

impl RumorStore for ContendedStore {
    type Error = StoreError;

    fn save_rumor(&mut self, rumor: &mut Rumor) -> Result<(), Self::Error> {
        if rumor.version > 0 && self.conflicts > 0 {
            self.conflicts -= 1;
            return Err(StoreError::VersionConflict {
                id: rumor.id(),
                expected: rumor.version,
                found: rumor.version + 1,
            });
        }
        self.inner.save_rumor(rumor)
    }

    fn get_rumor(&self, id: RumorId) -> Result<Option<Rumor>, Self::Error> {
        self.inner.get_rumor(id)
    }

    fn get_all_rumors(&self) -> Result<Vec<Rumor>, Self::Error> {
        self.inner.get_all_rumors()
    }

    fn get_rumor_ids(&self) -> Result<Vec<RumorId>, Self::Error> {
        self.inner.get_rumor_ids()
    }

    fn get_rumors_by_entity(&self, entity_id: &str) -> Result<Vec<Rumor>, Self::Error> {
        self.inner.get_rumors_by_entity(entity_id)
    }

    fn get_rumors_by_filters(&self, query: &RumorQuery) -> Result<Vec<Rumor>, Self::Error> {
        self.inner.get_rumors_by_filters(query)
    }

    fn delete_rumor(&mut self, id: RumorId) -> Result<bool, Self::Error> {
        self.inner.delete_rumor(id)
    }

    fn is_conflict(error: &Self::Error) -> bool {
        error.is_conflict()
    }
}

fn contended_service() -> RumorService<ContendedStore, MockGenerator, NoopDispatcher> {
    let store = ContendedStore {
        inner: SqliteStore::in_memory().unwrap(),
        conflicts: 0,
    };
    RumorService::new(store, transformer(MockGenerator::default()), NoopDispatcher, ServiceConfig::default())
        .unwrap()
}

#[tokio::test]
async fn test_conflicts_are_retried() {
    let service = contended_service();
    let id = service.create_rumor(CreateRumor::new("npc_1", "The bridge is out")).await.unwrap();

    service.store().lock().unwrap().conflicts = 2;
    assert!(service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap());

    let rumor = service.get_rumor(id).await.unwrap().unwrap();
    assert_eq!(rumor.spread_count(), 2);
    assert_eq!(rumor.version, 2);
}

#[tokio::test]
async fn test_persistent_conflict_is_reported() {
    let service = contended_service();
    let id = service.create_rumor(CreateRumor::new("npc_1", "The bridge is out")).await.unwrap();

    service.store().lock().unwrap().conflicts = 10;
    let err = service
        .spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { rumor_id, attempts: 3 } if rumor_id == id));

    // Decay isolates the failure and keeps counting
    service.store().lock().unwrap().conflicts = 10;
    let summary = service.decay_all_rumors(5.0).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 1);
}

/// Dispatcher whose every publish fails
struct BrokenDispatcher;

impl EventDispatcher for BrokenDispatcher {
    type Error = String;

    fn publish(&self, _event: &RumorEvent) -> Result<(), Self::Error> {
        Err("event bus offline".to_string())
    }
}

#[tokio::test]
async fn test_dispatch_failure_does_not_roll_back() {
    let service = RumorService::new(
        SqliteStore::in_memory().unwrap(),
        transformer(MockGenerator::default()),
        BrokenDispatcher,
        ServiceConfig::default(),
    )
    .unwrap();

    let id = service.create_rumor(CreateRumor::new("npc_1", "The bridge is out")).await.unwrap();
    assert!(service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await.unwrap());
    let rumor = service.get_rumor(id).await.unwrap().unwrap();
    assert!(rumor.entity_knows_rumor("npc_2"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ServiceConfig {
        max_save_retries: 0,
        ..ServiceConfig::default()
    };
    let result = RumorService::new(
        SqliteStore::in_memory().unwrap(),
        transformer(MockGenerator::default()),
        NoopDispatcher,
        config,
    );
    assert!(matches!(result, Err(ServiceError::Config(_))));
}
