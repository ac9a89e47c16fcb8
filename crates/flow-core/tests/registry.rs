
use flow_core::{EntityKind, Fetched, FlowClassDef, FlowRegistry, Links, RegistryError, Resolved, TypeSchema};
use test_support::*;

#[test]
fn duplicate_flow_is_rejected_and_registry_unchanged() {
    let schema = TypeSchema::new();
    let process = schema.base(EntityKind::Process);
    let task = schema.base(EntityKind::Task);
    let mut builder = FlowRegistry::builder(schema);
    builder.register(FlowClassDef::new(FLOW_A, process, task)).unwrap();
    let err = builder.register(FlowClassDef::new(FLOW_A, process, task)).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateFlowClass(FLOW_A.into()));
    assert_eq!(builder.build().len(), 1);
}

#[test]
fn swapped_process_and_task_types_are_a_schema_mismatch() {
    let schema = TypeSchema::new();
    let process = schema.base(EntityKind::Process);
    let task = schema.base(EntityKind::Task);
    let mut builder = FlowRegistry::builder(schema);
    let err = builder.register(FlowClassDef::new(FLOW_A, task, process)).unwrap_err();
    assert!(matches!(err, RegistryError::SchemaMismatch { .. }));
    assert!(builder.build().is_empty());
}

#[test]
fn nested_paths_are_computed_at_registration() {
    let mut schema = TypeSchema::new();
    let process = schema.base(EntityKind::Process);
    let task = schema.base(EntityKind::Task);
    let b = schema.extend("BProcess", "b_process", process, "bprocess", "process_ptr_id")
                  .unwrap();
    let c = schema.extend("CProcess", "c_process", b, "cprocess", "bprocess_ptr_id")
                  .unwrap();
    let view = schema.alias("CView", c).unwrap();
    let mut builder = FlowRegistry::builder(schema);
    let id = builder.register(FlowClassDef::new("x.CFlow", view, task)).unwrap();
    let registry = builder.build();

    let path = registry.path(id, EntityKind::Process).unwrap();
    assert_eq!(path.to_string(), "bprocess.cprocess");
    assert_eq!(path.concrete_type(), Some(c));
    assert!(registry.path(id, EntityKind::Task).unwrap().is_empty());
}

#[test]
fn alias_of_specialized_type_keeps_declared_type() {
    let mut schema = TypeSchema::new();
    let process = schema.base(EntityKind::Process);
    let task = schema.base(EntityKind::Task);
    let b = schema.extend("BProcess", "b_process", process, "bprocess", "process_ptr_id")
                  .unwrap();
    let view = schema.alias("BView", b).unwrap();
    let base_view = schema.alias("PlainView", process).unwrap();
    let mut builder = FlowRegistry::builder(schema);
    builder.register(FlowClassDef::new(FLOW_B, view, task)).unwrap();
    builder.register(FlowClassDef::new(FLOW_A, base_view, task)).unwrap();
    let registry = builder.build();

    let mut links = Links::new();
    links.attach(&["bprocess"], obj(serde_json::json!({"x": 1})));
    let row = registry.materialize(Fetched { record: process_row(2, FLOW_B), links })
                      .unwrap();
    let Resolved::Specialized(s) = &row else {
        panic!("expected specialized row, got {row:?}");
    };
    assert_eq!(s.entity_type, view);
    assert_eq!(s.storage_type, b);
    assert!(row.is_instance_of(registry.schema(), b));

    let plain = registry.materialize(Fetched::bare(process_row(1, FLOW_A))).unwrap();
    assert_eq!(plain, Resolved::Alias { entity_type: base_view,
                                        record: process_row(1, FLOW_A) });
}

#[test]
fn materialize_skips_unknown_flows() {
    let fx = two_flows();
    assert!(fx.registry.materialize(Fetched::bare(process_row(1, "nope.Flow"))).is_none());
}

fn process_row(id: i64, flow: &str) -> flow_core::BaseProcess {
    process(id, flow, 0)
}
