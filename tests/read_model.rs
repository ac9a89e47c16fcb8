use std::cell::RefCell;
use std::convert::Infallible;

use chrono::{DateTime, TimeZone, Utc};
use flow_core::{Actor, ActorId, BaseProcess, BaseTask, EntityStore, Fetched, InMemoryEntityStore, QuerySpec, QueryError,
                RegistryManifest, Resolved, TaskKind};
use flowqueue_rust::{FlowSite, ReadModelError};

const MANIFEST: &str = r#"{
    "types": [
        {"name": "ShipmentProcess", "extends": "Process", "table": "shipment_process",
         "accessor": "shipmentprocess", "column": "process_ptr_id"}
    ],
    "flows": [
        {"name": "demo.flows.HelloFlow", "process": "Process", "task": "Task"},
        {"name": "demo.flows.ShipmentFlow", "process": "ShipmentProcess", "task": "Task"}
    ]
}"#;

const HELLO: &str = "demo.flows.HelloFlow";
const SHIPMENT: &str = "demo.flows.ShipmentFlow";

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 9, minute, 0).unwrap()
}

fn process(id: i64, flow: &str, minute: u32) -> BaseProcess {
    BaseProcess { id,
                  flow_class: flow.into(),
                  status: "STARTED".into(),
                  created: at(minute),
                  finished: None }
}

fn task(id: i64, process_id: i64, flow: &str, minute: u32, status: &str) -> BaseTask {
    BaseTask { id,
               flow_class: flow.into(),
               process_id,
               flow_task: "approve".into(),
               flow_task_type: TaskKind::Human,
               status: status.into(),
               created: at(minute),
               started: None,
               finished: None,
               owner: None,
               owner_permission: None,
               process: None }
}

fn store() -> InMemoryEntityStore {
    let mut store = InMemoryEntityStore::new();
    store.insert_process(process(1, HELLO, 0));
    store.insert_process(process(2, SHIPMENT, 1));
    store.insert_process(process(3, SHIPMENT, 2));
    let fields = serde_json::json!({"carrier": "DHL"});
    if let serde_json::Value::Object(m) = fields {
        store.insert_specialization("shipment_process", 2, m);
    }

    let mut mine = task(10, 2, SHIPMENT, 3, "ASSIGNED");
    mine.owner = Some(ActorId(5));
    store.insert_task(mine);
    let mut gated = task(11, 2, SHIPMENT, 4, "NEW");
    gated.owner_permission = Some("shipment.can_pack".into());
    store.insert_task(gated);
    store.insert_task(task(12, 1, HELLO, 5, "NEW"));
    let mut job = task(13, 1, HELLO, 6, "NEW");
    job.flow_task_type = TaskKind::Job;
    store.insert_task(job);
    store.insert_task(task(14, 2, SHIPMENT, 7, "DONE"));
    store
}

fn ids<R: flow_core::BaseRecord>(rows: &[Resolved<R>]) -> Vec<i64> {
    rows.iter().map(|r| r.id()).collect()
}

#[test]
fn all_processes_are_newest_first_and_specialized() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry);
    let page = site.all_processes(&store(), 1).unwrap();
    assert_eq!(ids(&page.items), vec![3, 2, 1]);
    assert_eq!(page.per_page, 15);
    assert_eq!(page.items[1].field("carrier"), Some(&serde_json::json!("DHL")));
    assert!(!page.items[0].is_specialized());
}

#[test]
fn all_tasks_lists_only_assigned_to_actor() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry);
    let page = site.all_tasks(&store(), &Actor::new(5), 1).unwrap();
    assert_eq!(ids(&page.items), vec![10]);
    assert_eq!(page.items[0].record().process.as_ref().map(|p| p.id), Some(2));
    assert_eq!(site.all_tasks(&store(), &Actor::new(6), 1).unwrap().total, 0);
}

#[test]
fn all_queue_respects_permissions() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry);
    let store = store();

    let plain = site.all_queue(&store, &Actor::new(5), 1).unwrap();
    assert_eq!(ids(&plain.items), vec![12]);

    let packer = Actor::new(5).with_permissions(["shipment.can_pack"]);
    let queue = site.all_queue(&store, &packer, 1).unwrap();
    assert_eq!(ids(&queue.items), vec![12, 11]);
}

#[test]
fn per_flow_views_narrow_to_one_flow() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry).per_page(1).orphans(0);
    let shipment = registry.lookup(SHIPMENT).unwrap().id;
    let store = store();

    let first = site.flow_processes(&store, shipment, 1).unwrap();
    assert_eq!(ids(&first.items), vec![3]);
    assert_eq!(first.num_pages(), 2);
    assert!(first.has_next());

    let admin = Actor::superuser(1);
    assert_eq!(ids(&site.flow_queue(&store, shipment, &admin, 1).unwrap().items), vec![11]);
    assert_eq!(site.flow_tasks(&store, shipment, &Actor::new(5), 1).unwrap().total, 1);
}

#[test]
fn short_last_page_joins_the_previous_one() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let store = store();

    let merged = FlowSite::new(&registry).per_page(2)
                                         .all_processes(&store, 1)
                                         .unwrap();
    assert_eq!(ids(&merged.items), vec![3, 2, 1]);
    assert_eq!(merged.orphans, 5);
    assert_eq!(merged.num_pages(), 1);
    assert!(!merged.has_next());

    let split = FlowSite::new(&registry).per_page(2).orphans(0);
    assert_eq!(ids(&split.all_processes(&store, 1).unwrap().items), vec![3, 2]);
    assert_eq!(ids(&split.all_processes(&store, 2).unwrap().items), vec![1]);
}

#[test]
fn page_past_the_end_is_empty() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let page = FlowSite::new(&registry).all_processes(&store(), u64::MAX).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.number, u64::MAX);
    assert!(!page.has_next());
}

#[test]
fn process_detail_lists_tasks_oldest_first() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry);
    let shipment = registry.lookup(SHIPMENT).unwrap().id;
    let hello = registry.lookup(HELLO).unwrap().id;
    let store = store();

    let detail = site.process_detail(&store, shipment, 2).unwrap().expect("detail");
    assert!(detail.process.is_specialized());
    assert_eq!(ids(&detail.tasks), vec![10, 11, 14]);

    // El proceso existe pero pertenece a otro flow.
    assert!(site.process_detail(&store, hello, 2).unwrap().is_none());
}

#[test]
fn site_without_flows_is_a_query_error() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::with_flows(&registry, Vec::new());
    let err = site.all_processes(&InMemoryEntityStore::new(), 1).unwrap_err();
    assert!(matches!(err, ReadModelError::Query(QueryError::EmptyFlowClasses)));
}

/// Anota el `limit` de cada lectura de procesos.
struct LimitLog {
    inner: InMemoryEntityStore,
    limits: RefCell<Vec<Option<u64>>>,
}

impl EntityStore for LimitLog {
    type Error = Infallible;

    fn fetch_processes(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseProcess>>, Self::Error> {
        self.limits.borrow_mut().push(spec.limit);
        self.inner.fetch_processes(spec)
    }
    fn fetch_tasks(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseTask>>, Self::Error> {
        self.inner.fetch_tasks(spec)
    }
    fn count_processes(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        self.inner.count_processes(spec)
    }
    fn count_tasks(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        self.inner.count_tasks(spec)
    }
}

#[test]
fn process_reads_are_always_bounded() {
    let registry = RegistryManifest::from_json_str(MANIFEST).unwrap().into_registry().unwrap();
    let site = FlowSite::new(&registry);
    let shipment = registry.lookup(SHIPMENT).unwrap().id;
    let store = LimitLog { inner: store(),
                           limits: RefCell::new(Vec::new()) };

    site.all_processes(&store, 1).unwrap();
    site.flow_processes(&store, shipment, 1).unwrap();
    site.process_detail(&store, shipment, 2).unwrap().expect("detail");
    assert_eq!(*store.limits.borrow(), vec![Some(20), Some(20), Some(1)]);
}
