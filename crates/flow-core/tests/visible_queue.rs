
use std::collections::BTreeSet;

use flow_core::{Actor, BaseTask, InMemoryEntityStore, TaskKind, TaskQuery};
use test_support::*;

const U: i64 = 42;

/// T1 exige "approve", T2 y T3 exigen "reject" (T3 ya es de U), T4 no exige nada.
fn queue_store() -> InMemoryEntityStore {
    let mut store = scenario_store();
    store.insert_task(requiring(human_task(1, 1, FLOW_A, 10), "approve"));
    store.insert_task(requiring(human_task(2, 1, FLOW_A, 11), "reject"));
    store.insert_task(owned_by(requiring(human_task(3, 2, FLOW_B, 12), "reject"), U));
    store.insert_task(human_task(4, 3, FLOW_B, 13));
    store
}

fn ids<I: Iterator<Item = flow_core::Resolved<BaseTask>>>(rows: I) -> BTreeSet<i64> {
    rows.map(|r| r.id()).collect()
}

#[test]
fn actor_sees_permitted_owned_and_open_tasks() {
    let fx = two_flows();
    let store = queue_store();
    let actor = Actor::new(U).with_permissions(["approve"]);

    let visible = ids(TaskQuery::queue_for(&fx.registry, &actor, None).fetch(&store).unwrap());
    assert_eq!(visible, BTreeSet::from([1, 3, 4]));
}

#[test]
fn predicate_is_a_union_not_a_chain() {
    let fx = two_flows();
    let store = queue_store();
    // Sin permisos: sólo lo abierto y lo propio.
    let actor = Actor::new(U);
    let visible = ids(TaskQuery::queue_for(&fx.registry, &actor, None).fetch(&store).unwrap());
    assert_eq!(visible, BTreeSet::from([3, 4]));

    // Otro actor sin permisos: sólo lo abierto.
    let stranger = Actor::new(7);
    let visible = ids(TaskQuery::queue_for(&fx.registry, &stranger, None).fetch(&store).unwrap());
    assert_eq!(visible, BTreeSet::from([4]));
}

#[test]
fn superuser_sees_every_human_task() {
    let fx = two_flows();
    let mut store = queue_store();
    let mut job = human_task(5, 1, FLOW_A, 14);
    job.flow_task_type = TaskKind::Job;
    store.insert_task(job);

    let admin = Actor::superuser(1);
    let visible = ids(TaskQuery::queue_for(&fx.registry, &admin, None).fetch(&store).unwrap());
    let human = ids(TaskQuery::new(&fx.registry).human_actionable().fetch(&store).unwrap());
    assert_eq!(visible, human);
    assert_eq!(visible, BTreeSet::from([1, 2, 3, 4]));
}

#[test]
fn automated_tasks_never_enter_the_queue() {
    let fx = two_flows();
    let mut store = InMemoryEntityStore::new();
    let mut gate = human_task(8, 1, FLOW_A, 0);
    gate.flow_task_type = TaskKind::Gate;
    store.insert_task(gate);
    let visible = TaskQuery::queue_for(&fx.registry, &Actor::new(U), None).fetch(&store)
                                                                            .unwrap()
                                                                            .count();
    assert_eq!(visible, 0);
}

#[test]
fn queue_can_be_narrowed_to_one_flow() {
    let fx = two_flows();
    let store = queue_store();
    let actor = Actor::new(U).with_permissions(["approve"]);
    let visible = ids(TaskQuery::queue_for(&fx.registry, &actor, Some(fx.b)).fetch(&store).unwrap());
    assert_eq!(visible, BTreeSet::from([3, 4]));
}

#[test]
fn status_and_owner_narrowings_layer_on_top() {
    let fx = two_flows();
    let mut store = queue_store();
    store.tasks[2].status = "ASSIGNED".into();
    let actor = Actor::new(U).with_permissions(["approve"]);

    let open = ids(TaskQuery::new(&fx.registry).for_flow_classes(fx.registry.ids())
                                              .unwrap()
                                              .visible_queue(&actor, None)
                                              .unclaimed()
                                              .fetch(&store)
                                              .unwrap());
    assert_eq!(open, BTreeSet::from([1, 4]));

    let mine = ids(TaskQuery::new(&fx.registry).for_flow_classes(fx.registry.ids())
                                              .unwrap()
                                              .assigned_to(&actor)
                                              .fetch(&store)
                                              .unwrap());
    assert_eq!(mine, BTreeSet::from([3]));
}

#[test]
fn application_side_rule_agrees_with_storage_predicate() {
    let fx = two_flows();
    let store = queue_store();
    for actor in [Actor::new(U), Actor::new(U).with_permissions(["approve"]), Actor::new(7).with_permissions(["reject"])] {
        let by_query = ids(TaskQuery::queue_for(&fx.registry, &actor, None).fetch(&store).unwrap());
        let by_rule: BTreeSet<i64> = store.tasks.iter().filter(|t| actor.may_see(t)).map(|t| t.id).collect();
        assert_eq!(by_query, by_rule, "actor {:?}", actor.id);
    }
}
