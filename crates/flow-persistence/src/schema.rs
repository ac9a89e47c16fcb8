//! Esquema Diesel de las tablas base. Reemplazable con `diesel print-schema`.

diesel::table! {
    flow_process (id) {
        id -> BigInt,
        flow_class -> Text,
        status -> Text,
        created -> Timestamptz,
        finished -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    flow_task (id) {
        id -> BigInt,
        flow_class -> Text,
        process_id -> BigInt,
        #[sql_name = "flow_task"]
        flow_task_name -> Text,
        flow_task_type -> Text,
        status -> Text,
        created -> Timestamptz,
        started -> Nullable<Timestamptz>,
        finished -> Nullable<Timestamptz>,
        owner_id -> Nullable<BigInt>,
        owner_permission -> Nullable<Text>,
    }
}

diesel::joinable!(flow_task -> flow_process (process_id));

diesel::allow_tables_to_appear_in_same_query!(
    flow_process,
    flow_task,
);
