//! flow-cli: imprime las vistas de un sitio leyendo de Postgres.
//!
//! `flow-cli --registry flows.json --actor 7 --perm app.can_approve queue`
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use flow_core::{Actor, BaseRecord, FlowClassId, FlowRegistry, Page, RegistryManifest, Resolved};
use flow_persistence::{build_dev_pool_from_env, PgEntityStore, PoolProvider};
use flowqueue_rust::{FlowSite, DEFAULT_ORPHANS, DEFAULT_PER_PAGE};

#[derive(Parser)]
#[command(name = "flow-cli")]
#[command(about = "Listados de procesos, tareas y cola de un sitio de flows")]
#[command(version)]
struct Cli {
    /// Manifiesto JSON con tipos y flows
    #[arg(long)]
    registry: PathBuf,

    /// Id del actor que consulta
    #[arg(long, default_value = "0")]
    actor: i64,

    /// Permiso del actor (repetible)
    #[arg(long = "perm")]
    permissions: Vec<String>,

    #[arg(long)]
    superuser: bool,

    /// Página (base 1)
    #[arg(long, default_value = "1")]
    page: u64,

    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u64,

    /// Filas sueltas que se unen a la página anterior
    #[arg(long, default_value_t = DEFAULT_ORPHANS)]
    orphans: u64,

    /// Salida JSON en lugar de tabla
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Procesos del sitio o de un flow
    Processes {
        #[arg(long)]
        flow: Option<String>,
    },
    /// Tareas asignadas al actor
    Tasks {
        #[arg(long)]
        flow: Option<String>,
    },
    /// Tareas sin reclamar visibles para el actor
    Queue {
        #[arg(long)]
        flow: Option<String>,
    },
    /// Detalle de un proceso y sus tareas
    Process {
        #[arg(long)]
        flow: String,
        #[arg(long)]
        id: i64,
    },
}

fn flow_id(registry: &FlowRegistry, name: &str) -> Result<FlowClassId> {
    registry.lookup(name)
            .map(|f| f.id)
            .ok_or_else(|| anyhow!("flow no registrado: {name}"))
}

fn shape<R: BaseRecord>(row: &Resolved<R>) -> &'static str {
    match row {
        Resolved::Base { .. } => "base",
        Resolved::Alias { .. } => "alias",
        Resolved::Specialized(_) => "specialized",
    }
}

fn print_page<R: BaseRecord + Serialize>(page: &Page<Resolved<R>>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }
    for row in &page.items {
        let record = row.record();
        println!("#{:<8} {:<40} {:<10} {} {}",
                 record.id(),
                 record.flow_class(),
                 record.status(),
                 record.created().format("%Y-%m-%d %H:%M"),
                 shape(row));
    }
    println!("-- página {}/{} ({} filas)", page.number, page.num_pages(), page.total);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let registry = RegistryManifest::from_path(&cli.registry).and_then(RegistryManifest::into_registry)
                                                             .with_context(|| {
                                                                 format!("cargando {}", cli.registry.display())
                                                             })?;
    info!("registro cargado: {} flows", registry.len());

    let mut actor = Actor::new(cli.actor).with_permissions(cli.permissions.iter().cloned());
    actor.is_superuser = cli.superuser;

    let pool = build_dev_pool_from_env().context("conectando a Postgres")?;
    let store = PgEntityStore::new(PoolProvider { pool });
    let site = FlowSite::new(&registry).per_page(cli.per_page)
                                         .orphans(cli.orphans);

    match &cli.command {
        Command::Processes { flow: None } => print_page(&site.all_processes(&store, cli.page)?, cli.json)?,
        Command::Processes { flow: Some(name) } => {
            let flow = flow_id(&registry, name)?;
            print_page(&site.flow_processes(&store, flow, cli.page)?, cli.json)?
        }
        Command::Tasks { flow: None } => print_page(&site.all_tasks(&store, &actor, cli.page)?, cli.json)?,
        Command::Tasks { flow: Some(name) } => {
            let flow = flow_id(&registry, name)?;
            print_page(&site.flow_tasks(&store, flow, &actor, cli.page)?, cli.json)?
        }
        Command::Queue { flow: None } => print_page(&site.all_queue(&store, &actor, cli.page)?, cli.json)?,
        Command::Queue { flow: Some(name) } => {
            let flow = flow_id(&registry, name)?;
            print_page(&site.flow_queue(&store, flow, &actor, cli.page)?, cli.json)?
        }
        Command::Process { flow, id } => {
            let flow = flow_id(&registry, flow)?;
            let detail = site.process_detail(&store, flow, *id)?
                             .ok_or_else(|| anyhow!("proceso #{id} no encontrado"))?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}
