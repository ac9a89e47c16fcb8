mod site;

pub use site::{FlowSite, ProcessDetail, DEFAULT_ORPHANS, DEFAULT_PER_PAGE};
