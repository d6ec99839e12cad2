pub mod dashboards;
pub mod nodes;
