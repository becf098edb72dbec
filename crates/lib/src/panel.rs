//! Renderable views of a reconciliation.
//!
//! A panel turns the latest [`Reconciliation`] (and service status) into a
//! flat list of [`PanelItem`] rows. Entities that are absent from the
//! manifest are not shown.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::reconcile::{Entity, LifecycleState, Reconciliation};
use crate::services::ServiceStatusMap;

/// Everything a panel may read during one refresh.
#[derive(Debug, Clone)]
pub struct PanelContext {
  pub reconciliation: Arc<Reconciliation>,
  pub services: Arc<ServiceStatusMap>,
}

impl PanelContext {
  pub fn new(reconciliation: Arc<Reconciliation>, services: Arc<ServiceStatusMap>) -> Self {
    Self {
      reconciliation,
      services,
    }
  }
}

/// One row of a panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelItem {
  pub label: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  pub state: LifecycleState,
  /// Whether the item is currently running, for items that can run.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub running: Option<bool>,
}

/// A rendering collaborator that receives plain data.
pub trait Panel {
  fn title(&self) -> &str;

  fn items(&self) -> &[PanelItem];

  /// Rebuild the rows from `ctx`.
  fn refresh(&mut self, ctx: &PanelContext);
}

fn visible<T: Serialize>(entities: &[Entity<T>]) -> impl Iterator<Item = (&Entity<T>, LifecycleState)> {
  entities
    .iter()
    .map(|entity| (entity, entity.state()))
    .filter(|(_, state)| *state != LifecycleState::Absent)
}

#[derive(Debug, Default)]
pub struct PackagesPanel {
  items: Vec<PanelItem>,
}

impl Panel for PackagesPanel {
  fn title(&self) -> &str {
    "Packages"
  }

  fn items(&self) -> &[PanelItem] {
    &self.items
  }

  fn refresh(&mut self, ctx: &PanelContext) {
    let reconciliation = &ctx.reconciliation;
    self.items = visible(&reconciliation.packages)
      .map(|(entity, state)| {
        let locked = reconciliation.locked_package(&entity.name);
        let version = locked
          .and_then(|p| p.version.clone())
          .or_else(|| entity.declared.as_ref().and_then(|d| d.version.clone()));
        let license = locked.and_then(|p| p.license.clone());

        let detail = match (version, license) {
          (Some(v), Some(l)) => Some(format!("{} ({})", v, l)),
          (Some(v), None) => Some(v),
          (None, l) => l,
        };

        PanelItem {
          label: entity.name.clone(),
          detail,
          state,
          running: None,
        }
      })
      .collect();
  }
}

#[derive(Debug, Default)]
pub struct VariablesPanel {
  items: Vec<PanelItem>,
}

impl Panel for VariablesPanel {
  fn title(&self) -> &str {
    "Variables"
  }

  fn items(&self) -> &[PanelItem] {
    &self.items
  }

  fn refresh(&mut self, ctx: &PanelContext) {
    self.items = visible(&ctx.reconciliation.variables)
      .map(|(entity, state)| PanelItem {
        label: entity.name.clone(),
        detail: entity.declared.clone(),
        state,
        running: None,
      })
      .collect();
  }
}

#[derive(Debug, Default)]
pub struct ServicesPanel {
  items: Vec<PanelItem>,
}

impl Panel for ServicesPanel {
  fn title(&self) -> &str {
    "Services"
  }

  fn items(&self) -> &[PanelItem] {
    &self.items
  }

  fn refresh(&mut self, ctx: &PanelContext) {
    self.items = visible(&ctx.reconciliation.services)
      .map(|(entity, state)| {
        let record = ctx.services.get(&entity.name);
        let detail = record.map(|r| match r.pid {
          Some(pid) => format!("{} (pid {})", r.status, pid),
          None => r.status.clone(),
        });

        PanelItem {
          label: entity.name.clone(),
          detail,
          state,
          running: Some(record.is_some_and(|r| r.is_running())),
        }
      })
      .collect();
  }
}

/// Panels refreshed together, in registration order.
#[derive(Default)]
pub struct PanelSet {
  panels: Vec<Box<dyn Panel>>,
}

impl PanelSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Packages, variables, and services, in that order.
  pub fn standard() -> Self {
    let mut set = Self::new();
    set.register(Box::new(PackagesPanel::default()));
    set.register(Box::new(VariablesPanel::default()));
    set.register(Box::new(ServicesPanel::default()));
    set
  }

  pub fn register(&mut self, panel: Box<dyn Panel>) {
    self.panels.push(panel);
  }

  pub fn refresh(&mut self, ctx: &PanelContext) {
    for panel in &mut self.panels {
      panel.refresh(ctx);
      trace!(panel = panel.title(), items = panel.items().len(), "refreshed panel");
    }
  }

  pub fn panels(&self) -> impl Iterator<Item = &dyn Panel> {
    self.panels.iter().map(|p| p.as_ref())
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;
  use crate::loader::LoadedEnvironment;
  use crate::lock::LockFile;
  use crate::manifest::Manifest;
  use crate::platform::Platform;
  use crate::reconcile::reconcile;
  use crate::services::parse_status_output;

  fn context(manifest: &str, lock: Option<&str>, status: &str) -> PanelContext {
    let manifest = Manifest::from_toml_str(manifest).unwrap();
    let lock = lock.map(|l| LockFile::from_json_str(l).unwrap());
    let env = LoadedEnvironment::new("/env".into(), Some(manifest), lock);
    let platform = Platform::detect("x86_64", "linux").unwrap();
    PanelContext::new(
      Arc::new(reconcile(&env, Some(platform))),
      Arc::new(parse_status_output(status)),
    )
  }

  #[test]
  fn panels_show_declared_entities_only() {
    let lock = r#"{
      "lockfile-version": 1,
      "manifest": {"vars": {"A": "1", "STALE": "x"}},
      "packages": []
    }"#;
    let ctx = context("[vars]\nA = \"1\"\nB = \"2\"\n", Some(lock), "");
    let mut panel = VariablesPanel::default();

    panel.refresh(&ctx);

    let labels: Vec<_> = panel.items().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B"]);
    assert_eq!(panel.items()[0].state, LifecycleState::Active);
    assert_eq!(panel.items()[1].state, LifecycleState::Pending);
    assert_eq!(panel.items()[1].detail.as_deref(), Some("2"));
  }

  #[test]
  fn packages_show_locked_version_and_license() {
    let manifest = "[install]\njq.pkg-path = \"jq\"\n";
    let lock = r#"{
      "lockfile-version": 1,
      "manifest": {"install": {"jq": {"pkg-path": "jq"}}},
      "packages": [
        {"install_id": "jq", "system": "x86_64-linux", "version": "1.7.1", "license": "MIT"}
      ]
    }"#;
    let ctx = context(manifest, Some(lock), "");
    let mut panel = PackagesPanel::default();

    panel.refresh(&ctx);

    assert_eq!(panel.items().len(), 1);
    assert_eq!(panel.items()[0].state, LifecycleState::Active);
    assert_eq!(panel.items()[0].detail.as_deref(), Some("1.7.1 (MIT)"));
  }

  #[test]
  fn services_merge_runtime_status() {
    let manifest = "[services.web]\ncommand = \"serve\"\n[services.db]\ncommand = \"pg\"\n";
    let status = r#"[{"name":"web","status":"Running","pid":10}]"#;
    let ctx = context(manifest, None, status);
    let mut panel = ServicesPanel::default();

    panel.refresh(&ctx);

    let db = &panel.items()[0];
    let web = &panel.items()[1];
    assert_eq!(db.running, Some(false));
    assert_eq!(db.detail, None);
    assert_eq!(web.running, Some(true));
    assert_eq!(web.detail.as_deref(), Some("Running (pid 10)"));
  }

  struct OrderProbe {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
  }

  impl Panel for OrderProbe {
    fn title(&self) -> &str {
      self.name
    }

    fn items(&self) -> &[PanelItem] {
      &[]
    }

    fn refresh(&mut self, _ctx: &PanelContext) {
      self.log.borrow_mut().push(self.name);
    }
  }

  #[test]
  fn refresh_runs_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut set = PanelSet::new();
    for name in ["third", "first", "second"] {
      set.register(Box::new(OrderProbe {
        name,
        log: Rc::clone(&log),
      }));
    }

    set.refresh(&context("", None, ""));

    assert_eq!(*log.borrow(), vec!["third", "first", "second"]);
  }

  #[test]
  fn standard_set_has_three_panels() {
    let titles: Vec<_> = PanelSet::standard().panels().map(|p| p.title().to_string()).collect();
    assert_eq!(titles, vec!["Packages", "Variables", "Services"]);
  }
}
