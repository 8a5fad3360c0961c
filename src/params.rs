use anyhow::Result;
use chrono::NaiveDateTime;

use crate::aggregate::AggregateOptions;
use crate::cli::EffectiveConfig;
use crate::filters::SlotFilter;
use crate::model::NonWorking;
use crate::parse::ParseOptions;
use crate::render::RenderOptions;
use crate::validate::{ValidateOptions, hours};
use crate::window::resolve_window;

/// Everything a run needs, derived once from the effective config.
#[derive(Debug, Clone)]
pub struct ReportParams {
  pub parse: ParseOptions,
  pub validate: ValidateOptions,
  pub filter: SlotFilter,
  pub aggregate: AggregateOptions,
  pub render: RenderOptions,
}

pub fn build_report_params(cfg: &EffectiveConfig, now: NaiveDateTime) -> Result<ReportParams> {
  let non_working = NonWorking::new(&cfg.non_working);
  let window = resolve_window(&cfg.window, now)?;

  Ok(ReportParams {
    parse: ParseOptions {
      strictness: cfg.strictness,
      allow_midnight_wrap: cfg.wrap_midnight,
      blank_as_misc: cfg.blank_as_misc,
      now: Some(now.time()),
    },
    validate: ValidateOptions {
      strictness: cfg.strictness,
      non_working: non_working.clone(),
      day_hours: cfg.day_hours,
      min_day: hours(cfg.min_day_hours),
      max_day: hours(cfg.max_day_hours),
    },
    filter: SlotFilter {
      window,
      task: cfg.task.clone(),
    },
    aggregate: AggregateOptions {
      max_depth: cfg.max_depth,
      non_working,
      show_non_working: cfg.show_non_working,
    },
    render: RenderOptions {
      day_hours: cfg.day_hours,
      units: cfg.units,
      collapse: cfg.collapse,
      notes: cfg.notes,
    },
  })
}
