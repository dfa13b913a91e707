//! Binary-side orchestration: settings, tracing, registry wiring and dispatch.

mod context;
mod runtime;
mod settings;
mod terminal;

pub(crate) use context::AppContext;
pub(crate) use runtime::run;
