mod init;
mod spans;
mod trace_id;

pub use init::{LogFormat, init_tracing};
pub use spans::{observer_span, run_timed, tick_span};
pub use trace_id::TraceId;
