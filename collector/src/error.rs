use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("unable to launch target: {0}")]
    Launch(tracer::TracerError),

    #[error("unable to read debug information: {0}")]
    DebugInfo(#[from] linetable::LineTableError),

    #[error("unable to install breakpoints: {0}")]
    BreakpointSetup(tracer::TracerError),

    #[error("tracing failed: {0}")]
    Tracing(tracer::TracerError),

    #[error("unable to write dump: {0}")]
    DumpIo(#[from] dump::DumpError),
}
