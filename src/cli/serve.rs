//! `scorecard serve` - run the HTTP scoring service

use std::sync::Arc;

use anyhow::{Context, Result};

use super::ServeArgs;
use crate::scoring::ScoringContext;
use crate::server;

pub fn run_serve(args: &ServeArgs) -> Result<()> {
    // Artifacts are validated before anything binds
    let ctx = ScoringContext::load(&args.bins, &args.model, args.out_of_range)
        .context("Failed to load scoring artifacts")?;

    tracing::info!(
        bins = %args.bins.display(),
        model = %args.model.display(),
        policy = %args.out_of_range,
        "scoring context ready"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(server::serve(Arc::new(ctx), args.addr, &args.cors_origins))
}
