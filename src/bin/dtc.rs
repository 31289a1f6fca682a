//! The `dtc` binary: loads a cluster, starts the intake service, and serves
//! until signalled to stop.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dtc::cluster::Cluster;
use dtc::coordinator::{
    Coordinator,
    RetryPolicy,
};
use dtc::reporting::TracingReportingSink;
use dtc::server;

#[derive(Parser, Debug)]
#[command(name = "dtc", about = "Saga-style distributed transaction coordinator")]
struct Args {
    /// Path to the INI file describing the replica cluster.
    #[arg(long, env = "DTC_CLUSTER_FILE")]
    cluster_file: PathBuf,

    /// Address the intake service binds to.
    #[arg(long, env = "DTC_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// `tracing-subscriber` env-filter directive, e.g. `info` or `dtc=debug`.
    #[arg(long, env = "DTC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let cluster = Cluster::from_ini_file(&args.cluster_file)?;
    tracing::info!(replicas = cluster.len(), file = %args.cluster_file.display(), "cluster loaded");

    let coordinator = Arc::new(Coordinator::new(
        cluster,
        RetryPolicy::default(),
        Arc::new(TracingReportingSink),
    ));

    server::serve(args.bind, coordinator).await?;

    Ok(())
}
