//! Metrics every Courier process tracks

use color_eyre::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

const NAMESPACE: &str = "courier";

pub(crate) fn u16_from_env(s: impl AsRef<str>) -> Option<u16> {
    std::env::var(s.as_ref()).ok().and_then(|i| i.parse().ok())
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help)
        .namespace(NAMESPACE)
        .const_label("VERSION", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug)]
/// Metrics for a Courier process
pub struct CoreMetrics {
    process_name: String,
    jobs_seen: Box<IntCounterVec>,
    executions: Box<IntCounterVec>,
    rejections: Box<IntCounterVec>,
    dispatch_retries: Box<IntCounterVec>,
    slashes: Box<IntCounterVec>,
    span_durations: Box<HistogramVec>,
    listen_port: Option<u16>,
    /// Metrics registry for adding new metrics and gathering reports
    registry: Arc<Registry>,
}

impl CoreMetrics {
    /// Track metrics for a process
    pub fn new<S: Into<String>>(
        process_name: S,
        listen_port: Option<u16>,
        registry: Arc<Registry>,
    ) -> prometheus::Result<CoreMetrics> {
        let metrics = CoreMetrics {
            process_name: process_name.into(),
            jobs_seen: Box::new(IntCounterVec::new(
                opts("jobs_seen_total", "Jobs announced by the coordinator"),
                &["chain", "process"],
            )?),
            executions: Box::new(IntCounterVec::new(
                opts(
                    "executions_total",
                    "Job executions attempted, by outcome (completed/failed)",
                ),
                &["chain", "outcome", "process"],
            )?),
            rejections: Box::new(IntCounterVec::new(
                opts(
                    "rejections_total",
                    "Coordinator rejections of this process's calls, by error code",
                ),
                &["chain", "code", "process"],
            )?),
            dispatch_retries: Box::new(IntCounterVec::new(
                opts(
                    "dispatch_retries_total",
                    "Dispatch submissions retried after a transient failure",
                ),
                &["chain", "process"],
            )?),
            slashes: Box::new(IntCounterVec::new(
                opts("slashes_total", "Slashes triggered by this process's executions"),
                &["chain", "process"],
            )?),
            span_durations: Box::new(HistogramVec::new(
                HistogramOpts::new(
                    "span_duration_sec",
                    "Duration from span creation to span destruction",
                )
                .namespace(NAMESPACE)
                .const_label("VERSION", env!("CARGO_PKG_VERSION")),
                &["span_name", "target"],
            )?),
            registry,
            listen_port,
        };

        metrics.registry.register(metrics.jobs_seen.clone())?;
        metrics.registry.register(metrics.executions.clone())?;
        metrics.registry.register(metrics.rejections.clone())?;
        metrics.registry.register(metrics.dispatch_retries.clone())?;
        metrics.registry.register(metrics.slashes.clone())?;
        metrics.registry.register(metrics.span_durations.clone())?;

        Ok(metrics)
    }

    /// Register an int counter vec
    pub fn new_int_counter(
        &self,
        metric_name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<IntCounterVec> {
        let counter = IntCounterVec::new(opts(metric_name, help), labels)?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    /// Counter of jobs seen on `chain`
    pub fn jobs_seen(&self, chain: &str) -> IntCounter {
        self.jobs_seen
            .with_label_values(&[chain, &self.process_name])
    }

    /// Counter of executions on `chain` ending in `outcome`
    pub fn executions(&self, chain: &str, outcome: &str) -> IntCounter {
        self.executions
            .with_label_values(&[chain, outcome, &self.process_name])
    }

    /// Counter of rejections on `chain` carrying error `code`
    pub fn rejections(&self, chain: &str, code: &str) -> IntCounter {
        self.rejections
            .with_label_values(&[chain, code, &self.process_name])
    }

    /// Counter of dispatch retries on `chain`
    pub fn dispatch_retries(&self, chain: &str) -> IntCounter {
        self.dispatch_retries
            .with_label_values(&[chain, &self.process_name])
    }

    /// Counter of slashes triggered on `chain`
    pub fn slashes(&self, chain: &str) -> IntCounter {
        self.slashes.with_label_values(&[chain, &self.process_name])
    }

    /// Histogram for measuring span durations.
    ///
    /// Labels needed: `span_name`, `target`.
    pub fn span_duration(&self) -> HistogramVec {
        *self.span_durations.clone()
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format) report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    /// Port the metrics server binds. `METRICS_PORT` wins over config,
    /// 9090 otherwise
    pub fn listen_port(&self) -> u16 {
        u16_from_env("METRICS_PORT")
            .or(self.listen_port)
            .unwrap_or(9090)
    }

    /// Run an HTTP server serving OpenMetrics format reports on `/metrics`
    pub fn run_http_server(self: Arc<CoreMetrics>) -> JoinHandle<()> {
        use warp::{http::StatusCode, Filter};

        let port = self.listen_port();
        tracing::info!(port, "starting prometheus server on 0.0.0.0:{}", port);

        tokio::spawn(async move {
            warp::serve(
                warp::path!("metrics")
                    .map(move || match self.gather() {
                        Ok(report) => warp::http::Response::builder()
                            .header("Content-Type", "text/plain; charset=utf-8")
                            .status(StatusCode::OK)
                            .body(report),
                        Err(e) => {
                            tracing::error!(error = %e, "failed to encode metrics");
                            warp::http::Response::builder()
                                .status(StatusCode::INTERNAL_SERVER_ERROR)
                                .body(vec![])
                        }
                    })
                    .or(warp::any().map(|| {
                        warp::http::Response::builder()
                            .header("Location", "/metrics")
                            .status(301)
                            .body("".to_string())
                    })),
            )
            .run(([0, 0, 0, 0], port))
            .await;
        })
    }
}

#[cfg(test)]
mod test {
    use serial_test::serial;

    use super::*;

    #[test]
    fn it_reports_labelled_counters() {
        let metrics = CoreMetrics::new("operator", None, Arc::new(Registry::new())).unwrap();
        metrics.executions("goerli", "completed").inc();
        metrics.rejections("goerli", "operator has time").inc_by(2);

        let report = String::from_utf8(metrics.gather().unwrap()).unwrap();
        assert!(report.contains("courier_executions_total"));
        assert!(report.contains(r#"code="operator has time""#));
    }

    #[test]
    #[serial]
    fn env_port_wins_over_config() {
        let metrics = CoreMetrics::new("operator", Some(9100), Arc::new(Registry::new())).unwrap();
        std::env::remove_var("METRICS_PORT");
        assert_eq!(metrics.listen_port(), 9100);
        std::env::set_var("METRICS_PORT", "9200");
        assert_eq!(metrics.listen_port(), 9200);
        std::env::remove_var("METRICS_PORT");
    }
}
