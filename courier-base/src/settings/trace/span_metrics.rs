use prometheus::HistogramVec;
use std::time::Instant;
use tracing::{span, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

struct Opened(Instant);

/// Records how long each span lived, labelled by span name and target
#[derive(Debug)]
pub struct SpanDurations {
    histogram: HistogramVec,
}

impl SpanDurations {
    /// Record into `histogram`, which must be labelled `span_name, target`
    pub fn new(histogram: HistogramVec) -> Self {
        Self { histogram }
    }
}

impl<S> Layer<S> for SpanDurations
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(Opened(Instant::now()));
        }
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, S>) {
        let span = match ctx.span(&id) {
            Some(span) => span,
            None => return,
        };
        let opened = match span.extensions().get::<Opened>() {
            Some(Opened(at)) => *at,
            None => return,
        };
        self.histogram
            .with_label_values(&[span.name(), span.metadata().target()])
            .observe(opened.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod test {
    use prometheus::HistogramOpts;
    use tracing_subscriber::{prelude::*, Registry};

    use super::*;

    #[test]
    fn closed_spans_are_observed() {
        let histogram = HistogramVec::new(
            HistogramOpts::new("span_duration_seconds", "span durations"),
            &["span_name", "target"],
        )
        .unwrap();
        let subscriber = Registry::default().with(SpanDurations::new(histogram.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("dispatch");
            let _guard = span.enter();
        });

        let observed = histogram
            .with_label_values(&["dispatch", module_path!()])
            .get_sample_count();
        assert_eq!(observed, 1);
    }
}
