use courier_configuration::agent::LogStyle;
use std::io::Stdout;
use tracing::{span, Event, Metadata, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{Compact, DefaultFields, Format, Full, Json, JsonFields, Pretty},
    },
    layer::Context,
    registry::LookupSpan,
    Layer,
};

/// One fmt layer per [`LogStyle`], unified under a single type so the
/// subscriber type does not depend on runtime configuration
#[derive(Debug)]
pub enum LogOutputLayer<S, N = DefaultFields, W = fn() -> Stdout> {
    /// Full log output (default mode)
    Full(fmt::Layer<S, N, Format<Full>, W>),
    /// Pretty log output
    Pretty(fmt::Layer<S, Pretty, Format<Pretty>, W>),
    /// Compact log output
    Compact(fmt::Layer<S, N, Format<Compact>, W>),
    /// Json log output
    Json(fmt::Layer<S, JsonFields, Format<Json>, W>),
}

impl<S> Default for LogOutputLayer<S> {
    fn default() -> Self {
        Self::Full(Default::default())
    }
}

impl<S> From<LogStyle> for LogOutputLayer<S> {
    fn from(style: LogStyle) -> Self {
        match style {
            LogStyle::Full => Self::Full(fmt::layer()),
            LogStyle::Pretty => Self::Pretty(fmt::layer().pretty()),
            LogStyle::Compact => Self::Compact(fmt::layer().compact()),
            LogStyle::Json => Self::Json(fmt::layer().json()),
        }
    }
}

macro_rules! each_layer {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            LogOutputLayer::Full($inner) => $call,
            LogOutputLayer::Pretty($inner) => $call,
            LogOutputLayer::Compact($inner) => $call,
            LogOutputLayer::Json($inner) => $call,
        }
    };
}

impl<S> Layer<S> for LogOutputLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn register_callsite(
        &self,
        metadata: &'static Metadata<'static>,
    ) -> tracing::subscriber::Interest {
        each_layer!(self, inner => inner.register_callsite(metadata))
    }

    fn enabled(&self, metadata: &Metadata<'_>, ctx: Context<'_, S>) -> bool {
        each_layer!(self, inner => inner.enabled(metadata, ctx))
    }

    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_new_span(attrs, id, ctx))
    }

    fn on_record(&self, span: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_record(span, values, ctx))
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_event(event, ctx))
    }

    fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_enter(id, ctx))
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_exit(id, ctx))
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, S>) {
        each_layer!(self, inner => inner.on_close(id, ctx))
    }
}

#[cfg(test)]
mod test {
    use tracing_subscriber::{prelude::*, Registry};

    use super::*;

    #[test]
    fn every_style_builds_a_subscriber() {
        for style in [
            LogStyle::Full,
            LogStyle::Pretty,
            LogStyle::Compact,
            LogStyle::Json,
        ] {
            let layer: LogOutputLayer<_> = style.into();
            let subscriber = Registry::default().with(layer);
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(?style, "hello");
            });
        }
    }
}
