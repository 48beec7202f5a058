use shared::metrics_defs::{MetricDef, MetricType};

pub const LOGS_ACCEPTED: MetricDef = MetricDef {
    name: "logs.accepted",
    metric_type: MetricType::Counter,
    description: "Logs handed to the producer",
};

pub const LOGS_REJECTED: MetricDef = MetricDef {
    name: "logs.rejected",
    metric_type: MetricType::Counter,
    description: "Requests that failed before or during publishing. Tagged with kind.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status.",
};

pub const ENVELOPE_SIZE: MetricDef = MetricDef {
    name: "envelope.size",
    metric_type: MetricType::Histogram,
    description: "Serialized envelope size in bytes",
};

pub const ALL_METRICS: &[MetricDef] = &[
    LOGS_ACCEPTED,
    LOGS_REJECTED,
    REQUEST_DURATION,
    ENVELOPE_SIZE,
];
