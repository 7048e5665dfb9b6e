//! Metrics definitions for the pp API.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Number of handled requests. Tagged with endpoint, status.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with endpoint.",
};

pub const PP_CACHE_HIT: MetricDef = MetricDef {
    name: "pp_cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of no-mod requests served from cached pp values",
};

pub const PP_CACHE_MISS: MetricDef = MetricDef {
    name: "pp_cache.miss",
    metric_type: MetricType::Counter,
    description: "Number of no-mod requests that had to calculate pp",
};

pub const CALCULATION_DURATION: MetricDef = MetricDef {
    name: "calculation.duration",
    metric_type: MetricType::Histogram,
    description: "Time to calculate pp for a beatmap in seconds, file download included",
};

pub const CALCULATION_TIMEOUTS: MetricDef = MetricDef {
    name: "calculation.timeouts",
    metric_type: MetricType::Counter,
    description: "Number of pp calculations abandoned after the calculation timeout",
};

pub const CALCULATIONS_RUNNING: MetricDef = MetricDef {
    name: "calculation.running",
    metric_type: MetricType::Gauge,
    description: "pp calculations currently running on the blocking pool, abandoned ones included",
};

pub const UPSTREAM_LOOKUP_FAILURES: MetricDef = MetricDef {
    name: "upstream.lookup.failures",
    metric_type: MetricType::Counter,
    description: "Number of failed beatmap lookups reported as unknown beatmaps",
};

pub const MAPS_PROXY_FAILURES: MetricDef = MetricDef {
    name: "maps.failures",
    metric_type: MetricType::Counter,
    description: "Number of .osu file downloads that could not be proxied",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS,
    REQUEST_DURATION,
    PP_CACHE_HIT,
    PP_CACHE_MISS,
    CALCULATION_DURATION,
    CALCULATION_TIMEOUTS,
    CALCULATIONS_RUNNING,
    UPSTREAM_LOOKUP_FAILURES,
    MAPS_PROXY_FAILURES,
];
