//! Prometheus text exposition of the task gauge family.
//!
//! The family is rebuilt from scratch on every scrape as a constant metric
//! family, so nothing observed in one scrape can leak into the next.

use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use crate::config::{defaults, MetricConfig};
use crate::types::MetricSample;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Name, help and label names of the emitted gauge family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeFamily {
    pub name: String,
    pub help: String,
    pub status_label: String,
}

impl GaugeFamily {
    pub fn from_config(config: &MetricConfig) -> Self {
        Self {
            name: config.name.clone(),
            help: config.help.clone(),
            status_label: config.status_column.clone(),
        }
    }

    /// Build the protobuf family. Samples are sorted by `(type, status)`;
    /// the sort is stable so duplicates keep their relative order.
    pub fn to_metric_family(&self, samples: &[MetricSample]) -> MetricFamily {
        let mut sorted: Vec<&MetricSample> = samples.iter().collect();
        sorted.sort_by(|a, b| a.key().cmp(&b.key()));

        let mut family = MetricFamily::default();
        family.set_name(self.name.clone());
        family.set_help(self.help.clone());
        family.set_field_type(MetricType::GAUGE);

        for sample in sorted {
            let mut gauge = Gauge::default();
            gauge.set_value(sample.value());

            let mut metric = Metric::default();
            metric.mut_label().push(label(defaults::TYPE_LABEL, &sample.task_type));
            metric.mut_label().push(label(&self.status_label, &sample.status));
            metric.set_gauge(gauge);

            family.mut_metric().push(metric);
        }

        family
    }

    /// Render samples in the text exposition format.
    ///
    /// An empty sample set renders as an empty document: the encoder refuses
    /// families without metrics.
    pub fn encode(&self, samples: &[MetricSample]) -> Result<String, prometheus::Error> {
        if samples.is_empty() {
            return Ok(String::new());
        }

        let family = self.to_metric_family(samples);
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&[family], &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn label(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_string());
    pair.set_value(value.to_string());
    pair
}
